use std::fmt;
use std::rc::Rc;

use crate::class::{LoxClass, LoxInstance};
use crate::function::{LoxFunction, LoxLambda, NativeFunction};
use crate::interpreter::{Interpreter, Unwind};

/// A Lox runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable),
    Instance(Rc<LoxInstance>),
}

/// Everything that can sit to the left of a call's parentheses.
#[derive(Clone)]
pub enum Callable {
    Function(Rc<LoxFunction>),
    Lambda(Rc<LoxLambda>),
    Class(Rc<LoxClass>),
    Native(Rc<NativeFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Function(function) => function.arity(),

            Callable::Lambda(lambda) => lambda.arity(),

            Callable::Class(class) => class.arity(),

            Callable::Native(native) => native.arity,
        }
    }

    /// Invoke the callable. Arity has already been checked by the call
    /// site.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, Unwind> {
        match self {
            Callable::Function(function) => function.call(interpreter, arguments),

            Callable::Lambda(lambda) => lambda.call(interpreter, arguments),

            Callable::Class(class) => {
                let instance: Rc<LoxInstance> = Rc::new(LoxInstance::new(class.clone()));

                // Run the initializer, if the class (or an ancestor)
                // declares one. Its return value is discarded; the
                // construction expression always yields the instance.
                if let Some(initializer) = class.initializer() {
                    initializer
                        .bind(Value::Instance(instance.clone()))
                        .call(interpreter, arguments)?;
                }

                Ok(Value::Instance(instance))
            }

            Callable::Native(native) => {
                (native.func)(interpreter, &arguments).map_err(Unwind::from)
            }
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: closures and classes form reference
        // cycles through their environments.
        match self {
            Callable::Function(function) => write!(f, "Function({})", function.name()),

            Callable::Lambda(_) => write!(f, "Lambda"),

            Callable::Class(class) => write!(f, "Class({})", class.name),

            Callable::Native(native) => write!(f, "Native({})", native.name),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),

            (Callable::Lambda(a), Callable::Lambda(b)) => Rc::ptr_eq(a, b),

            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),

            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,

            (Value::Bool(a), Value::Bool(b)) => a == b,

            (Value::Number(a), Value::Number(b)) => a == b,

            (Value::String(a), Value::String(b)) => a == b,

            (Value::Callable(a), Value::Callable(b)) => a == b,

            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(Callable::Function(function)) => write!(f, "{}", function),

            Value::Callable(Callable::Lambda(lambda)) => write!(f, "{}", lambda),

            Value::Callable(Callable::Class(class)) => write!(f, "{}", class),

            Value::Callable(Callable::Native(native)) => write!(f, "{}", native),

            Value::Instance(instance) => write!(f, "{}", instance),
        }
    }
}
