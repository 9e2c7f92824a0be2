use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::LambdaDecl;
use crate::interpreter::{Interpreter, Unwind};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// Host-provided callable signature.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &[Value]) -> Result<Value, LoxError>>;

/// A callable injected by the host (e.g. `clock`, test assertions).
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: NativeFn,
}

impl NativeFunction {
    pub fn new<S: Into<String>>(name: S, arity: usize, func: NativeFn) -> Self {
        NativeFunction {
            name: name.into(),
            arity,
            func,
        }
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// A user-declared function, method, property, or static class method.
///
/// The closure is the lexical environment at the point of definition.
/// For a bound method the chain is: definition environment → a synthetic
/// frame holding `this` (layered by [`LoxFunction::bind`]) → the
/// per-call parameter frame.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy of this function whose closure has an extra frame
    /// binding `this`. Used for instance methods, properties, and
    /// static class methods (where `this` is the class object).
    pub fn bind(&self, this_value: Value) -> LoxFunction {
        let mut environment: Environment = Environment::with_enclosing(self.closure.clone());

        environment.define("this", this_value);

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, Unwind> {
        let mut environment: Environment = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(environment));

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(Value::Nil)
                }
            }

            // An initializer yields the instance even on an explicit
            // bare `return;` (value-carrying returns are rejected
            // statically).
            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(value)
                }
            }

            Err(other) => Err(other),
        }
    }

    fn bound_this(&self) -> Result<Value, Unwind> {
        Environment::get_at(&self.closure, 0, "this").ok_or_else(|| {
            Unwind::from(LoxError::runtime(
                self.declaration.name.line,
                "Initializer has no bound 'this'.",
            ))
        })
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The closure is deliberately omitted: environments and
        // functions reference each other cyclically.
        f.debug_struct("LoxFunction")
            .field("name", &self.declaration.name.lexeme)
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

impl fmt::Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

/// An anonymous function value.
pub struct LoxLambda {
    declaration: Rc<LambdaDecl>,
    closure: Rc<RefCell<Environment>>,
}

impl LoxLambda {
    pub fn new(declaration: Rc<LambdaDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        LoxLambda {
            declaration,
            closure,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, Unwind> {
        let mut environment: Environment = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let environment: Rc<RefCell<Environment>> = Rc::new(RefCell::new(environment));

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => Ok(Value::Nil),

            Err(Unwind::Return(value)) => Ok(value),

            Err(other) => Err(other),
        }
    }
}

impl fmt::Debug for LoxLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxLambda")
            .field("arity", &self.arity())
            .finish()
    }
}

impl fmt::Display for LoxLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<lambda>")
    }
}
