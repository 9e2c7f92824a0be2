use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::class::LoxClass;
use crate::environment::Environment;
use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::function::{LoxFunction, LoxLambda, NativeFn, NativeFunction};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{Callable, Value};

/// Where `print` (and the REPL echo) writes. Shared so a session can
/// keep the sink across `reset()` and tests can read captured output
/// back.
pub type OutputSink = Rc<RefCell<dyn Write>>;

/// Non-local exits threaded through `Result`: `return` carries a value,
/// `break` is bare, and runtime errors carry a diagnostic. Calls
/// intercept `Return`, `while` intercepts `Break`, and `interpret`
/// intercepts `Error`; none of the three ever escapes to the host.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Break,
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(error: LoxError) -> Self {
        Unwind::Error(error)
    }
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    /// Resolver-recorded lexical depths, keyed by expression id.
    locals: HashMap<ExprId, usize>,
    repl: bool,
    output: OutputSink,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    pub fn with_output(output: OutputSink) -> Self {
        let globals: Rc<RefCell<Environment>> = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter: Interpreter = Interpreter {
            globals: globals.clone(),
            environment: globals,
            locals: HashMap::new(),
            repl: false,
            output,
        };

        interpreter.define_native("clock", 0, Rc::new(clock_native));

        interpreter
    }

    /// Register a host value (usually a native callable) in the global
    /// environment. Must happen before execution begins.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        let native: NativeFunction = NativeFunction::new(name, arity, func);

        self.define_global(name, Value::Callable(Callable::Native(Rc::new(native))));
    }

    /// Toggle echoing of expression-statement values (REPL behavior).
    pub fn set_repl(&mut self, repl: bool) {
        self.repl = repl;
    }

    pub fn output(&self) -> OutputSink {
        self.output.clone()
    }

    /// Resolver callback: note that the expression with this id binds at
    /// `depth` environment hops from the use site.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}

                Err(Unwind::Error(error)) => return Err(error),

                // Rejected statically; swallowed here so an unwind
                // signal can never reach the host.
                Err(Unwind::Return(_)) | Err(Unwind::Break) => return Ok(()),
            }
        }

        Ok(())
    }

    /// Run `statements` inside `environment`, restoring the previous
    /// environment on **every** exit path (normal completion, unwind,
    /// runtime error). Closure correctness depends on this.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), Unwind> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let mut result: Result<(), Unwind> = Ok(());

        for statement in statements {
            result = self.execute(statement);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                let value: Value = self.evaluate(expr)?;

                if self.repl {
                    self.write_line(&value)?;
                }

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                self.write_line(&value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment: Environment =
                    Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(environment)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition: Value = self.evaluate(condition)?;

                if is_truthy(&condition) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                loop {
                    let condition: Value = self.evaluate(condition)?;

                    if !is_truthy(&condition) {
                        break;
                    }

                    match self.execute(body) {
                        Ok(()) => {}

                        // `break` unwinds exactly one enclosing `while`
                        Err(Unwind::Break) => break,

                        Err(other) => return Err(other),
                    }
                }

                Ok(())
            }

            Stmt::Break { .. } => Err(Unwind::Break),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Function(declaration) => {
                let function: LoxFunction =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );

                Ok(())
            }

            Stmt::Class {
                name,
                superclass,
                properties,
                methods,
                class_methods,
            } => self.execute_class(name, superclass.as_ref(), properties, methods, class_methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        properties: &[Rc<FunctionDecl>],
        methods: &[Rc<FunctionDecl>],
        class_methods: &[Rc<FunctionDecl>],
    ) -> Result<(), Unwind> {
        // Placeholder so the name is visible while the body is built;
        // the real class object is assigned over it below.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => {
                let value: Value = self.evaluate(expr)?;

                match value {
                    Value::Callable(Callable::Class(class)) => Some(class),

                    _ => {
                        let line: usize = match expr {
                            Expr::Variable { name, .. } => name.line,
                            _ => name.line,
                        };

                        return Err(LoxError::runtime(line, "Superclass must be a class.").into());
                    }
                }
            }

            None => None,
        };

        let previous: Rc<RefCell<Environment>> = self.environment.clone();

        // Methods of a subclass close over an extra frame binding
        // `super`, one environment above their `this` frame.
        if let Some(ref superclass) = superclass_value {
            let mut super_env: Environment = Environment::with_enclosing(previous.clone());

            super_env.define("super", Value::Callable(Callable::Class(superclass.clone())));

            self.environment = Rc::new(RefCell::new(super_env));
        }

        let mut property_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();
        for property in properties {
            let function: LoxFunction =
                LoxFunction::new(property.clone(), self.environment.clone(), false);

            property_map.insert(property.name.lexeme.clone(), Rc::new(function));
        }

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();
        for method in methods {
            let is_initializer: bool =
                method.name.lexeme == "init" || method.name.lexeme == name.lexeme;

            let function: LoxFunction =
                LoxFunction::new(method.clone(), self.environment.clone(), is_initializer);

            method_map.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let mut class_method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();
        for class_method in class_methods {
            let function: LoxFunction =
                LoxFunction::new(class_method.clone(), self.environment.clone(), false);

            class_method_map.insert(class_method.name.lexeme.clone(), Rc::new(function));
        }

        let class: LoxClass = LoxClass::new(
            name.lexeme.clone(),
            superclass_value,
            property_map,
            method_map,
            class_method_map,
        );

        self.environment = previous;

        self.environment.borrow_mut().assign(
            &name.lexeme,
            Value::Callable(Callable::Class(Rc::new(class))),
            name.line,
        )?;

        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        match expr {
            Expr::Literal(token) => self.evaluate_literal(token),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                // short-circuit: yield the value that decided the result
                match operator.token_type {
                    TokenType::OR => {
                        if is_truthy(&left) {
                            Ok(left)
                        } else {
                            self.evaluate(right)
                        }
                    }

                    _ => {
                        if !is_truthy(&left) {
                            Ok(left)
                        } else {
                            self.evaluate(right)
                        }
                    }
                }
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition: Value = self.evaluate(condition)?;

                if is_truthy(&condition) {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        ) {
                            return Err(LoxError::runtime(
                                name.line,
                                format!("Undefined variable '{}'.", name.lexeme),
                            )
                            .into());
                        }
                    }

                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(&name.lexeme, value.clone(), name.line)?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut evaluated: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    evaluated.push(self.evaluate(argument)?);
                }

                let callable: Callable = match callee {
                    Value::Callable(callable) => callable,

                    _ => {
                        return Err(LoxError::runtime(
                            paren.line,
                            "Can only call functions and classes.",
                        )
                        .into())
                    }
                };

                if evaluated.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            evaluated.len()
                        ),
                    )
                    .into());
                }

                callable.call(self, evaluated)
            }

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(ref instance) => {
                        // fields shadow methods, methods shadow properties
                        if let Some(value) = instance.field(&name.lexeme) {
                            return Ok(value);
                        }

                        if let Some(method) = instance.class().find_method(&name.lexeme) {
                            return Ok(Value::Callable(Callable::Function(Rc::new(
                                method.bind(object.clone()),
                            ))));
                        }

                        if let Some(property) = instance.class().find_property(&name.lexeme) {
                            // a getter runs immediately; the read yields
                            // its result
                            return property.bind(object.clone()).call(self, Vec::new());
                        }

                        Err(LoxError::runtime(
                            name.line,
                            format!("Undefined property '{}'.", name.lexeme),
                        )
                        .into())
                    }

                    Value::Callable(Callable::Class(ref class)) => {
                        // static class methods bind `this` to the class
                        // object itself
                        if let Some(class_method) = class.find_class_method(&name.lexeme) {
                            return Ok(Value::Callable(Callable::Function(Rc::new(
                                class_method.bind(object.clone()),
                            ))));
                        }

                        Err(LoxError::runtime(
                            name.line,
                            format!(
                                "Undefined class method '{}' on class '{}'.",
                                name.lexeme, class.name
                            ),
                        )
                        .into())
                    }

                    _ => Err(LoxError::runtime(
                        name.line,
                        "Only classes and class instances have properties.",
                    )
                    .into()),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => {
                        let value: Value = self.evaluate(value)?;

                        instance.set_field(&name.lexeme, value.clone());

                        Ok(value)
                    }

                    _ => Err(LoxError::runtime(name.line, "Only instances have fields.").into()),
                }
            }

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),

            Expr::Lambda(declaration) => Ok(Value::Callable(Callable::Lambda(Rc::new(
                LoxLambda::new(declaration.clone(), self.environment.clone()),
            )))),
        }
    }

    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token,
        method: &Token,
    ) -> Result<Value, Unwind> {
        let distance: usize = match self.locals.get(&id) {
            Some(&distance) => distance,

            None => {
                return Err(LoxError::runtime(
                    keyword.line,
                    "Cannot use 'super' outside of a class.",
                )
                .into())
            }
        };

        // `super` lives one frame above the `this` binding
        let superclass: Value = Environment::get_at(&self.environment, distance, "super")
            .ok_or_else(|| {
                LoxError::runtime(keyword.line, "Cannot use 'super' outside of a class.")
            })?;

        let this_distance: usize = distance.checked_sub(1).ok_or_else(|| {
            LoxError::runtime(keyword.line, "Cannot use 'this' outside of a class.")
        })?;

        let object: Value = Environment::get_at(&self.environment, this_distance, "this")
            .ok_or_else(|| {
                LoxError::runtime(keyword.line, "Cannot use 'this' outside of a class.")
            })?;

        let superclass: Rc<LoxClass> = match superclass {
            Value::Callable(Callable::Class(class)) => class,

            _ => return Err(LoxError::runtime(keyword.line, "Superclass must be a class.").into()),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Callable(Callable::Function(Rc::new(
                found.bind(object),
            )))),

            None => Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )
            .into()),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value, Unwind> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(LoxError::runtime(token.line, "Invalid literal.").into()),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value, Unwind> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&value))),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value, Unwind> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                // a string left operand concatenates with the
                // stringified right operand
                (Value::String(a), right) => Ok(Value::String(format!("{}{}", a, right))),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
            },

            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(LoxError::runtime(operator.line, "Division by zero.").into())
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left, &right))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left, &right))),

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
            },

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(operator.line, "Operands must be numbers.").into()),
            },

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.").into()),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value, Unwind> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| {
                    LoxError::runtime(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    )
                    .into()
                }),

            None => self
                .globals
                .borrow()
                .get(&name.lexeme, name.line)
                .map_err(Unwind::from),
        }
    }

    fn write_line(&mut self, value: &Value) -> Result<(), Unwind> {
        writeln!(self.output.borrow_mut(), "{}", value)
            .map_err(|e| Unwind::from(LoxError::from(e)))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

pub fn is_equal(left: &Value, right: &Value) -> bool {
    left == right
}

fn clock_native(_interpreter: &mut Interpreter, _args: &[Value]) -> Result<Value, LoxError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("clock error: {}", e)))?;

    Ok(Value::Number(elapsed.as_millis() as f64))
}
