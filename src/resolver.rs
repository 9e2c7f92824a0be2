//! Static resolution pass.
//!
//! A single AST walk that:
//! 1. **Builds lexical scopes**: maintains a stack of
//!    `HashMap<String, VariableInfo>` tracking the lifecycle of every
//!    name declared in a nested block, function, lambda, or class body.
//! 2. **Enforces static rules**: redeclaration in the same scope,
//!    reading a variable in its own initializer, reading a
//!    never-assigned local, invalid `return` / `break`, and illegal
//!    `this` / `super` placement.
//! 3. **Records binding distances**: for every `Variable`, `Assign`,
//!    `This`, and `Super` occurrence, calls back into the interpreter to
//!    note the lexical depth at which the name binds. Unresolved names
//!    are globals and stay unannotated, so the runtime performs O(depth)
//!    lookups by climbing exactly the right number of environment
//!    frames.
//!
//! Diagnostics never abort the walk. They land on two channels: hard
//! errors (which make the session skip interpretation) and end-of-scope
//! lifecycle warnings ("defined but never assigned to", "assigned to
//! but never accessed"), which are reported but let the program run.
//!
//! # Usage
//!
//! After parsing, before interpretation:
//! ```ignore
//! let mut resolver = Resolver::new(&mut interpreter);
//! resolver.resolve(&statements);
//! let (errors, warnings) = resolver.into_diagnostics();
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::error::LoxError;
use crate::expr::{Expr, ExprId, LambdaDecl};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};

/// What kind of function body is being resolved. Used to validate
/// `return`, and to forbid `this` in static class methods.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Lambda,
    Method,
    Initializer,
    ClassMethod,
    Property,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    /// Not inside any class
    None,

    /// Inside a class declaration _without_ a superclass
    Class,

    /// Inside a class declaration _with_ a superclass
    Subclass,
}

/// Lifecycle of a local binding: `Declared → {Defined|Assigned} →
/// Accessed`. `Ignore` marks compiler-synthesized names (`this`,
/// `super`) that must never produce lifecycle warnings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum VariableState {
    Declared,
    Defined,
    Assigned,
    Accessed,
    Ignore,
}

#[derive(Debug)]
struct VariableInfo {
    token: Token,
    state: VariableState,
}

impl VariableInfo {
    fn new(token: Token, state: VariableState) -> Self {
        VariableInfo { token, state }
    }

    fn synthetic(token_type: TokenType, lexeme: &str) -> Self {
        VariableInfo {
            token: Token::new(token_type, lexeme.to_string(), 0),
            state: VariableState::Ignore,
        }
    }
}

/// Resolver: tracks scopes, enforces static rules, and *records*
/// binding distances (locals vs. globals) by calling back into the
/// interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, VariableInfo>>,
    current_function: FunctionType,
    current_class: ClassType,
    in_while: bool,
    errors: Vec<LoxError>,
    warnings: Vec<LoxError>,
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            in_while: false,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Walk all top-level statements.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[LoxError] {
        &self.warnings
    }

    /// Consume the resolver, yielding `(errors, warnings)`.
    pub fn into_diagnostics(self) -> (Vec<LoxError>, Vec<LoxError>) {
        (self.errors, self.warnings)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);

        match stmt {
            Stmt::Class {
                name,
                superclass,
                properties,
                methods,
                class_methods,
            } => {
                self.resolve_class(name, superclass.as_ref(), properties, methods, class_methods);
            }

            Stmt::Block(statements) => {
                self.begin_scope();

                for statement in statements {
                    self.resolve_stmt(statement);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                self.declare(name);

                match initializer {
                    Some(initializer) => {
                        self.resolve_expr(initializer);
                        self.define(name, true);
                    }

                    None => self.define(name, false),
                }
            }

            Stmt::Function(function) => {
                // The name is assigned immediately so the body may recurse.
                self.declare(&function.name);
                self.define(&function.name, true);

                self.resolve_function(function, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::While { condition, body } => {
                let enclosing_while: bool = self.in_while;
                self.in_while = true;

                self.resolve_expr(condition);
                self.resolve_stmt(body);

                self.in_while = enclosing_while;
            }

            Stmt::Break { keyword } => {
                if !self.in_while {
                    self.errors.push(LoxError::resolve(
                        keyword.line,
                        "Cannot break outside of a loop.",
                    ));
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.errors.push(LoxError::resolve(
                        keyword.line,
                        "Cannot return from top-level code.",
                    ));
                }

                if let Some(value) = value {
                    // an initializer only permits the bare `return;`
                    if self.current_function == FunctionType::Initializer {
                        self.errors.push(LoxError::resolve(
                            keyword.line,
                            "Cannot return a value from an initializer.",
                        ));
                    }

                    self.resolve_expr(value);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        properties: &[Rc<FunctionDecl>],
        methods: &[Rc<FunctionDecl>],
        class_methods: &[Rc<FunctionDecl>],
    ) {
        let enclosing_class: ClassType = self.current_class;

        self.current_class = if superclass.is_some() {
            ClassType::Subclass
        } else {
            ClassType::Class
        };

        self.declare(name);

        // Resolving the superclass between the class's declaration and
        // definition makes `class Foo < Foo` fail the self-reference
        // check inside any local scope.
        if let Some(superclass) = superclass {
            self.resolve_expr(superclass);
        }

        self.define(name, true);

        // Scope holding the superclass binding, when there is one.
        if superclass.is_some() {
            self.begin_scope();
            self.scopes
                .last_mut()
                .expect("scope just pushed")
                .insert(
                    "super".to_string(),
                    VariableInfo::synthetic(TokenType::SUPER, "super"),
                );
        }

        // Scope holding `this` for the members.
        self.begin_scope();
        self.scopes
            .last_mut()
            .expect("scope just pushed")
            .insert(
                "this".to_string(),
                VariableInfo::synthetic(TokenType::THIS, "this"),
            );

        for property in properties {
            self.resolve_function(property, FunctionType::Property);
        }

        for method in methods {
            // `init`, or a method bearing the class's own name, is the
            // constructor body
            let kind: FunctionType =
                if method.name.lexeme == "init" || method.name.lexeme == name.lexeme {
                    FunctionType::Initializer
                } else {
                    FunctionType::Method
                };

            self.resolve_function(method, kind);
        }

        for class_method in class_methods {
            self.resolve_function(class_method, FunctionType::ClassMethod);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        debug!("Resolving expr: {:?}", expr);

        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }

            Expr::Variable { id, name } => {
                // A read of a binding the innermost scope knows about but
                // has not finished (or never performed) an assignment to.
                if let Some(scope) = self.scopes.last() {
                    if let Some(info) = scope.get(&name.lexeme) {
                        match info.state {
                            VariableState::Declared => {
                                self.errors.push(LoxError::resolve(
                                    name.line,
                                    "Cannot read local variable in its own initializer.",
                                ));
                            }

                            VariableState::Defined => {
                                self.errors.push(LoxError::resolve(
                                    name.line,
                                    "Cannot read from unassigned local variable.",
                                ));
                            }

                            _ => {}
                        }
                    }
                }

                self.resolve_local(*id, name, true);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name, false);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => {
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.errors.push(LoxError::resolve(
                        keyword.line,
                        "Cannot use 'this' outside of a class.",
                    ));
                    return;
                }

                if self.current_function == FunctionType::ClassMethod {
                    self.errors.push(LoxError::resolve(
                        keyword.line,
                        "Cannot use 'this' in a static class method.",
                    ));
                    return;
                }

                self.resolve_local(*id, keyword, true);
            }

            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.errors.push(LoxError::resolve(
                        keyword.line,
                        "Cannot use 'super' outside of a class.",
                    ));
                } else if self.current_class != ClassType::Subclass {
                    self.errors.push(LoxError::resolve(
                        keyword.line,
                        "Cannot use 'super' in a class with no superclass.",
                    ));
                }

                self.resolve_local(*id, keyword, true);
            }

            Expr::Lambda(lambda) => {
                self.resolve_lambda(lambda);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, function: &FunctionDecl, kind: FunctionType) {
        let enclosing_function: FunctionType = self.current_function;
        self.current_function = kind;

        // a `break` must bind to a `while` in the *same* function
        let enclosing_while: bool = self.in_while;
        self.in_while = false;

        self.begin_scope();

        for param in &function.params {
            self.declare(param);
            self.define(param, true);
        }

        for statement in &function.body {
            self.resolve_stmt(statement);
        }

        self.end_scope();

        self.in_while = enclosing_while;
        self.current_function = enclosing_function;
    }

    fn resolve_lambda(&mut self, lambda: &LambdaDecl) {
        let enclosing_function: FunctionType = self.current_function;
        self.current_function = FunctionType::Lambda;

        let enclosing_while: bool = self.in_while;
        self.in_while = false;

        self.begin_scope();

        for param in &lambda.params {
            self.declare(param);
            self.define(param, true);
        }

        for statement in &lambda.body {
            self.resolve_stmt(statement);
        }

        self.end_scope();

        self.in_while = enclosing_while;
        self.current_function = enclosing_function;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope and emit lifecycle warnings for bindings
    /// that never progressed to `Accessed`.
    fn end_scope(&mut self) {
        let scope: HashMap<String, VariableInfo> = self.scopes.pop().unwrap_or_default();

        for (name, info) in &scope {
            match info.state {
                VariableState::Ignore | VariableState::Accessed => {}

                VariableState::Defined => {
                    self.warnings.push(LoxError::resolve(
                        info.token.line,
                        format!("Variable \"{}\" was defined but never assigned to.", name),
                    ));
                }

                _ => {
                    self.warnings.push(LoxError::resolve(
                        info.token.line,
                        format!("Variable \"{}\" was assigned to but never accessed.", name),
                    ));
                }
            }
        }
    }

    fn declare(&mut self, name: &Token) {
        // the global scope is unchecked; only block/function/class
        // scopes live on the stack
        if self.scopes.is_empty() {
            return;
        }

        let scope: &mut HashMap<String, VariableInfo> =
            self.scopes.last_mut().expect("scope stack is non-empty");

        if scope.contains_key(&name.lexeme) {
            self.errors.push(LoxError::resolve(
                name.line,
                "Variable with this name already declared in this scope.",
            ));
        }

        scope.insert(
            name.lexeme.clone(),
            VariableInfo::new(name.clone(), VariableState::Declared),
        );
    }

    fn define(&mut self, name: &Token, assigned: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            if let Some(info) = scope.get_mut(&name.lexeme) {
                info.state = if assigned {
                    VariableState::Assigned
                } else {
                    VariableState::Defined
                };
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as either a local at some depth or, when
    /// no scope knows the name, a global. A read advances the binding to
    /// `Accessed`; a bare write advances `Declared`/`Defined` to
    /// `Assigned` and no further.
    fn resolve_local(&mut self, id: ExprId, name: &Token, is_read: bool) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(info) = scope.get_mut(&name.lexeme) {
                if is_read {
                    if info.state != VariableState::Ignore {
                        info.state = VariableState::Accessed;
                    }
                } else if matches!(info.state, VariableState::Declared | VariableState::Defined) {
                    info.state = VariableState::Assigned;
                }

                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.resolve(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
