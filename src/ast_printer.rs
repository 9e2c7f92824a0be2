use crate::expr::Expr;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::TokenType;

/// Parenthesized prefix rendering of the AST, used by the `parse` CLI
/// subcommand and tests.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(expr {})", self.print(expr)),

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(initializer) => {
                    format!("(var {} {})", name.lexeme, self.print(initializer))
                }

                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => {
                let body: Vec<String> = statements.iter().map(|s| self.print_stmt(s)).collect();

                format!("(block {})", body.join(" "))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),

                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                self.print(condition),
                self.print_stmt(body)
            ),

            Stmt::Break { .. } => "(break)".to_string(),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", self.print(value)),

                None => "(return)".to_string(),
            },

            Stmt::Function(function) => self.print_function("fun", function),

            Stmt::Class {
                name,
                superclass,
                properties,
                methods,
                class_methods,
            } => {
                let mut parts: Vec<String> = vec!["class".to_string(), name.lexeme.clone()];

                if let Some(superclass) = superclass {
                    parts.push(format!("< {}", self.print(superclass)));
                }

                for property in properties {
                    parts.push(self.print_function("property", property));
                }

                for method in methods {
                    parts.push(self.print_function("method", method));
                }

                for class_method in class_methods {
                    parts.push(self.print_function("class-method", class_method));
                }

                format!("({})", parts.join(" "))
            }
        }
    }

    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                self.print(left),
                self.print(right)
            ),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(?: {} {} {})",
                self.print(condition),
                self.print(then_branch),
                self.print(else_branch)
            ),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print(right))
            }

            Expr::Literal(token) => match &token.token_type {
                TokenType::NUMBER(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                TokenType::STRING(s) => s.to_string(),

                TokenType::TRUE => "true".to_string(),

                TokenType::FALSE => "false".to_string(),

                TokenType::NIL => "nil".to_string(),

                _ => token.lexeme.clone(),
            },

            Expr::Grouping(inner) => format!("(group {})", self.print(inner)),

            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, self.print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut parts: Vec<String> = vec!["call".to_string(), self.print(callee)];

                for argument in arguments {
                    parts.push(self.print(argument));
                }

                format!("({})", parts.join(" "))
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                self.print(object),
                name.lexeme,
                self.print(value)
            ),

            Expr::This { .. } => "this".to_string(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            Expr::Lambda(lambda) => {
                let params: Vec<String> =
                    lambda.params.iter().map(|p| p.lexeme.clone()).collect();

                let body: Vec<String> = lambda.body.iter().map(|s| self.print_stmt(s)).collect();

                format!("(lambda ({}) {})", params.join(" "), body.join(" "))
            }
        }
    }

    fn print_function(&self, kind: &str, function: &FunctionDecl) -> String {
        let params: Vec<String> = function.params.iter().map(|p| p.lexeme.clone()).collect();

        let body: Vec<String> = function.body.iter().map(|s| self.print_stmt(s)).collect();

        if function.is_property {
            format!("({} {} {})", kind, function.name.lexeme, body.join(" "))
        } else {
            format!(
                "({} {} ({}) {})",
                kind,
                function.name.lexeme,
                params.join(" "),
                body.join(" ")
            )
        }
    }
}
