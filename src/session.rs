//! Session driver: wires scanner → parser → resolver → interpreter and
//! owns the error flags the host inspects.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use log::{error, info, warn};

use crate::error::LoxError;
use crate::function::NativeFn;
use crate::interpreter::{Interpreter, OutputSink};
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;
use crate::value::Value;

/// An interpreter session.
///
/// ```
/// use treelox::session::Lox;
///
/// let mut lox = Lox::new();
/// lox.run_source("print 1 + 2;");
///
/// assert!(!lox.had_error());
/// assert!(!lox.had_runtime_error());
/// ```
pub struct Lox {
    interpreter: Interpreter,
    next_expr_id: usize,
    had_error: bool,
    had_runtime_error: bool,
}

impl Lox {
    pub fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
            next_expr_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Route `print` output (and the REPL echo) to `output` instead of
    /// stdout.
    pub fn with_output(output: OutputSink) -> Self {
        Lox {
            interpreter: Interpreter::with_output(output),
            next_expr_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// 65 after a static (scan/parse/resolve) error, 70 after a runtime
    /// error, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.had_error {
            65
        } else if self.had_runtime_error {
            70
        } else {
            0
        }
    }

    /// Register a host value in the interpreter's global environment.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.interpreter.define_global(name, value);
    }

    /// Register a host callable (e.g. test assertions).
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        self.interpreter.define_native(name, arity, func);
    }

    /// Discard all interpreter and diagnostic state for a fresh session.
    /// The output sink is kept.
    pub fn reset(&mut self) {
        let output: OutputSink = self.interpreter.output();

        self.interpreter = Interpreter::with_output(output);
        self.next_expr_id = 0;
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Run a source string through the full pipeline. Static errors
    /// suppress interpretation; resolver lifecycle warnings do not.
    pub fn run_source(&mut self, source: &str) {
        info!("Running {} byte(s) of source", source.len());

        let mut tokens: Vec<Token> = Vec::new();

        for item in Scanner::new(source.as_bytes()) {
            match item {
                Ok(token) => tokens.push(token),

                Err(scan_error) => self.report(&scan_error),
            }
        }

        let mut parser: Parser = Parser::new(tokens, self.next_expr_id);
        let statements: Vec<Stmt> = parser.parse();
        self.next_expr_id = parser.next_expr_id();

        for parse_error in parser.errors() {
            eprintln!("{}", parse_error);
            error!("{}", parse_error);
        }
        if parser.had_error() {
            self.had_error = true;
        }

        if self.had_error {
            return;
        }

        let (resolve_errors, resolve_warnings) = {
            let mut resolver: Resolver = Resolver::new(&mut self.interpreter);
            resolver.resolve(&statements);
            resolver.into_diagnostics()
        };

        for warning in &resolve_warnings {
            eprintln!("Warning: {}", warning);
            warn!("{}", warning);
        }

        for resolve_error in &resolve_errors {
            self.report(resolve_error);
        }

        if self.had_error {
            return;
        }

        if let Err(runtime_error) = self.interpreter.interpret(&statements) {
            eprintln!("{}", runtime_error);
            error!("{}", runtime_error);
            self.had_runtime_error = true;
        }
    }

    /// Read a file (lossy UTF-8) and run it.
    pub fn run_file(&mut self, path: &Path) -> Result<(), LoxError> {
        let mut buf: Vec<u8> = Vec::new();
        let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
        reader.read_to_end(&mut buf)?;

        let source: String = String::from_utf8_lossy(&buf).into_owned();

        self.run_source(&source);

        Ok(())
    }

    /// Interactive loop: one line at a time, expression statements echo
    /// their value, and a bad line does not poison the session.
    pub fn repl(&mut self) -> Result<(), LoxError> {
        self.interpreter.set_repl(true);

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            write!(stdout, "> ")?;
            stdout.flush()?;

            let mut line: String = String::new();

            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            self.run_source(&line);

            self.had_error = false;
            self.had_runtime_error = false;
        }

        self.interpreter.set_repl(false);

        Ok(())
    }

    fn report(&mut self, static_error: &LoxError) {
        eprintln!("{}", static_error);
        error!("{}", static_error);

        self.had_error = true;
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
