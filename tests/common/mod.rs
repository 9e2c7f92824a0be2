#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use treelox::session::Lox;

/// A `Write` sink the test keeps a handle to, so interpreter output can
/// be asserted after a run.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose `print` output is captured.
pub struct Session {
    pub lox: Lox,
    output: SharedOutput,
}

impl Session {
    pub fn new() -> Self {
        let output: SharedOutput = SharedOutput::new();
        let lox: Lox = Lox::with_output(Rc::new(RefCell::new(output.clone())));

        Session { lox, output }
    }

    pub fn output(&self) -> String {
        self.output.contents()
    }
}

pub fn run(source: &str) -> Session {
    let mut session: Session = Session::new();
    session.lox.run_source(source);
    session
}
