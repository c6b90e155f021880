#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use treelox::error::{LoxError, Result};
use treelox::Lox;

/// `Write` sink whose contents stay readable after the session takes it.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
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

/// Fresh session plus a handle on everything it prints.
pub fn session() -> (Lox, SharedOutput) {
    let output = SharedOutput::default();
    (Lox::with_output(Box::new(output.clone())), output)
}

/// Run `source` in a fresh session, returning what it printed and the outcome.
pub fn run(source: &str) -> (String, Result<()>) {
    let (mut lox, output) = session();
    let result = lox.run(source);
    (output.contents(), result)
}

/// Run `source`, failing the test on any error.
pub fn run_ok(source: &str) -> String {
    let (output, result) = run(source);
    if let Err(e) = result {
        panic!("program failed:\n{}\noutput so far:\n{}", e, output);
    }
    output
}

/// Run `source` expecting a runtime error; returns output and the message.
pub fn run_runtime_error(source: &str) -> (String, String) {
    match run(source) {
        (output, Err(LoxError::Runtime { message, .. })) => (output, message),
        (output, other) => panic!("expected runtime error, got {:?} (output: {})", other, output),
    }
}

/// Run `source` expecting static errors; returns their rendered messages.
pub fn run_static_errors(source: &str) -> Vec<String> {
    match run(source) {
        (output, Err(LoxError::Compile(errors))) => {
            assert!(output.is_empty(), "nothing may run after a static error");
            errors.iter().map(ToString::to_string).collect()
        }
        (_, other) => panic!("expected static errors, got {:?}", other),
    }
}
