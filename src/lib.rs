//! Tree‑walking interpreter for a small dynamically typed, class‑based
//! scripting language.
//!
//! Pipeline: [`scanner`] → [`parser`] → [`resolver`] (static binding
//! distances) → [`interpreter`].  [`Lox`] wires the stages together for a
//! session that keeps its globals between runs, as a REPL needs.

pub mod ast;
pub mod ast_printer;
pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::Write;

use log::info;

use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::value::Value;

/// One interpreter session.
pub struct Lox {
    interpreter: Interpreter,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// Session whose `print` output goes to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Scan, parse, resolve and execute `source`.
    ///
    /// Static errors from every stage before execution are reported together
    /// as [`LoxError::Compile`] and nothing runs; a runtime error stops the
    /// program at the failing statement.
    pub fn run(&mut self, source: &str) -> Result<()> {
        let (tokens, mut errors) = Scanner::new(source).scan_all();

        let statements = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(LoxError::Compile(parse_errors)) => {
                errors.extend(parse_errors);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        LoxError::compile(errors)?;

        Resolver::new(&mut self.interpreter).resolve(&statements)?;

        info!("Executing {} statements", statements.len());

        self.interpreter.interpret(&statements)
    }

    /// Evaluate `source` as a single expression.
    pub fn evaluate(&mut self, source: &str) -> Result<Value> {
        let (tokens, errors) = Scanner::new(source).scan_all();
        LoxError::compile(errors)?;

        let expr = Parser::new(tokens).parse_expression()?;

        Resolver::new(&mut self.interpreter).resolve_expression(&expr)?;

        self.interpreter.evaluate(&expr)
    }
}
