//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Two reporting shapes exist: by raw line number (scanner errors, which have
//! no token yet) and by token (parser, resolver and runtime errors), where the
//! location reads `" at end"` for EOF and `" at '<lexeme>'"` otherwise.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static scope/context violation found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Every static error found in one input, in source order.
    #[error("{}", join_lines(.0))]
    Compile(Vec<LoxError>),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

fn join_lines(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `" at end"` or `" at '<lexeme>'"`.
fn location_of(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Report by raw line number (**scanner**).
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Report by token (**parser**).
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Report by token (**resolver**).
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Report by token (**interpreter**).
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        Self::runtime_at(token.line, msg)
    }

    /// Runtime error for nodes that carry no token of their own.
    pub fn runtime_at<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }

    /// Bundle the static errors of one input, or `Ok` if there are none.
    pub fn compile(errors: Vec<LoxError>) -> Result<()> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LoxError::Compile(errors))
        }
    }

    /// Static errors (scan, parse, resolve) versus runtime failures.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. }
                | LoxError::Parse { .. }
                | LoxError::Resolve { .. }
                | LoxError::Compile(_)
        )
    }

    /// Process exit status for this error: 65 for static errors, 70 for
    /// runtime errors and 74 for I/O.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Runtime { .. } => 70,
            LoxError::Io(_) | LoxError::Utf8(_) => 74,
            _ => 65,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
