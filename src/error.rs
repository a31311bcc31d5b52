//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here, enabling a
//! uniform `Result<T>` alias throughout the crate.
//!
//! Diagnostics are *printed* by the [`Reporter`], the per-run context the
//! driver owns. It keeps the "had static error" / "had runtime error" flags
//! the driver consults between pipeline stages, and retains the rendered
//! messages so callers (and tests) can inspect them after a run.

use std::io;

use log::debug;
use thiserror::Error;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex { message: String, line: usize },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static-analysis (resolver) error.
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Runtime evaluation error, carrying the line of the offending token.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error`. Enables `?` on output ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Parse error: line={}, msg={}", line, message);

        LoxError::Parse { message, line }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Resolve error: line={}, msg={}", line, message);

        LoxError::Resolve { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Per-run diagnostics context.
///
/// Static errors (lex/parse/resolve) set `had_error`; runtime errors set
/// `had_runtime_error`. The driver suppresses later pipeline stages on the
/// first flag and picks the process exit code from both.
#[derive(Debug, Default)]
pub struct Reporter {
    had_error: bool,
    had_runtime_error: bool,
    diagnostics: Vec<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print a diagnostic to stderr, record it, and set the matching flag.
    pub fn report(&mut self, error: &LoxError) {
        let rendered: String = error.to_string();

        eprintln!("{}", rendered);

        self.diagnostics.push(rendered);

        match error {
            LoxError::Runtime { .. } | LoxError::Io(_) => self.had_runtime_error = true,
            _ => self.had_error = true,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Every diagnostic reported so far, in order.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Clear flags and recorded diagnostics between REPL lines.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
        self.diagnostics.clear();
    }
}
