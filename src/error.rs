use std::cell::{Cell, RefCell};
use std::fmt;
use std::io;

use crate::object::Object;
use crate::token::{Token, TokenType};

/// A scan/parse/resolve-time diagnostic: "[line N] Error<loc>: <message>".
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        Diagnostic {
            line,
            location: String::new(),
            message: message.into(),
        }
    }

    /// Scan/parse/resolve errors all need a token to describe "where": either
    /// the end of input or a specific lexeme.
    pub fn at_token(token: &Token, message: impl Into<String>) -> Self {
        let location = if token.token_type == TokenType::Eof {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        Diagnostic {
            line: token.line,
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.line, self.location, self.message)
    }
}

/// A runtime error: "<message>\n[line N]", using the offending token's line.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        RuntimeError {
            token,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n[line {}]", self.message, self.token.line)
    }
}

/// The interpreter's non-local `return` signal. Not an error — it is caught
/// exactly once per call frame and never reaches a `Reporter`.
#[derive(Debug, Clone)]
pub struct Return {
    pub value: Object,
}

/// Either a runtime error to report, or a `return` unwinding the current
/// call frame. Everything in the interpreter's evaluation path threads one
/// of these through `?` so both share a single control-flow channel.
#[derive(Debug, Clone)]
pub enum Unwind {
    Error(RuntimeError),
    Return(Object),
}

impl From<RuntimeError> for Unwind {
    fn from(e: RuntimeError) -> Self {
        Unwind::Error(e)
    }
}

/// Collects scan/parse/resolve/runtime diagnostics and tracks whether the
/// run had an error, so the driver knows whether to skip execution (scan/
/// parse/resolve error) or report a nonzero exit code (runtime error).
///
/// Generalizes the book's pair of module-level "hadError" flags into an
/// injectable collaborator: the CLI uses `StderrReporter`, tests use
/// `CollectingReporter`.
pub trait Reporter {
    fn diagnostic(&self, diagnostic: Diagnostic);
    fn runtime_error(&self, error: RuntimeError);
    fn had_error(&self) -> bool;
    fn had_runtime_error(&self) -> bool;
    /// Clears both flags; called between lines in the REPL so one bad line
    /// doesn't poison the rest of the session.
    fn reset(&self);
}

#[derive(Default)]
pub struct StderrReporter {
    had_error: Cell<bool>,
    had_runtime_error: Cell<bool>,
}

impl StderrReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for StderrReporter {
    fn diagnostic(&self, diagnostic: Diagnostic) {
        eprintln!("{diagnostic}");
        self.had_error.set(true);
    }

    fn runtime_error(&self, error: RuntimeError) {
        eprintln!("{error}");
        self.had_runtime_error.set(true);
    }

    fn had_error(&self) -> bool {
        self.had_error.get()
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    fn reset(&self) {
        self.had_error.set(false);
        self.had_runtime_error.set(false);
    }
}

/// Test-only reporter: records rendered diagnostics instead of printing
/// them, so assertions can inspect exactly what a run would have said on
/// stderr without capturing a subprocess.
#[derive(Default)]
pub struct CollectingReporter {
    diagnostics: RefCell<Vec<String>>,
    had_error: Cell<bool>,
    had_runtime_error: Cell<bool>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.borrow().clone()
    }
}

impl Reporter for CollectingReporter {
    fn diagnostic(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic.to_string());
        self.had_error.set(true);
    }

    fn runtime_error(&self, error: RuntimeError) {
        self.diagnostics.borrow_mut().push(error.to_string());
        self.had_runtime_error.set(true);
    }

    fn had_error(&self) -> bool {
        self.had_error.get()
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error.get()
    }

    fn reset(&self) {
        self.had_error.set(false);
        self.had_runtime_error.set(false);
    }
}

/// Errors that can stop a run before the pipeline even gets a chance to
/// report anything itself, namely not being able to read the script file.
/// Scan/parse/resolve/runtime failures never show up here — those go
/// through `Reporter`, which the caller consults after `run`/`run_file`
/// returns to pick an exit code.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
