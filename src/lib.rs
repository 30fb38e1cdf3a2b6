//! A tree-walking interpreter for Lox, a small dynamically-typed, lexically
//! scoped, class-based scripting language.
//!
//! The pipeline has four stages, one module each:
//!
//! ## Scanning
//! [`scanner`] turns source text into a flat list of [`token::Token`]s. It
//! reports unterminated strings and unexpected characters but never stops:
//! scanning continues so a single run can surface every lexical error at
//! once instead of bailing on the first one.
//!
//! ## Parsing
//! [`parser`] is a hand-written recursive descent parser that turns tokens
//! into the [`ast::Expr`]/[`ast::Stmt`] tree. Precedence is climbed through
//! a chain of methods (`assignment` → `logic_or` → ... → `primary`); a
//! syntax error enters panic-mode recovery, discarding tokens until the next
//! statement boundary so later errors in the same file still get reported.
//!
//! ## Resolving
//! [`resolver`] is a single static pass over the parsed tree that computes,
//! for every variable reference, how many enclosing scopes out its binding
//! lives. This is what lets a closure keep seeing the variable it captured
//! even after the interpreter has moved on to evaluating other code, and
//! it's also where `this`/`super` misuse and duplicate local declarations
//! are caught before anything runs.
//!
//! ## Interpreting
//! [`interpreter`] walks the resolved tree directly, evaluating expressions
//! and executing statements in one pass, using the resolver's table to
//! reach straight into the right [`environment::Environment`] without
//! re-walking the scope chain.
//!
//! [`error`] carries the three kinds of diagnostics the pipeline can
//! produce (scan/parse errors, resolver errors, and runtime errors) behind
//! a single [`error::Reporter`] trait, so the CLI and the test suite can
//! swap in different sinks without the pipeline itself changing.

pub mod ast;
pub mod class;
pub mod environment;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;

use std::io::Write;

use error::{Error, Reporter};
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Drives one source's worth of Lox through scan → parse → resolve →
/// interpret, holding the interpreter's global state across calls so a REPL
/// session can build on previous lines.
pub struct Lox {
    interpreter: Interpreter,
}

impl Lox {
    /// `stdout` is where `print` and REPL auto-printed expressions go; tests
    /// inject a `Vec<u8>` to assert on, the CLI injects real stdout.
    pub fn new(stdout: Box<dyn Write>) -> Self {
        Lox {
            interpreter: Interpreter::new(stdout),
        }
    }

    pub fn set_repl_mode(&mut self, repl_mode: bool) {
        self.interpreter.repl_mode = repl_mode;
    }

    /// Runs one chunk of source. Scan/parse/resolve errors stop the run
    /// before anything executes; a runtime error stops the run partway
    /// through. Either way, the outcome is read off `reporter` afterward,
    /// not from this method's return value — there's nothing more to say
    /// here than "ran".
    pub fn run(&mut self, source: &str, reporter: &dyn Reporter) {
        let tokens = Scanner::new(source, reporter).scan_tokens();
        let statements = Parser::new(&tokens, reporter).parse();

        if reporter.had_error() {
            return;
        }

        let locals = Resolver::new(reporter).resolve(&statements);
        if reporter.had_error() {
            return;
        }

        self.interpreter.load_locals(locals);
        self.interpreter.interpret(&statements, reporter);
    }

    /// Reads `path` and runs it. The exit code is the caller's job: check
    /// `reporter.had_error()`/`had_runtime_error()` afterward to tell a
    /// clean run from a scan/parse/resolve failure from a runtime failure.
    pub fn run_file(&mut self, path: &str, reporter: &dyn Reporter) -> Result<(), Error> {
        let contents = std::fs::read_to_string(path)?;
        self.run(&contents, reporter);
        Ok(())
    }
}
