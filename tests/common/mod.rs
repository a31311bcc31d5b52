//! Shared harness for the integration tests: runs a source string through
//! the full scan → parse → resolve → interpret pipeline, capturing printed
//! output and diagnostics.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use loxide::ast_printer::AstPrinter;
use loxide::error::Reporter;
use loxide::interpreter::Interpreter;
use loxide::parser::{Parser, Stmt};
use loxide::resolver::Resolver;
use loxide::scanner::Scanner;
use loxide::token::Token;

/// In-memory `Write` sink the test keeps a handle to after handing the
/// interpreter its clone.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything observable about one pipeline run.
pub struct Outcome {
    /// Text the program printed.
    pub output: String,
    /// Rendered diagnostics, in report order.
    pub diagnostics: Vec<String>,
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl Outcome {
    /// True if any diagnostic contains `needle`.
    pub fn reported(&self, needle: &str) -> bool {
        self.diagnostics.iter().any(|d| d.contains(needle))
    }
}

fn scan(source: &'static str, reporter: &mut Reporter) -> &'static [Token<'static>] {
    let mut tokens: Vec<Token<'static>> = Vec::new();

    for token in Scanner::new(source) {
        match token {
            Ok(token) => tokens.push(token),
            Err(e) => reporter.report(&e),
        }
    }

    Vec::leak(tokens)
}

/// Run `source` through the full pipeline, mirroring the driver: later
/// stages are skipped once an earlier stage reports an error.
///
/// Tokens and AST are leaked so the interpreter can borrow them at
/// `'static`, exactly as the driver does.
pub fn run_program(source: &str) -> Outcome {
    let source: &'static str = Box::leak(source.to_owned().into_boxed_str());

    let mut reporter: Reporter = Reporter::new();
    let tokens: &'static [Token<'static>] = scan(source, &mut reporter);

    let mut parser: Parser<'static, '_> = Parser::new(tokens, &mut reporter);
    let statements: &'static [Stmt<'static>] = Vec::leak(parser.parse());

    let buf: SharedBuf = SharedBuf::new();
    let mut interpreter: Interpreter<'static> = Interpreter::with_output(Box::new(buf.clone()));

    if !reporter.had_error() {
        let mut resolver = Resolver::new(&mut interpreter, &mut reporter);
        resolver.resolve(statements);

        if !reporter.had_error() {
            if let Err(e) = interpreter.interpret(statements) {
                reporter.report(&e);
            }
        }
    }

    Outcome {
        output: buf.contents(),
        diagnostics: reporter.diagnostics().to_vec(),
        had_error: reporter.had_error(),
        had_runtime_error: reporter.had_runtime_error(),
    }
}

/// Parse `source` as a single expression and render it in prefix form.
/// `None` if it does not scan or parse.
pub fn print_expression(source: &str) -> Option<String> {
    let source: &'static str = Box::leak(source.to_owned().into_boxed_str());

    let mut reporter: Reporter = Reporter::new();
    let tokens: &'static [Token<'static>] = scan(source, &mut reporter);

    if reporter.had_error() {
        return None;
    }

    let mut parser: Parser<'static, '_> = Parser::new(tokens, &mut reporter);

    parser.parse_expression().map(|expr| AstPrinter::print(&expr))
}
