use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use loxide as lox;

use lox::ast_printer::AstPrinter;
use lox::error::Reporter;
use lox::interpreter::Interpreter;
use lox::parser::{Expr, Parser, Stmt};
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit the token stream as JSON instead of the text format
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file as a single expression and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program, or starts a REPL without one
    Run { filename: Option<PathBuf> },
}

/// Map the script into memory and hand out a `'static` string view.
///
/// The program text must outlive the tokens, the AST, and (in the REPL)
/// every closure created so far, so the driver deliberately never frees
/// it. Leaking also pins every AST node at a stable address, which the
/// binding-distance table relies on.
fn read_source(filename: PathBuf) -> Result<&'static str> {
    info!("Reading file: {:?}", filename);

    let file: File =
        File::open(&filename).context(format!("Failed to open file {:?}", filename))?;

    let len: u64 = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Mapping a zero-length file fails on some platforms.
    if len == 0 {
        info!("File {:?} is empty", filename);

        return Ok("");
    }

    let mmap: Mmap = unsafe { Mmap::map(&file) }
        .context(format!("Failed to memory-map file {:?}", filename))?;

    let source: String = std::str::from_utf8(&mmap)
        .context(format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", len, filename);

    Ok(Box::leak(source.into_boxed_str()))
}

fn init_logger() -> Result<()> {
    let log_file: File = File::create("app.log").context("Failed to create app.log")?;

    // Write to file with module path and source line; strip the crate
    // prefix so entries read as [scanner:42].
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("loxide::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

/// Scan the whole source, reporting lexical errors and collecting the
/// tokens that did scan (including the trailing EOF).
fn scan_tokens(source: &'static str, reporter: &mut Reporter) -> Vec<Token<'static>> {
    let mut tokens: Vec<Token<'static>> = Vec::new();

    for token in Scanner::new(source) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);

                tokens.push(token);
            }

            Err(e) => reporter.report(&e),
        }
    }

    tokens
}

/// Scan, parse, resolve, and interpret one unit of source text.
///
/// Tokens and statements are leaked: the interpreter is `'static` so that
/// closures created on one REPL line stay callable on the next, and leaked
/// nodes keep the stable addresses the distance table is keyed by.
fn run(source: &'static str, interpreter: &mut Interpreter<'static>, reporter: &mut Reporter) {
    let tokens: &'static [Token<'static>] = Vec::leak(scan_tokens(source, reporter));

    if reporter.had_error() {
        return;
    }

    let mut parser: Parser<'static, '_> = Parser::new(tokens, reporter);
    let statements: &'static [Stmt<'static>] = Vec::leak(parser.parse());

    if reporter.had_error() {
        return;
    }

    info!("Parsed {} statements", statements.len());

    let mut resolver: Resolver<'static, '_, '_> = Resolver::new(interpreter, reporter);
    resolver.resolve(statements);

    if reporter.had_error() {
        return;
    }

    if let Err(e) = interpreter.interpret(statements) {
        reporter.report(&e);
    }
}

/// Interactive prompt: one pipeline run per line, error flags reset
/// between lines, definitions persisting in the shared interpreter.
fn repl(interpreter: &mut Interpreter<'static>, reporter: &mut Reporter) -> Result<()> {
    info!("Starting REPL");

    let stdin: io::Stdin = io::stdin();
    let mut stdout: io::Stdout = io::stdout();

    loop {
        write!(stdout, "> ").context("Failed to write prompt")?;
        stdout.flush().context("Failed to flush prompt")?;

        let mut line: String = String::new();

        let bytes: usize = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        // EOF (Ctrl-D).
        if bytes == 0 {
            break;
        }

        if line.trim().is_empty() {
            continue;
        }

        // A line error must not poison the next line.
        reporter.reset();

        run(Box::leak(line.into_boxed_str()), interpreter, reporter);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");

                let source: &'static str = read_source(filename)?;
                let mut reporter: Reporter = Reporter::new();

                let tokens: Vec<Token<'static>> = scan_tokens(source, &mut reporter);

                if json {
                    let rendered: String = serde_json::to_string_pretty(&tokens)
                        .context("Failed to serialize tokens")?;

                    println!("{}", rendered);
                } else {
                    for token in &tokens {
                        println!("{}", token);
                    }
                }

                if reporter.had_error() {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Tokenization completed successfully");
            }

            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");

                let source: &'static str = read_source(filename)?;
                let mut reporter: Reporter = Reporter::new();

                let tokens: &'static [Token<'static>] =
                    Vec::leak(scan_tokens(source, &mut reporter));

                if reporter.had_error() {
                    std::process::exit(65);
                }

                let mut parser: Parser<'static, '_> = Parser::new(tokens, &mut reporter);

                match parser.parse_expression() {
                    Some(expr) => {
                        info!("Expression parsed successfully");

                        let ast_str: String = AstPrinter::print(&expr);

                        debug!("AST: {}", ast_str);
                        println!("{}", ast_str);
                    }

                    None => std::process::exit(65),
                }

                info!("Parse subcommand completed");
            }

            None => {
                info!("No filepath provided for Parse");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Evaluate { filename } => match filename {
            Some(filename) => {
                info!("Running Evaluate subcommand");

                let source: &'static str = read_source(filename)?;
                let mut reporter: Reporter = Reporter::new();

                let tokens: &'static [Token<'static>] =
                    Vec::leak(scan_tokens(source, &mut reporter));

                if reporter.had_error() {
                    std::process::exit(65);
                }

                let mut parser: Parser<'static, '_> = Parser::new(tokens, &mut reporter);

                let Some(expr) = parser.parse_expression() else {
                    std::process::exit(65);
                };

                let expr: &'static Expr<'static> = Box::leak(Box::new(expr));
                let mut interpreter: Interpreter<'static> = Interpreter::new();

                match interpreter.evaluate(expr) {
                    Ok(value) => {
                        debug!("Evaluated to: {}", value);
                        println!("{}", value);
                    }

                    Err(e) => {
                        eprintln!("{}", e);
                        std::process::exit(70);
                    }
                }

                info!("Evaluate subcommand completed");
            }

            None => {
                info!("No filepath provided for Evaluate");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Run { filename } => {
            let mut interpreter: Interpreter<'static> = Interpreter::new();
            let mut reporter: Reporter = Reporter::new();

            match filename {
                Some(filename) => {
                    info!("Running Run subcommand");

                    let source: &'static str = read_source(filename)?;

                    run(source, &mut interpreter, &mut reporter);

                    if reporter.had_error() {
                        std::process::exit(65);
                    }

                    if reporter.had_runtime_error() {
                        std::process::exit(70);
                    }

                    info!("Program executed successfully");
                }

                None => repl(&mut interpreter, &mut reporter)?,
            }
        }
    }

    Ok(())
}
