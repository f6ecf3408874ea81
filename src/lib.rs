pub mod util;
pub mod compiler;
pub mod runtime;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use clap::Parser as ClapParser;
use thiserror::Error;
use crate::compiler::ast::{ExprId, Stmt};
use crate::compiler::diagnostics::{ConsoleDiagnostics, Diagnostics};
use crate::compiler::lexer::Lexer;
use crate::compiler::parser::Parser;
use crate::compiler::resolver::Resolver;
use crate::runtime::interpreter::Interpreter;

#[derive(ClapParser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Config {
    #[clap(help = "Script to run; starts an interactive prompt if omitted")]
    pub input: Option<PathBuf>,

    #[clap(long, help = "Print the parsed statements instead of running them")]
    pub ast: bool,

    #[clap(short, long, help = "Print verbose log output")]
    pub verbose: bool,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("The program reported errors")]
    Failed,
}

pub fn run(config: &Config) -> Result<(), Error> {
    match &config.input {
        Some(path) if config.ast => print_ast(path),
        Some(path) => run_file(path),
        None => run_prompt(),
    }
}

/// Lexes and parses `source`. Statements with syntax errors are left out.
pub fn parse_source(source: &str, diagnostics: &mut dyn Diagnostics) -> Vec<Stmt> {
    let tokens = Lexer::new(source).scan_tokens(diagnostics);
    let mut parser = Parser::new(tokens, diagnostics);

    parser.parse()
}

/// Runs one batch of source text against `interpreter`, whose globals carry over to the
/// next batch. Statements that parsed are still resolved and run after a syntax error
/// elsewhere; a resolution error skips running the batch entirely.
pub fn run_source(source: &str, interpreter: &mut Interpreter<'_>) {
    let statements = parse_source(source, interpreter.diagnostics());

    let mut resolver = Resolver::new(interpreter.diagnostics());
    resolver.resolve(&statements);

    if resolver.had_error() {
        return;
    }

    let locals = resolver.into_locals();

    // Without new functions, nothing can look these up once the batch is done
    let finished: Vec<ExprId> = if statements.iter().any(Stmt::declares_function) {
        Vec::new()
    } else {
        locals.keys().copied().collect()
    };

    interpreter.add_locals(locals);
    interpreter.interpret(&statements);
    interpreter.forget_locals(&finished);
}

pub fn run_file(path: &Path) -> Result<(), Error> {
    let source = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = source.len(), "running file");

    let mut diagnostics = ConsoleDiagnostics::new();
    let mut interpreter = Interpreter::new(&mut diagnostics);
    run_source(&source, &mut interpreter);
    drop(interpreter);

    if diagnostics.had_error() {
        return Err(Error::Failed);
    }

    Ok(())
}

pub fn print_ast(path: &Path) -> Result<(), Error> {
    let source = std::fs::read_to_string(path)?;

    let mut diagnostics = ConsoleDiagnostics::new();
    let statements = parse_source(&source, &mut diagnostics);

    println!("{}", statements.iter().map(|stmt| format!("{:?}", stmt)).collect::<Vec<String>>().join("\n"));

    if diagnostics.had_error() {
        return Err(Error::Failed);
    }

    Ok(())
}

/// Reads and runs one line at a time until end of input. Errors don't end the session.
pub fn run_prompt() -> Result<(), Error> {
    let mut diagnostics = ConsoleDiagnostics::new();
    let mut interpreter = Interpreter::new(&mut diagnostics);

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        line.clear();

        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        run_source(&line, &mut interpreter);
    }

    Ok(())
}
