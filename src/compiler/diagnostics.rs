use crate::compiler::lexer::{Token, TokenType};
use crate::runtime::value::Value;

/// Where every stage of the pipeline sends its errors, and where `print` sends its values.
pub trait Diagnostics {
    /// Reports an error that has no token attached, like a lexer error.
    fn report(&mut self, message: &str);

    fn report_at(&mut self, token: &Token, message: &str);

    fn print(&mut self, value: &Value);

    fn had_error(&self) -> bool;
}

/// Renders an error attached to a token, including its lexeme and source offset.
pub fn format_error_at(token: &Token, message: &str) -> String {
    if token.token_type() == TokenType::Eof {
        format!("{} Error at end (offset {}): {}", token.pos(), token.offset(), message)
    } else {
        format!("{} Error at '{}' (offset {}): {}", token.pos(), token.source(), token.offset(), message)
    }
}

/// Errors go to stderr, printed values to stdout.
#[derive(Debug, Default)]
pub struct ConsoleDiagnostics {
    had_error: bool,
}

impl ConsoleDiagnostics {
    pub fn new() -> ConsoleDiagnostics {
        ConsoleDiagnostics::default()
    }
}

impl Diagnostics for ConsoleDiagnostics {
    fn report(&mut self, message: &str) {
        eprintln!("Error: {}", message);
        self.had_error = true;
    }

    fn report_at(&mut self, token: &Token, message: &str) {
        eprintln!("{}", format_error_at(token, message));
        self.had_error = true;
    }

    fn print(&mut self, value: &Value) {
        println!("{}", value);
    }

    fn had_error(&self) -> bool {
        self.had_error
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct CaptureDiagnostics {
    pub errors: Vec<String>,
    pub printed: Vec<String>,
}

impl CaptureDiagnostics {
    pub fn new() -> CaptureDiagnostics {
        CaptureDiagnostics::default()
    }
}

impl Diagnostics for CaptureDiagnostics {
    fn report(&mut self, message: &str) {
        self.errors.push(format!("Error: {}", message));
    }

    fn report_at(&mut self, token: &Token, message: &str) {
        self.errors.push(format_error_at(token, message));
    }

    fn print(&mut self, value: &Value) {
        self.printed.push(value.to_string());
    }

    fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }
}
