use thiserror::Error;
use crate::compiler::lexer::Token;
use crate::runtime::value::Value;

/// Every failure during evaluation: type mismatches, undefined variables, bad calls.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: &Token, message: impl Into<String>) -> RuntimeError {
        RuntimeError { token: token.clone(), message: message.into() }
    }
}

/// Why statement execution stopped early.
#[derive(Debug)]
pub enum Unwind {
    /// A `return` statement, caught by the nearest enclosing function call.
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
pub type ExecResult = Result<(), Unwind>;
