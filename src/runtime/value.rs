use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;
use crate::compiler::ast::LiteralValue;
use crate::runtime::error::RuntimeResult;
use crate::runtime::interpreter::Interpreter;

/// Anything a call expression can invoke: user functions and natives alike.
pub trait Callable {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    /// The interpreter has already checked that `arguments.len() == self.arity()`.
    fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Value>) -> RuntimeResult<Value>;

    fn is_native(&self) -> bool {
        false
    }
}

#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Function(Rc<dyn Callable>),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Boolean(value) => *value,
            _ => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(left), Value::Boolean(right)) => left == right,
            (Value::Number(left), Value::Number(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Function(left), Value::Function(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl From<LiteralValue> for Value {
    fn from(value: LiteralValue) -> Self {
        match value {
            LiteralValue::Nil => Value::Nil,
            LiteralValue::Boolean(value) => Value::Boolean(value),
            LiteralValue::Number(value) => Value::Number(value),
            LiteralValue::String(value) => Value::String(value),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Rc::from(value))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::Number(value) => write!(f, "{}", value),
            Value::String(value) => f.write_str(value),
            Value::Function(function) if function.is_native() => write!(f, "<native fn {}>", function.name()),
            Value::Function(function) => write!(f, "<fn {}>", function.name()),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(value) => write!(f, "\"{}\"", value),
            _ => write!(f, "{}", self),
        }
    }
}
