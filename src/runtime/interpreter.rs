use std::collections::HashMap;
use std::rc::Rc;
use crate::compiler::ast::{Expr, ExprId, Stmt};
use crate::compiler::diagnostics::Diagnostics;
use crate::compiler::lexer::{Token, TokenType};
use crate::runtime::environment::{Environment, EnvironmentRef};
use crate::runtime::error::{ExecResult, RuntimeError, RuntimeResult, Unwind};
use crate::runtime::function::Function;
use crate::runtime::native;
use crate::runtime::value::{Callable, Value};
use crate::util;

#[cfg(test)]
mod tests;

/// Nested calls deeper than this fail with a runtime error instead of exhausting memory.
pub const MAX_CALL_DEPTH: usize = 2048;

/// Tree-walking evaluator. Keeps the global frame and the resolver's distances across
/// calls to [`Interpreter::interpret`], so a prompt can feed it one line at a time.
pub struct Interpreter<'d> {
    diagnostics: &'d mut dyn Diagnostics,

    globals: EnvironmentRef,
    environment: EnvironmentRef,
    locals: HashMap<ExprId, usize>,
    call_depth: usize,
}

impl<'d> Interpreter<'d> {
    pub fn new(diagnostics: &'d mut dyn Diagnostics) -> Interpreter<'d> {
        let globals = Environment::new_global();

        let mut interpreter = Interpreter {
            diagnostics,
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
        };

        for native in native::builtins() {
            if let Err(err) = interpreter.define_native(native) {
                tracing::warn!(%err, "skipped native function");
            }
        }

        interpreter
    }

    pub fn diagnostics(&mut self) -> &mut dyn Diagnostics {
        &mut *self.diagnostics
    }

    pub fn globals(&self) -> EnvironmentRef {
        Rc::clone(&self.globals)
    }

    pub fn define_native(&mut self, native: Rc<dyn Callable>) -> RuntimeResult<()> {
        let name = Token::synthetic(native.name());
        self.globals.borrow_mut().define(&name, Value::Function(native))
    }

    /// Records resolver output. Expressions without an entry are globals.
    pub fn add_locals(&mut self, locals: HashMap<ExprId, usize>) {
        self.locals.extend(locals);
    }

    /// Drops entries of a finished batch. Only valid when no function value created by
    /// that batch can still run.
    pub fn forget_locals(&mut self, ids: &[ExprId]) {
        for id in ids {
            self.locals.remove(id);
        }
    }

    /// Runs top-level statements until the first runtime error, which is reported.
    pub fn interpret(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {},
                Err(Unwind::Error(err)) => {
                    tracing::debug!(%err, "runtime error");
                    self.diagnostics.report_at(&err.token, &err.message);
                    return;
                },
                Err(Unwind::Return(_)) => {
                    // Only reachable when the resolver was skipped
                    tracing::warn!("return outside of a function, stopping");
                    return;
                },
            }
        }
    }

    // Statements

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        util::ensure_sufficient_stack(|| self.execute_statement(stmt))
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            },
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.diagnostics.print(&value);
            },
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(name, value)?;
            },
            Stmt::Block(statements) => {
                let environment = Environment::new_with_parent(Rc::clone(&self.environment));
                self.execute_block(statements, environment)?;
            },
            Stmt::If { condition, then, otherwise } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then)?;
                } else if let Some(otherwise) = otherwise {
                    self.execute(otherwise)?;
                }
            },
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
            },
            Stmt::Function(declaration) => {
                let function = Function::new(Rc::clone(declaration), Rc::clone(&self.environment));
                self.environment.borrow_mut().define(&declaration.name, Value::Function(Rc::new(function)))?;
            },
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => Value::Nil,
                };

                return Err(Unwind::Return(value));
            },
        }

        Ok(())
    }

    /// Runs `statements` in `environment`, restoring the current frame however they finish.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvironmentRef) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);
        tracing::trace!(statements = statements.len(), "enter scope");

        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));

        self.environment = previous;
        result
    }

    // Expressions

    fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        util::ensure_sufficient_stack(|| self.evaluate_expression(expr))
    }

    fn evaluate_expression(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(Value::from(value.clone())),
            Expr::Grouping(expr) => self.evaluate(expr),
            Expr::Variable { id, name } => self.look_up_variable(*id, name),
            Expr::Assign { id, name, value } => self.evaluate_assign(*id, name, value),
            Expr::Logical { left, operator, right } => {
                let left = self.evaluate(left)?;

                let decided = if operator.token_type() == TokenType::Or {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            },
            Expr::Unary { operator, expr } => {
                let value = self.evaluate(expr)?;

                match (operator.token_type(), value) {
                    (TokenType::Not, value) => Ok(Value::Boolean(!value.is_truthy())),
                    (TokenType::Minus, Value::Number(value)) => Ok(Value::Number(-value)),
                    (TokenType::Minus, _) => Err(RuntimeError::new(operator, "Operand must be a number")),
                    _ => Err(RuntimeError::new(operator, format!("Unknown unary operator {}", operator))),
                }
            },
            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                Self::evaluate_binary(operator, left, right)
            },
            Expr::Call { callee, paren, args } => self.evaluate_call(callee, paren, args),
            Expr::Index { target, bracket, index } => {
                let target = self.evaluate(target)?;
                let index = self.evaluate(index)?;

                Self::evaluate_index(bracket, target, index)
            },
        }
    }

    fn evaluate_assign(&mut self, id: ExprId, name: &Token, value: &Expr) -> RuntimeResult<Value> {
        let value = self.evaluate(value)?;

        match self.locals.get(&id) {
            Some(distance) => Environment::assign_at(&self.environment, *distance, name, value.clone()),
            None => self.globals.borrow_mut().assign(name, value.clone())?,
        }

        Ok(value)
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, args: &[Expr]) -> RuntimeResult<Value> {
        let callee = self.evaluate(callee)?;
        let arguments = args.iter().map(|arg| self.evaluate(arg)).collect::<RuntimeResult<Vec<Value>>>()?;

        let function = match callee {
            Value::Function(function) => function,
            other => return Err(RuntimeError::new(paren, format!("Can only call functions, not {}", other.type_name()))),
        };

        if arguments.len() != function.arity() {
            return Err(RuntimeError::new(paren, format!("Expected {} argument(s) but got {}", function.arity(), arguments.len())));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::new(paren, "Stack overflow"));
        }

        self.call_depth += 1;
        let result = function.call(self, arguments);
        self.call_depth -= 1;

        result
    }

    fn evaluate_binary(operator: &Token, left: Value, right: Value) -> RuntimeResult<Value> {
        match operator.token_type() {
            TokenType::Equal => return Ok(Value::Boolean(left == right)),
            TokenType::NotEqual => return Ok(Value::Boolean(left != right)),
            TokenType::Plus => return match (left, right) {
                (Value::Number(left), Value::Number(right)) => Ok(Value::Number(left + right)),
                (Value::String(left), Value::String(right)) => Ok(Value::String(Rc::from(format!("{}{}", left, right)))),
                _ => Err(RuntimeError::new(operator, "Operands must be two numbers or two strings")),
            },
            _ => {},
        }

        let (left, right) = match (left, right) {
            (Value::Number(left), Value::Number(right)) => (left, right),
            _ => return Err(RuntimeError::new(operator, "Operands must be numbers")),
        };

        Ok(match operator.token_type() {
            TokenType::Minus => Value::Number(left - right),
            TokenType::Multiply => Value::Number(left * right),
            TokenType::Divide => Value::Number(left / right),
            TokenType::Greater => Value::Boolean(left > right),
            TokenType::GreaterEqual => Value::Boolean(left >= right),
            TokenType::Less => Value::Boolean(left < right),
            TokenType::LessEqual => Value::Boolean(left <= right),
            _ => return Err(RuntimeError::new(operator, format!("Unknown binary operator {}", operator))),
        })
    }

    fn evaluate_index(bracket: &Token, target: Value, index: Value) -> RuntimeResult<Value> {
        if let (Value::String(text), Value::Number(index)) = (&target, &index) {
            if index.fract() == 0.0 && *index >= 0.0 {
                if let Some(c) = text.chars().nth(*index as usize) {
                    return Ok(Value::String(Rc::from(c.to_string())));
                }
            }
        }

        Err(RuntimeError::new(bracket, "Invalid target for index expression"))
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> RuntimeResult<Value> {
        match self.locals.get(&id) {
            Some(distance) => Ok(Environment::get_at(&self.environment, *distance, name)),
            None => self.globals.borrow().get(name),
        }
    }
}
