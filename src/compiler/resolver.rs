use std::collections::HashMap;
use thiserror::Error;
use crate::compiler::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::compiler::diagnostics::Diagnostics;
use crate::compiler::lexer::Token;
use crate::util;


#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl ResolveError {
    fn new(token: &Token, message: impl Into<String>) -> ResolveError {
        ResolveError { token: token.clone(), message: message.into() }
    }
}

type ResolveResult = Result<(), ResolveError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

/// Static pass between parsing and execution. Computes how many frames up each local
/// variable lives, and rejects programs that break the scoping rules.
pub struct Resolver<'d> {
    // false while the name's initializer is being resolved
    scopes: Vec<HashMap<String, bool>>,
    locals: HashMap<ExprId, usize>,
    current_function: FunctionType,

    diagnostics: &'d mut dyn Diagnostics,
    had_error: bool,
}

impl<'d> Resolver<'d> {
    pub fn new(diagnostics: &'d mut dyn Diagnostics) -> Resolver<'d> {
        Resolver {
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionType::None,
            diagnostics,
            had_error: false,
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn into_locals(self) -> HashMap<ExprId, usize> {
        self.locals
    }

    /// Resolves one batch of statements. The first error is reported and ends the batch.
    pub fn resolve(&mut self, statements: &[Stmt]) {
        if let Err(err) = self.resolve_statements(statements) {
            self.diagnostics.report_at(&err.token, &err.message);
            self.had_error = true;

            // A failed batch may leave scopes behind
            self.scopes.clear();
            self.current_function = FunctionType::None;
        }

        tracing::debug!(locals = self.locals.len(), had_error = self.had_error, "resolved statements");
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) -> ResolveResult {
        statements.iter().try_for_each(|stmt| self.resolve_statement(stmt))
    }

    fn resolve_statement(&mut self, stmt: &Stmt) -> ResolveResult {
        util::ensure_sufficient_stack(|| self.resolve_any_statement(stmt))
    }

    fn resolve_any_statement(&mut self, stmt: &Stmt) -> ResolveResult {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Var { name, initializer } => {
                self.declare(name)?;

                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer)?;
                }

                self.define(name);
                Ok(())
            },
            Stmt::Block(statements) => {
                self.begin_scope();
                let result = self.resolve_statements(statements);
                self.end_scope();

                result
            },
            Stmt::If { condition, then, otherwise } => {
                self.resolve_expr(condition)?;
                self.resolve_statement(then)?;

                match otherwise {
                    Some(otherwise) => self.resolve_statement(otherwise),
                    None => Ok(()),
                }
            },
            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_statement(body)
            },
            Stmt::Function(function) => {
                // Defined before the body, so the function can call itself
                self.declare(&function.name)?;
                self.define(&function.name);

                self.resolve_function(function, FunctionType::Function)
            },
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    return Err(ResolveError::new(keyword, "Can't return from top-level code"));
                }

                match value {
                    Some(value) => self.resolve_expr(value),
                    None => Ok(()),
                }
            },
        }
    }

    fn resolve_function(&mut self, function: &FunctionDecl, function_type: FunctionType) -> ResolveResult {
        let enclosing_function = self.current_function;
        self.current_function = function_type;
        self.begin_scope();

        let result = self.declare_params(&function.params)
            .and_then(|_| self.resolve_statements(&function.body));

        self.end_scope();
        self.current_function = enclosing_function;
        result
    }

    fn declare_params(&mut self, params: &[Token]) -> ResolveResult {
        for param in params {
            self.declare(param)?;
            self.define(param);
        }

        Ok(())
    }

    fn resolve_expr(&mut self, expr: &Expr) -> ResolveResult {
        util::ensure_sufficient_stack(|| self.resolve_any_expr(expr))
    }

    fn resolve_any_expr(&mut self, expr: &Expr) -> ResolveResult {
        match expr {
            Expr::Literal(_) => Ok(()),
            Expr::Variable { id, name } => {
                if let Some(false) = self.scopes.last().and_then(|scope| scope.get(name.source())) {
                    return Err(ResolveError::new(name, "Can't read local variable in its own initializer"));
                }

                self.resolve_local(*id, name);
                Ok(())
            },
            Expr::Assign { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
                Ok(())
            },
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            },
            Expr::Unary { expr, .. } | Expr::Grouping(expr) => self.resolve_expr(expr),
            Expr::Call { callee, args, .. } => {
                self.resolve_expr(callee)?;
                args.iter().try_for_each(|arg| self.resolve_expr(arg))
            },
            Expr::Index { target, index, .. } => {
                self.resolve_expr(target)?;
                self.resolve_expr(index)
            },
        }
    }

    // Names not found in any scope are left to the global frame
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        if let Some(distance) = self.scopes.iter().rev().position(|scope| scope.contains_key(name.source())) {
            self.locals.insert(id, distance);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) -> ResolveResult {
        let scope = match self.scopes.last_mut() {
            Some(scope) => scope,
            None => return Ok(()),
        };

        if scope.contains_key(name.source()) {
            return Err(ResolveError::new(name, format!("Already a variable called '{}' in this scope", name.source())));
        }

        scope.insert(name.source().to_owned(), false);
        Ok(())
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.source().to_owned(), true);
        }
    }
}
