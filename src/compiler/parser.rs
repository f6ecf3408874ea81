use std::rc::Rc;
use crate::compiler::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::compiler::diagnostics::Diagnostics;
use crate::compiler::lexer::{Literal, Token, TokenPos, TokenType};
use crate::util;

#[cfg(test)]
mod tests;

const MAX_ARGUMENTS: usize = 255;

pub struct Parser<'d> {
    tokens: Vec<Token>,
    current: usize,
    // Number of enclosing blocks, including function bodies
    block_depth: usize,

    diagnostics: &'d mut dyn Diagnostics,

    had_error: bool,
    panic_mode: bool,
}

impl<'d> Parser<'d> {
    /// `tokens` is normally the output of
    /// [`Lexer::scan_tokens`](crate::compiler::lexer::Lexer::scan_tokens). A missing trailing
    /// [`TokenType::Eof`] token is added.
    pub fn new(mut tokens: Vec<Token>, diagnostics: &'d mut dyn Diagnostics) -> Parser<'d> {
        if tokens.last().map(Token::token_type) != Some(TokenType::Eof) {
            let offset = tokens.last().map(|token| token.offset() + token.source().len()).unwrap_or(0);
            tokens.push(Token::new(TokenType::Eof, String::new(), None, offset, TokenPos::begin()));
        }

        Parser {
            tokens,
            current: 0,
            block_depth: 0,
            diagnostics,
            had_error: false, panic_mode: false,
        }
    }

    // Declaration parsing

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_eof() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }

        tracing::debug!(count = statements.len(), had_error = self.had_error, "parsed statements");
        statements
    }

    /// Returns `None` if the declaration contained a syntax error. The parser is then
    /// synchronized to the start of the next statement.
    fn parse_declaration(&mut self) -> Option<Stmt> {
        util::ensure_sufficient_stack(|| self.parse_declaration_or_recover())
    }

    fn parse_declaration_or_recover(&mut self) -> Option<Stmt> {
        let stmt = if self.matches(TokenType::Var) {
            self.parse_var_declaration()
        } else if self.matches(TokenType::Fun) {
            Stmt::Function(Rc::new(self.parse_function_declaration()))
        } else {
            self.parse_statement()
        };

        if self.panic_mode {
            self.synchronize();
            return None;
        }

        Some(stmt)
    }

    fn parse_var_declaration(&mut self) -> Stmt {
        self.expect(TokenType::Identifier, "Expected variable name after 'var'");
        let name = self.previous().clone();

        let initializer = if self.matches(TokenType::Assign) {
            Some(self.parse_expression())
        } else {
            None
        };

        self.expect(TokenType::Semicolon, "Expected ';' after variable declaration");
        Stmt::Var { name, initializer }
    }

    fn parse_function_declaration(&mut self) -> FunctionDecl {
        self.expect(TokenType::Identifier, "Expected function name after 'fun'");
        let name = self.previous().clone();

        self.expect(TokenType::ParenthesisLeft, "Expected '(' after function name");
        let mut params = vec![];

        if !self.check(TokenType::ParenthesisRight) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    self.error_at_current("Can't have more than 255 parameters", false);
                }

                self.expect(TokenType::Identifier, "Expected parameter name");
                params.push(self.previous().clone());

                if !self.matches(TokenType::Comma) {
                    break;
                }
            }
        }

        self.expect(TokenType::ParenthesisRight, "Expected ')' after parameters");
        self.expect(TokenType::BracketLeft, "Expected '{' before function body");

        let body = self.parse_block();
        FunctionDecl { name, params, body }
    }

    // Statement parsing

    fn parse_statement(&mut self) -> Stmt {
        util::ensure_sufficient_stack(|| self.parse_any_statement())
    }

    fn parse_any_statement(&mut self) -> Stmt {
        if self.matches(TokenType::Print) {
            self.parse_print_statement()
        } else if self.matches(TokenType::Return) {
            self.parse_return_statement()
        } else if self.matches(TokenType::If) {
            self.parse_if_statement()
        } else if self.matches(TokenType::While) {
            self.parse_while_statement()
        } else if self.matches(TokenType::For) {
            self.parse_for_statement()
        } else if self.matches(TokenType::BracketLeft) {
            Stmt::Block(self.parse_block())
        } else {
            self.parse_expression_statement()
        }
    }

    fn parse_print_statement(&mut self) -> Stmt {
        let expr = self.parse_expression();
        self.expect(TokenType::Semicolon, "Expected ';' after value");

        Stmt::Print(expr)
    }

    fn parse_return_statement(&mut self) -> Stmt {
        let keyword = self.previous().clone();

        let value = if !self.check(TokenType::Semicolon) {
            Some(self.parse_expression())
        } else {
            None
        };

        self.expect(TokenType::Semicolon, "Expected ';' after return value");
        Stmt::Return { keyword, value }
    }

    fn parse_if_statement(&mut self) -> Stmt {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'if'");
        let condition = self.parse_expression();
        self.expect(TokenType::ParenthesisRight, "Expected ')' after 'if' condition");

        let then = Box::new(self.parse_statement());
        let otherwise = if self.matches(TokenType::Else) {
            Some(Box::new(self.parse_statement()))
        } else {
            None
        };

        Stmt::If { condition, then, otherwise }
    }

    fn parse_while_statement(&mut self) -> Stmt {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'while'");
        let condition = self.parse_expression();
        self.expect(TokenType::ParenthesisRight, "Expected ')' after 'while' condition");

        let body = Box::new(self.parse_statement());
        Stmt::While { condition, body }
    }

    // There is no for node; the loop is rewritten into a while loop wrapped in blocks
    fn parse_for_statement(&mut self) -> Stmt {
        self.expect(TokenType::ParenthesisLeft, "Expected '(' after 'for'");

        let initializer = if self.matches(TokenType::Semicolon) {
            None
        } else if self.matches(TokenType::Var) {
            Some(self.parse_var_declaration())
        } else {
            Some(self.parse_expression_statement())
        };

        let condition = if !self.check(TokenType::Semicolon) {
            self.parse_expression()
        } else {
            Expr::Literal(LiteralValue::Boolean(true))
        };
        self.expect(TokenType::Semicolon, "Expected ';' after loop condition");

        let increment = if !self.check(TokenType::ParenthesisRight) {
            Some(self.parse_expression())
        } else {
            None
        };
        self.expect(TokenType::ParenthesisRight, "Expected ')' after for clauses");

        let mut body = self.parse_statement();

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While { condition, body: Box::new(body) };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        body
    }

    // Expects the '{' to be consumed already
    fn parse_block(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        self.block_depth += 1;

        while !self.check(TokenType::BracketRight) && !self.is_eof() {
            if let Some(stmt) = self.parse_declaration() {
                statements.push(stmt);
            }
        }

        self.block_depth -= 1;
        self.expect(TokenType::BracketRight, "Expected '}' after block");
        statements
    }

    fn parse_expression_statement(&mut self) -> Stmt {
        let expr = self.parse_expression();
        self.expect(TokenType::Semicolon, "Expected ';' after expression");

        Stmt::Expression(expr)
    }

    // Expression parsing

    fn parse_expression(&mut self) -> Expr {
        util::ensure_sufficient_stack(|| self.parse_assignment())
    }

    fn parse_assignment(&mut self) -> Expr {
        let expr = self.parse_or();

        if self.matches(TokenType::Assign) {
            let equals = self.previous().clone();
            let value = self.parse_assignment();

            return match expr {
                Expr::Variable { name, .. } => Expr::Assign { id: ExprId::next(), name, value: Box::new(value) },
                expr => {
                    self.error_at(&equals, "Invalid assignment target", false);
                    expr
                },
            };
        }

        expr
    }

    fn parse_or(&mut self) -> Expr {
        let mut expr = self.parse_and();

        while self.matches(TokenType::Or) {
            let operator = self.previous().clone();
            let right = self.parse_and();

            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        expr
    }

    fn parse_and(&mut self) -> Expr {
        let mut expr = self.parse_equality();

        while self.matches(TokenType::And) {
            let operator = self.previous().clone();
            let right = self.parse_equality();

            expr = Expr::Logical { left: Box::new(expr), operator, right: Box::new(right) };
        }

        expr
    }

    fn parse_equality(&mut self) -> Expr {
        let mut expr = self.parse_comparison();

        while self.matches_any(&[TokenType::Equal, TokenType::NotEqual]) {
            let operator = self.previous().clone();
            let right = self.parse_comparison();

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        expr
    }

    fn parse_comparison(&mut self) -> Expr {
        let mut expr = self.parse_term();

        while self.matches_any(&[TokenType::Less, TokenType::LessEqual, TokenType::Greater, TokenType::GreaterEqual]) {
            let operator = self.previous().clone();
            let right = self.parse_term();

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        expr
    }

    fn parse_term(&mut self) -> Expr {
        let mut expr = self.parse_factor();

        while self.matches_any(&[TokenType::Plus, TokenType::Minus]) {
            let operator = self.previous().clone();
            let right = self.parse_factor();

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        expr
    }

    fn parse_factor(&mut self) -> Expr {
        let mut expr = self.parse_unary();

        while self.matches_any(&[TokenType::Multiply, TokenType::Divide]) {
            let operator = self.previous().clone();
            let right = self.parse_unary();

            expr = Expr::Binary { left: Box::new(expr), operator, right: Box::new(right) };
        }

        expr
    }

    fn parse_unary(&mut self) -> Expr {
        if self.matches_any(&[TokenType::Minus, TokenType::Not]) {
            let operator = self.previous().clone();
            let right = util::ensure_sufficient_stack(|| self.parse_unary());

            return Expr::Unary { operator, expr: Box::new(right) };
        }

        self.parse_call()
    }

    fn parse_call(&mut self) -> Expr {
        let mut expr = self.parse_primary();

        loop {
            if self.matches(TokenType::ParenthesisLeft) {
                expr = self.finish_call(expr);
            } else if self.matches(TokenType::SquareBracketLeft) {
                let bracket = self.previous().clone();

                let index = self.parse_expression();
                self.expect(TokenType::SquareBracketRight, "Expected ']' after index expression");

                expr = Expr::Index { target: Box::new(expr), bracket, index: Box::new(index) };
            } else {
                break;
            }
        }

        expr
    }

    fn finish_call(&mut self, callee: Expr) -> Expr {
        let mut arguments = vec![];

        if !self.check(TokenType::ParenthesisRight) {
            arguments.push(self.parse_expression());

            while self.matches(TokenType::Comma) {
                if arguments.len() >= MAX_ARGUMENTS {
                    self.error_at_current("Can't have more than 255 function call arguments", false);
                }

                arguments.push(self.parse_expression());
            }
        }

        self.expect(TokenType::ParenthesisRight, "Expected ')' after function call arguments");
        let paren = self.previous().clone();

        Expr::Call { callee: Box::new(callee), paren, args: arguments }
    }

    fn parse_primary(&mut self) -> Expr {
        if self.matches(TokenType::False) {
            return Expr::Literal(LiteralValue::Boolean(false));
        } else if self.matches(TokenType::True) {
            return Expr::Literal(LiteralValue::Boolean(true));
        } else if self.matches(TokenType::Nil) {
            return Expr::Literal(LiteralValue::Nil);
        } else if self.matches_any(&[TokenType::Number, TokenType::String]) {
            return match self.previous().literal() {
                Some(Literal::Number(value)) => Expr::Literal(LiteralValue::Number(*value)),
                Some(Literal::String(value)) => Expr::Literal(LiteralValue::String(Rc::from(value.as_str()))),
                None => {
                    self.error("Malformed literal", true);
                    Expr::Literal(LiteralValue::Nil)
                },
            };
        } else if self.matches(TokenType::Identifier) {
            return Expr::Variable { id: ExprId::next(), name: self.previous().clone() };
        } else if self.matches(TokenType::ParenthesisLeft) {
            let expr = self.parse_expression();
            self.expect(TokenType::ParenthesisRight, "Expected ')' after expression");

            return Expr::Grouping(Box::new(expr));
        }

        if self.is_eof() {
            self.error_at_current("Expected expression", true);
        } else {
            // Always make progress, so that recovery can't get stuck on this token
            self.consume();
            self.error("Expected expression", true);
        }

        // Never executed, the enclosing declaration is dropped
        Expr::Literal(LiteralValue::Nil)
    }

    fn consume(&mut self) {
        if !self.is_eof() {
            self.current += 1;
        }
    }

    fn expect(&mut self, token_type: TokenType, message: &str) {
        if self.check(token_type) {
            self.consume();
            return;
        }

        self.error_at_current(message, true);
    }

    fn matches(&mut self, token_type: TokenType) -> bool { // Should be called "match", but that's a keyword
        if !self.check(token_type) {
            return false;
        }

        self.consume();
        true
    }

    fn matches_any(&mut self, token_types: &[TokenType]) -> bool {
        for token_type in token_types {
            if self.check(*token_type) {
                self.consume();
                return true;
            }
        }

        false
    }

    #[inline]
    fn check(&self, token_type: TokenType) -> bool {
        self.peek().token_type() == token_type
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn is_eof(&self) -> bool {
        self.peek().token_type() == TokenType::Eof
    }

    // Error handling

    fn synchronize(&mut self) {
        self.panic_mode = false;

        while !self.is_eof() {
            if self.current > 0 && self.previous().token_type() == TokenType::Semicolon {
                return;
            }

            // The enclosing block closes itself
            if self.block_depth > 0 && self.check(TokenType::BracketRight) {
                return;
            }

            match self.peek().token_type() {
                TokenType::Fun | TokenType::Var
                | TokenType::For | TokenType::If | TokenType::While
                | TokenType::Print | TokenType::Return => return,
                _ => {},
            }

            self.consume();
        }
    }

    fn error_at_current(&mut self, message: &str, panic: bool) {
        let token = &self.tokens[self.current];
        Self::error_at_impl(&mut *self.diagnostics, &mut self.had_error, &mut self.panic_mode, token, message, panic);
    }

    fn error(&mut self, message: &str, panic: bool) {
        let token = &self.tokens[self.current.saturating_sub(1)];
        Self::error_at_impl(&mut *self.diagnostics, &mut self.had_error, &mut self.panic_mode, token, message, panic);
    }

    fn error_at(&mut self, token: &Token, message: &str, panic: bool) {
        Self::error_at_impl(&mut *self.diagnostics, &mut self.had_error, &mut self.panic_mode, token, message, panic);
    }

    fn error_at_impl(diagnostics: &mut dyn Diagnostics, had_error: &mut bool, panic_mode: &mut bool, token: &Token, message: &str, panic: bool) {
        if *panic_mode {
            return;
        } else if panic {
            *panic_mode = true;
        }

        diagnostics.report_at(token, message);
        *had_error = true;
    }
}
