// File: src/parser.rs
//
// Recursive descent parser for Ruff candidate scripts.
// Transforms a sequence of tokens into an Abstract Syntax Tree (AST).
//
// Supports:
// - Variable declarations (let, mut) and `:=` assignment to names or indexes
// - Function definitions
// - Control flow (if/else, while, loop, for, break, continue, try/except)
// - Expressions with operator precedence:
//   || < && < comparison < additive < multiplicative < unary < call/index < primary
//
// Unlike a REPL-friendly parser, every malformed construct is an error: a
// candidate that does not parse must be rejected before it is ever timed.

use crate::ast::{Expr, FuncDef, Stmt};
use crate::errors::{AnalysisError, SourceLocation};
use crate::lexer::{Token, TokenKind};
use std::sync::Arc;

type ParseResult<T> = Result<T, AnalysisError>;

/// Parser maintains position in token stream and provides methods to parse statements and expressions
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Creates a new parser from a vector of tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it
    fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn peek_is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Keyword(k) if k == keyword)
    }

    fn peek_is_punct(&self, c: char) -> bool {
        matches!(self.peek(), TokenKind::Punctuation(p) if *p == c)
    }

    fn peek_is_operator(&self, op: &str) -> bool {
        matches!(self.peek(), TokenKind::Operator(o) if o == op)
    }

    /// Location of the current token
    fn location(&self) -> SourceLocation {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(Token::location)
            .unwrap_or_else(SourceLocation::unknown)
    }

    /// Consume and return the current token, then advance to the next
    fn advance(&mut self) -> TokenKind {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&self, expected: &str) -> AnalysisError {
        let found = match self.peek() {
            TokenKind::Identifier(name) => format!("identifier '{}'", name),
            TokenKind::Int(n) => format!("number {}", n),
            TokenKind::Float(n) => format!("number {}", n),
            TokenKind::String(_) => "string literal".to_string(),
            TokenKind::Bool(b) => format!("'{}'", b),
            TokenKind::Operator(op) => format!("'{}'", op),
            TokenKind::Punctuation(c) => format!("'{}'", c),
            TokenKind::Keyword(k) => format!("keyword '{}'", k),
            TokenKind::Eof => "end of input".to_string(),
        };
        AnalysisError::parse_error(format!("Expected {}, found {}", expected, found), self.location())
    }

    fn expect_punct(&mut self, c: char) -> ParseResult<()> {
        if self.peek_is_punct(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", c)))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<String> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn skip_semicolons(&mut self) {
        while self.peek_is_punct(';') {
            self.advance();
        }
    }

    /// Parse the entire token stream into a vector of statements
    pub fn parse(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = Vec::new();
        self.skip_semicolons();
        while !matches!(self.peek(), TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
            self.skip_semicolons();
        }
        Ok(stmts)
    }

    /// Parse `{ stmt* }`
    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        self.expect_punct('{')?;
        let mut body = Vec::new();
        self.skip_semicolons();
        while !self.peek_is_punct('}') {
            if matches!(self.peek(), TokenKind::Eof) {
                return Err(self.unexpected("'}'"));
            }
            body.push(self.parse_stmt()?);
            self.skip_semicolons();
        }
        self.advance(); // }
        Ok(body)
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        match self.peek() {
            TokenKind::Keyword(k) if k == "let" || k == "mut" => self.parse_let(),
            TokenKind::Keyword(k) if k == "func" => self.parse_func(),
            TokenKind::Keyword(k) if k == "return" => {
                self.advance();
                let expr = if self.peek_is_punct(';')
                    || self.peek_is_punct('}')
                    || matches!(self.peek(), TokenKind::Eof)
                {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(Stmt::Return(expr))
            }
            TokenKind::Keyword(k) if k == "if" => self.parse_if(),
            TokenKind::Keyword(k) if k == "while" => {
                self.advance();
                let condition = self.parse_expr()?;
                let body = self.parse_block()?;
                Ok(Stmt::While { condition, body })
            }
            TokenKind::Keyword(k) if k == "loop" => self.parse_loop(),
            TokenKind::Keyword(k) if k == "for" => self.parse_for(),
            TokenKind::Keyword(k) if k == "try" => self.parse_try_except(),
            TokenKind::Keyword(k) if k == "break" => {
                self.advance();
                Ok(Stmt::Break)
            }
            TokenKind::Keyword(k) if k == "continue" => {
                self.advance();
                Ok(Stmt::Continue)
            }
            _ => {
                let location = self.location();
                let expr = self.parse_expr()?;
                if self.peek_is_operator(":=") {
                    self.advance(); // :=
                    if !matches!(expr, Expr::Identifier(..) | Expr::IndexAccess { .. }) {
                        return Err(AnalysisError::parse_error(
                            "Invalid assignment target",
                            location,
                        )
                        .with_help("only variables and indexed elements can be assigned"));
                    }
                    let value = self.parse_expr()?;
                    Ok(Stmt::Assign { target: expr, value })
                } else {
                    Ok(Stmt::ExprStmt(expr))
                }
            }
        }
    }

    fn parse_let(&mut self) -> ParseResult<Stmt> {
        let mutable = self.peek_is_keyword("mut");
        self.advance(); // let | mut
        let name = self.expect_identifier("variable name")?;
        if !self.peek_is_operator(":=") {
            return Err(self.unexpected("':='"));
        }
        self.advance(); // :=
        let value = self.parse_expr()?;
        Ok(Stmt::Let { name, value, mutable })
    }

    fn parse_func(&mut self) -> ParseResult<Stmt> {
        let location = self.location();
        self.advance(); // func
        let name = self.expect_identifier("function name")?;
        self.expect_punct('(')?;
        let mut params = Vec::new();
        while !self.peek_is_punct(')') {
            params.push(self.expect_identifier("parameter name")?);
            if self.peek_is_punct(',') {
                self.advance();
            } else {
                break;
            }
        }
        self.expect_punct(')')?;
        let body = self.parse_block()?;
        Ok(Stmt::FuncDef(Arc::new(FuncDef { name, params, body, location })))
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        self.advance(); // if
        let condition = self.parse_expr()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.peek_is_keyword("else") {
            self.advance(); // else
            if self.peek_is_keyword("if") {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn parse_loop(&mut self) -> ParseResult<Stmt> {
        self.advance(); // loop
        let condition = if self.peek_is_keyword("while") {
            self.advance(); // while
            Some(self.parse_expr()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(Stmt::Loop { condition, body })
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        self.advance(); // for
        let var = self.expect_identifier("loop variable")?;
        if !self.peek_is_keyword("in") {
            return Err(self.unexpected("'in'"));
        }
        self.advance(); // in
        let iterable = self.parse_expr()?;
        let body = self.parse_block()?;
        Ok(Stmt::For { var, iterable, body })
    }

    fn parse_try_except(&mut self) -> ParseResult<Stmt> {
        self.advance(); // try
        let try_block = self.parse_block()?;
        if !self.peek_is_keyword("except") {
            return Err(self.unexpected("'except'"));
        }
        self.advance(); // except
        let except_var = self.expect_identifier("error variable")?;
        let except_block = self.parse_block()?;
        Ok(Stmt::TryExcept { try_block, except_var, except_block })
    }

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    /// Shared loop for left-associative binary levels
    fn parse_binary_level(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut left = next(self)?;

        while let TokenKind::Operator(op) = self.peek() {
            if !ops.contains(&op.as_str()) {
                break;
            }
            let location = self.location();
            let op = op.clone();
            self.advance();
            let right = next(self)?;
            left = Expr::BinaryOp { left: Box::new(left), op, right: Box::new(right), location };
        }

        Ok(left)
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&["||"], Self::parse_and)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&["&&"], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&["==", "!=", "<", ">", "<=", ">="], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(&["*", "/", "%"], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = if self.peek_is_operator("-") {
            "-"
        } else if self.peek_is_operator("!") {
            "!"
        } else {
            return self.parse_call();
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::UnaryOp { op: op.to_string(), operand: Box::new(operand) })
    }

    fn parse_call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.peek_is_punct('(') {
                let callee = match &expr {
                    Expr::Identifier(name, _) => name.clone(),
                    _ => {
                        return Err(AnalysisError::parse_error(
                            "Only named functions can be called",
                            self.location(),
                        ))
                    }
                };
                let location = match &expr {
                    Expr::Identifier(_, loc) => loc.clone(),
                    _ => self.location(),
                };
                self.advance(); // (
                let args = self.parse_expr_list(')')?;
                expr = Expr::Call { callee, args, location };
            } else if self.peek_is_punct('[') {
                let location = self.location();
                self.advance(); // [
                let index = self.parse_expr()?;
                self.expect_punct(']')?;
                expr = Expr::IndexAccess {
                    object: Box::new(expr),
                    index: Box::new(index),
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Comma-separated expressions up to and including `close`
    fn parse_expr_list(&mut self, close: char) -> ParseResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.peek_is_punct(close) {
            items.push(self.parse_expr()?);
            if self.peek_is_punct(',') {
                self.advance();
            } else {
                break;
            }
        }
        self.expect_punct(close)?;
        Ok(items)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let location = self.location();
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expr::Identifier(name, location))
            }
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::Int(n))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Float(n))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            TokenKind::Bool(b) => {
                self.advance();
                Ok(Expr::Bool(b))
            }
            TokenKind::Keyword(k) if k == "null" => {
                self.advance();
                Ok(Expr::Null)
            }
            TokenKind::Punctuation('(') => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_punct(')')?;
                Ok(expr)
            }
            TokenKind::Punctuation('[') => {
                self.advance();
                Ok(Expr::ArrayLiteral(self.parse_expr_list(']')?))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}

/// Convenience: tokenize and parse a full program
pub fn parse_program(source: &str) -> ParseResult<Vec<Stmt>> {
    let tokens = crate::lexer::tokenize(source)?;
    Parser::new(tokens).parse()
}
