//! Statement parsing.
//!
//! Statements are line-oriented: each ends at a `Newline`, and `if`/`else`
//! bodies are the indented blocks delimited by `Indent`/`Dedent` tokens.

use bumpalo::collections::Vec as BumpVec;
use pinegen_core::{ParseError, ParseErrorKind, Span};

use super::Program;
use super::expr::{Expr, Ident};
use super::ops::AssignOp;
use super::parser::Parser;
use super::stmt::*;
use crate::lexer::TokenKind;

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse a whole program, recovering at statement boundaries.
    pub fn parse_program(&mut self) -> Program<'ast> {
        let start = self.peek().span;
        let mut body = BumpVec::new_in(self.arena);

        self.skip_newlines();
        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(error) => {
                    self.record(error);
                    self.synchronize();
                    // A stray dedent left behind by an inconsistent indent.
                    self.eat(TokenKind::Dedent);
                }
            }
            self.skip_newlines();
        }

        let span = start.merge(self.previous_span());
        Program::new(body.into_bump_slice(), span)
    }

    /// Parse a single statement.
    pub fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        match self.peek().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::Var | TokenKind::Varip => {
                let start = self.advance().span;
                self.parse_declaration(DeclKind::Var, start)
            }
            TokenKind::Identifier if self.is_declaration_start() => {
                let start = self.peek().span;
                self.parse_declaration(DeclKind::Let, start)
            }
            TokenKind::Indent => Err(ParseError::new(
                ParseErrorKind::UnexpectedToken,
                self.peek().span,
                "unexpected indentation",
            )),
            _ => {
                let expr = self.parse_expr(0)?;
                self.end_statement()?;
                Ok(Stmt::Expr(ExprStmt {
                    expr,
                    span: expr.span(),
                }))
            }
        }
    }

    /// Whether the upcoming tokens form `[type] name <assign-op>`.
    fn is_declaration_start(&self) -> bool {
        let name_at = if TypeHint::from_name(self.peek().lexeme).is_some()
            && self.peek_nth(1).kind == TokenKind::Identifier
        {
            1
        } else {
            0
        };
        let op = self.peek_nth(name_at + 1).kind;
        op == TokenKind::Assign || op == TokenKind::ColonAssign || AssignOp::from_token(op).is_some()
    }

    /// Parse `[type] name = expr`, `name := expr` or `name op= expr`.
    fn parse_declaration(&mut self, kind: DeclKind, start: Span) -> Result<Stmt<'ast>, ParseError> {
        let type_hint = match TypeHint::from_name(self.peek().lexeme) {
            Some(hint)
                if self.check(TokenKind::Identifier)
                    && self.peek_nth(1).kind == TokenKind::Identifier =>
            {
                self.advance();
                Some(hint)
            }
            _ => None,
        };

        if !self.check(TokenKind::Identifier) {
            return Err(self.unexpected(ParseErrorKind::ExpectedIdentifier, "variable name"));
        }
        let name_token = self.advance();
        let id = Ident::new(self.alloc_str(name_token.lexeme), name_token.span);

        let op_token = self.advance();
        let (kind, compound) = match op_token.kind {
            TokenKind::Assign => (kind, None),
            TokenKind::ColonAssign if kind == DeclKind::Var => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidAssignmentTarget,
                    op_token.span,
                    format!("'var {}' must be declared with '='", id.name),
                ));
            }
            TokenKind::ColonAssign => (DeclKind::Reassign, None),
            other => match AssignOp::from_token(other) {
                Some(op) if kind != DeclKind::Var => (DeclKind::Reassign, Some(op)),
                _ => {
                    return Err(ParseError::expected_token(
                        op_token.span,
                        "'=' or ':='",
                        other.description(),
                    ));
                }
            },
        };

        let value = self.parse_expr(0)?;
        self.end_statement()?;

        // `x += e` is `x := x + e`.
        let init = match compound {
            Some(op) => {
                let target = self.arena.alloc(Expr::Ident(id));
                self.make_binary(target, op.binary_op(), value)
            }
            None => value,
        };

        let span = start.merge(value.span());
        let declarators = self.arena.alloc_slice_copy(&[Declarator {
            id,
            type_hint,
            init: Some(init),
            span,
        }]);
        Ok(Stmt::VarDecl(self.arena.alloc(VarDeclStmt {
            kind,
            declarators,
            span,
        })))
    }

    /// Parse `if test` + block, with optional `else` / `else if`.
    fn parse_if(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        let test = self.parse_expr(0)?;
        let consequent = self.parse_block()?;

        let alternate: &'ast [Stmt<'ast>] = if self.eat(TokenKind::Else).is_some() {
            if self.check(TokenKind::If) {
                let nested = self.parse_if()?;
                self.arena.alloc_slice_copy(&[nested])
            } else {
                self.parse_block()?
            }
        } else {
            &[]
        };

        let span = start.merge(test.span());
        Ok(Stmt::If(self.arena.alloc(IfStmt {
            test,
            consequent,
            alternate,
            span,
        })))
    }

    /// Parse `Newline Indent stmt* Dedent`.
    fn parse_block(&mut self) -> Result<&'ast [Stmt<'ast>], ParseError> {
        if self.eat(TokenKind::Newline).is_none() || !self.check(TokenKind::Indent) {
            return Err(self.unexpected(ParseErrorKind::ExpectedBlock, "indented block"));
        }
        self.advance();

        let mut body = BumpVec::new_in(self.arena);
        loop {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) || self.is_at_end() {
                break;
            }
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(error) => {
                    self.record(error);
                    self.synchronize();
                }
            }
        }
        self.eat(TokenKind::Dedent);

        Ok(body.into_bump_slice())
    }

    /// A statement ends at a newline, or where its enclosing block closes.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        if self.eat(TokenKind::Newline).is_some()
            || self.check(TokenKind::Dedent)
            || self.is_at_end()
        {
            Ok(())
        } else {
            let token = *self.peek();
            Err(ParseError::unexpected_token(token.span, token.kind.description()))
        }
    }
}
