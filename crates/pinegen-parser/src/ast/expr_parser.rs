//! Expression parsing using Pratt parsing (precedence climbing).
//!
//! This module implements expression parsing with proper operator precedence
//! and associativity using the Pratt parsing algorithm.

use bumpalo::collections::Vec as BumpVec;
use pinegen_core::{ParseError, ParseErrorKind, Span};

use super::expr::*;
use super::ops::{BinaryOp, LogicalOp, POSTFIX_BP, TERNARY_BP, UnaryOp};
use super::parser::Parser;
use crate::lexer::TokenKind;

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Parse an expression with a minimum binding power.
    ///
    /// This is the core of the Pratt parser. It handles operator precedence
    /// by only consuming operators with sufficient binding power.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let kind = self.peek().kind;

            // Postfix: member access, call, subscript
            if matches!(
                kind,
                TokenKind::Dot | TokenKind::LeftParen | TokenKind::LeftBracket
            ) {
                if POSTFIX_BP < min_bp {
                    break;
                }
                lhs = match kind {
                    TokenKind::Dot => self.parse_member_access(lhs)?,
                    TokenKind::LeftParen => self.parse_call(lhs)?,
                    _ => self.parse_index(lhs)?,
                };
                continue;
            }

            if kind == TokenKind::Question {
                if TERNARY_BP < min_bp {
                    break;
                }
                lhs = self.parse_ternary(lhs)?;
                continue;
            }

            if let Some(op) = LogicalOp::from_token(kind) {
                let (l_bp, r_bp) = op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr(r_bp)?;
                let span = lhs.span().merge(rhs.span());
                lhs = self.arena.alloc(Expr::Logical(self.arena.alloc(LogicalExpr {
                    left: lhs,
                    op,
                    right: rhs,
                    span,
                })));
                continue;
            }

            if let Some(op) = BinaryOp::from_token(kind) {
                let (l_bp, r_bp) = op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let rhs = self.parse_expr(r_bp)?;
                lhs = self.make_binary(lhs, op, rhs);
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    /// Allocate a binary expression spanning both operands.
    pub(super) fn make_binary(
        &self,
        left: &'ast Expr<'ast>,
        op: BinaryOp,
        right: &'ast Expr<'ast>,
    ) -> &'ast Expr<'ast> {
        let span = left.span().merge(right.span());
        self.arena.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
            left,
            op,
            right,
            span,
        })))
    }

    /// Parse a prefix expression (the start of an expression).
    fn parse_prefix(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = *self.peek();

        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value: f64 = token.lexeme.parse().map_err(|_| {
                    ParseError::new(
                        ParseErrorKind::InvalidNumber,
                        token.span,
                        format!("invalid number '{}'", token.lexeme),
                    )
                })?;
                Ok(self.literal(LiteralKind::Number(value), token.span))
            }

            TokenKind::String => {
                self.advance();
                let contents = unescape(token.lexeme);
                let value = self.alloc_str(&contents);
                Ok(self.literal(LiteralKind::String(value), token.span))
            }

            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(self.literal(LiteralKind::Bool(token.kind == TokenKind::True), token.span))
            }

            TokenKind::Identifier => {
                self.advance();
                let name = self.alloc_str(token.lexeme);
                Ok(self.arena.alloc(Expr::Ident(Ident::new(name, token.span))))
            }

            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }

            TokenKind::Minus | TokenKind::Plus | TokenKind::Not => {
                self.advance();
                let op = match token.kind {
                    TokenKind::Minus => UnaryOp::Neg,
                    TokenKind::Plus => UnaryOp::Plus,
                    _ => UnaryOp::Not,
                };
                let argument = self.parse_expr(op.binding_power())?;
                let span = token.span.merge(argument.span());

                // Fold negative numeric literals so periods and offsets stay literals.
                if op == UnaryOp::Neg
                    && let Some(n) = argument.as_number()
                {
                    return Ok(self.literal(LiteralKind::Number(-n), span));
                }

                Ok(self.arena.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
                    op,
                    argument,
                    span,
                }))))
            }

            TokenKind::Error => {
                self.advance();
                Err(ParseError::new(
                    ParseErrorKind::UnexpectedChar,
                    token.span,
                    format!("unexpected '{}'", token.lexeme),
                ))
            }

            _ => Err(self.unexpected(ParseErrorKind::ExpectedExpression, "expression")),
        }
    }

    fn literal(&self, kind: LiteralKind<'ast>, span: Span) -> &'ast Expr<'ast> {
        self.arena.alloc(Expr::Literal(LiteralExpr { kind, span }))
    }

    /// Parse member access: `object.field`.
    fn parse_member_access(
        &mut self,
        object: &'ast Expr<'ast>,
    ) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::Dot)?;
        if !self.check(TokenKind::Identifier) {
            return Err(self.unexpected(ParseErrorKind::ExpectedIdentifier, "member name"));
        }
        let token = self.advance();
        let field = Ident::new(self.alloc_str(token.lexeme), token.span);
        let span = object.span().merge(token.span);
        Ok(self.arena.alloc(Expr::Member(self.arena.alloc(MemberExpr {
            object,
            property: MemberProperty::Field(field),
            span,
        }))))
    }

    /// Parse a subscript: `object[index]`.
    fn parse_index(&mut self, object: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftBracket)?;
        let index = self.parse_expr(0)?;
        let end_span = self.expect(TokenKind::RightBracket)?.span;
        let span = object.span().merge(end_span);
        Ok(self.arena.alloc(Expr::Member(self.arena.alloc(MemberExpr {
            object,
            property: MemberProperty::Index(index),
            span,
        }))))
    }

    /// Parse a call's argument list.
    ///
    /// Named arguments are collected into one trailing [`ObjectExpr`].
    fn parse_call(&mut self, callee: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::LeftParen)?;

        let mut arguments = BumpVec::new_in(self.arena);
        let mut properties = BumpVec::new_in(self.arena);
        let mut named_span: Option<Span> = None;

        if !self.check(TokenKind::RightParen) {
            loop {
                if self.check(TokenKind::Identifier) && self.peek_nth(1).kind == TokenKind::Assign
                {
                    let key_token = self.advance();
                    self.advance();
                    let key = Ident::new(self.alloc_str(key_token.lexeme), key_token.span);
                    let value = self.parse_expr(0)?;
                    let span = key_token.span.merge(value.span());
                    named_span = Some(named_span.map_or(span, |s| s.merge(span)));
                    properties.push(Property { key, value: *value });
                } else {
                    arguments.push(*self.parse_expr(0)?);
                }

                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        let end_span = self.expect(TokenKind::RightParen)?.span;

        if let Some(span) = named_span {
            arguments.push(Expr::Object(self.arena.alloc(ObjectExpr {
                properties: properties.into_bump_slice(),
                span,
            })));
        }

        let span = callee.span().merge(end_span);
        Ok(self.arena.alloc(Expr::Call(self.arena.alloc(CallExpr {
            callee,
            arguments: arguments.into_bump_slice(),
            span,
        }))))
    }

    /// Parse the rest of `test ? consequent : alternate`.
    fn parse_ternary(&mut self, test: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        self.expect(TokenKind::Question)?;
        let consequent = self.parse_expr(0)?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_expr(TERNARY_BP)?;
        let span = test.span().merge(alternate.span());
        Ok(self
            .arena
            .alloc(Expr::Conditional(self.arena.alloc(ConditionalExpr {
                test,
                consequent,
                alternate,
                span,
            }))))
    }
}

/// Strip the quotes from a string lexeme and resolve escapes.
fn unescape(lexeme: &str) -> String {
    let inner = if lexeme.len() >= 2 {
        &lexeme[1..lexeme.len() - 1]
    } else {
        ""
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
