//! Core parser infrastructure.
//!
//! Owns the token buffer and provides the lookahead, expectation and
//! error-recovery helpers shared by the expression and statement parsers.

use bumpalo::Bump;
use pinegen_core::{ParseError, ParseErrorKind, ParseErrors, Span};

use super::Program;
use crate::lexer::{Lexer, Token, TokenKind};

/// Parser for DSL source.
///
/// Tokens borrow from the source (`'src`); every AST node is allocated in
/// the arena (`'ast`), so the resulting [`Program`] outlives the source text.
pub struct Parser<'src, 'ast> {
    /// Arena that owns every AST node.
    pub(super) arena: &'ast Bump,
    /// All tokens, terminated by `Eof`.
    pub(super) buffer: Vec<Token<'src>>,
    /// Index of the current token.
    pub(super) position: usize,
    /// Errors collected so far.
    pub(super) errors: ParseErrors,
}

impl<'src, 'ast> Parser<'src, 'ast> {
    /// Create a parser over the given source.
    ///
    /// Lexical errors are recorded immediately and reported by [`Parser::parse`].
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        let (buffer, lex_errors) = Lexer::tokenize(source);
        let mut errors = ParseErrors::new();
        for error in lex_errors {
            errors.push(error);
        }
        Self {
            arena,
            buffer,
            position: 0,
            errors,
        }
    }

    /// Parse a complete program.
    ///
    /// Returns every error found; the parser recovers at statement boundaries.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &'src str, arena: &'ast Bump) -> Result<Program<'ast>, ParseErrors> {
        let mut parser = Parser::new(source, arena);
        let program = parser.parse_program();
        if parser.errors.is_empty() {
            Ok(program)
        } else {
            Err(parser.errors)
        }
    }

    /// Errors collected so far.
    pub fn errors(&self) -> &ParseErrors {
        &self.errors
    }

    // =========================================
    // Token access
    // =========================================

    /// Peek at the current token.
    pub(super) fn peek(&self) -> &Token<'src> {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead. Past the end, the `Eof` token is returned.
    pub(super) fn peek_nth(&self, n: usize) -> &Token<'src> {
        let last = self.buffer.len().saturating_sub(1);
        &self.buffer[(self.position + n).min(last)]
    }

    /// Check whether the current token has the given kind.
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Whether the current token is `Eof`.
    pub(super) fn is_at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// Consume and return the current token. Never moves past `Eof`.
    pub(super) fn advance(&mut self) -> Token<'src> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// Consume the current token if it has the given kind.
    pub(super) fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume a token of the given kind or fail.
    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = *self.peek();
            Err(ParseError::expected_token(
                found.span,
                kind.description(),
                found.kind.description(),
            ))
        }
    }

    /// The span of the most recently consumed token.
    pub(super) fn previous_span(&self) -> Span {
        self.buffer
            .get(self.position.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    /// Skip any number of newline tokens.
    pub(super) fn skip_newlines(&mut self) {
        while self.eat(TokenKind::Newline).is_some() {}
    }

    // =========================================
    // Error handling
    // =========================================

    /// Record an error unless one was already reported at the same spot.
    ///
    /// The lexer reports bad characters itself; the parser then trips over
    /// the resulting `Error` token at the same span.
    pub(super) fn record(&mut self, error: ParseError) {
        if self.errors.iter().any(|e| e.span == error.span) {
            return;
        }
        self.errors.push(error);
    }

    /// Skip to the start of the next statement at the current block level.
    ///
    /// Indented blocks that hang off the broken line are skipped with it.
    pub(super) fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::Newline => {
                    self.advance();
                    if depth == 0 && !self.check(TokenKind::Indent) {
                        return;
                    }
                }
                TokenKind::Indent => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::Dedent => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Build an error for a token that cannot start what was expected.
    pub(super) fn unexpected(&self, kind: ParseErrorKind, expected: &str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            return ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                format!("expected {expected}"),
            );
        }
        ParseError::new(
            kind,
            token.span,
            format!("expected {expected}, found {}", token.kind.description()),
        )
    }

    // =========================================
    // Arena helpers
    // =========================================

    /// Copy a string into the arena.
    pub(super) fn alloc_str(&self, s: &str) -> &'ast str {
        self.arena.alloc_str(s)
    }
}
