//! Main lexer implementation.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s. Layout is
//! significant in the DSL: the lexer turns line ends into `Newline` tokens
//! and changes of leading indentation into `Indent`/`Dedent` pairs, except
//! inside parentheses and brackets where line ends are insignificant.

use std::collections::VecDeque;

use pinegen_core::{ParseError, ParseErrorKind, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Column width of a tab when measuring indentation.
const TAB_WIDTH: u32 = 4;

/// Lexer for DSL source code.
pub struct Lexer<'src> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// Layout tokens waiting to be returned.
    pending: VecDeque<Token<'src>>,
    /// Widths of the currently open indentation levels.
    indent_stack: Vec<u32>,
    /// Nesting depth of `(` and `[`.
    paren_depth: u32,
    /// Whether the next scan starts at the beginning of a line.
    at_line_start: bool,
    /// Kind of the most recently returned token.
    last_kind: TokenKind,
    /// Whether end-of-input layout tokens have been queued.
    finished: bool,
    /// Accumulated errors.
    errors: Vec<ParseError>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            pending: VecDeque::new(),
            indent_stack: vec![0],
            paren_depth: 0,
            at_line_start: true,
            last_kind: TokenKind::Newline,
            finished: false,
            errors: Vec::new(),
        }
    }

    /// Lex the whole source, returning every token up to and including `Eof`.
    pub fn tokenize(source: &'src str) -> (Vec<Token<'src>>, Vec<ParseError>) {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, lexer.take_errors())
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                self.last_kind = token.kind;
                return token;
            }

            if self.finished {
                return self.make_token(TokenKind::Eof, "", self.here(0));
            }

            if self.at_line_start && self.paren_depth == 0 {
                self.at_line_start = false;
                self.scan_indentation();
                continue;
            }

            self.skip_inline_whitespace();

            match self.cursor.peek() {
                None => self.finish(),
                Some('\n') => {
                    let span = self.here(1);
                    self.cursor.advance();
                    if self.paren_depth > 0 {
                        continue;
                    }
                    self.at_line_start = true;
                    if !matches!(
                        self.last_kind,
                        TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
                    ) {
                        self.pending
                            .push_back(Token::new(TokenKind::Newline, "\n", span));
                    }
                }
                Some(_) => {
                    let token = self.scan_token();
                    self.last_kind = token.kind;
                    return token;
                }
            }
        }
    }

    // =========================================
    // Internal: Layout
    // =========================================

    /// Measure leading whitespace and queue `Indent`/`Dedent` tokens.
    ///
    /// Blank and comment-only lines leave the indentation stack untouched.
    fn scan_indentation(&mut self) {
        let line = self.cursor.line();
        let mut width = 0;
        loop {
            match self.cursor.peek() {
                Some(' ') => width += 1,
                Some('\t') => width += TAB_WIDTH,
                Some('\r') => {}
                _ => break,
            }
            self.cursor.advance();
        }

        if self.cursor.is_eof() || self.cursor.check_str("\n") || self.cursor.check_str("//") {
            return;
        }

        let span = Span::new(line, 1, width);
        let top = self.current_indent();
        if width > top {
            self.indent_stack.push(width);
            self.pending.push_back(Token::new(TokenKind::Indent, "", span));
        } else if width < top {
            while self.current_indent() > width {
                self.indent_stack.pop();
                self.pending.push_back(Token::new(TokenKind::Dedent, "", span));
            }
            if self.current_indent() != width {
                self.errors.push(ParseError::new(
                    ParseErrorKind::InconsistentIndent,
                    span,
                    format!("indentation of {width} matches no enclosing block"),
                ));
            }
        }
    }

    fn current_indent(&self) -> u32 {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    /// Queue the closing `Newline`, one `Dedent` per open block, and `Eof`.
    fn finish(&mut self) {
        let span = self.here(0);
        if !matches!(
            self.last_kind,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
        ) {
            self.pending.push_back(Token::new(TokenKind::Newline, "", span));
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.pending.push_back(Token::new(TokenKind::Dedent, "", span));
        }
        self.finished = true;
    }

    /// Skip spaces, tabs, carriage returns and `//` comments (not newlines).
    fn skip_inline_whitespace(&mut self) {
        loop {
            match self.cursor.peek() {
                Some(' ') | Some('\t') | Some('\r') | Some('\u{FEFF}') => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.peek_nth(1) == Some('/') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                _ => break,
            }
        }
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    fn scan_token(&mut self) -> Token<'src> {
        let start = self.cursor.offset();
        let line = self.cursor.line();
        let col = self.cursor.column();

        let c = match self.cursor.peek() {
            Some(c) => c,
            None => return self.make_token(TokenKind::Eof, "", self.here(0)),
        };

        if is_ident_start(c) {
            let ident = self.cursor.eat_while(is_ident_continue);
            let kind = lookup_keyword(ident).unwrap_or(TokenKind::Identifier);
            return self.make_token(kind, ident, Span::new(line, col, ident.len() as u32));
        }

        if c.is_ascii_digit() || (c == '.' && self.cursor.peek_nth(1).is_some_and(|n| n.is_ascii_digit())) {
            return self.scan_number(start, line, col);
        }

        if c == '"' || c == '\'' {
            return self.scan_string(c, start, line, col);
        }

        self.scan_operator(start, line, col)
    }

    fn scan_number(&mut self, start: u32, line: u32, col: u32) -> Token<'src> {
        self.cursor.eat_while(|c| c.is_ascii_digit());
        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_none_or(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.cursor.peek(), Some('e') | Some('E')) {
            let signed = matches!(self.cursor.peek_nth(1), Some('+') | Some('-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.cursor.peek_nth(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                self.cursor.advance();
                if signed {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
            } else {
                self.cursor.advance();
                let lexeme = self.cursor.slice_from(start);
                let span = Span::new(line, col, lexeme.len() as u32);
                self.errors.push(ParseError::new(
                    ParseErrorKind::InvalidNumber,
                    span,
                    format!("missing exponent digits in '{lexeme}'"),
                ));
                return self.make_token(TokenKind::Error, lexeme, span);
            }
        }
        let lexeme = self.cursor.slice_from(start);
        self.make_token(TokenKind::Number, lexeme, Span::new(line, col, lexeme.len() as u32))
    }

    fn scan_string(&mut self, quote: char, start: u32, line: u32, col: u32) -> Token<'src> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    let lexeme = self.cursor.slice_from(start);
                    let span = Span::new(line, col, lexeme.len() as u32);
                    self.errors.push(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        span,
                        "string literal is not closed on this line",
                    ));
                    return self.make_token(TokenKind::Error, lexeme, span);
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    break;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
        let lexeme = self.cursor.slice_from(start);
        self.make_token(TokenKind::String, lexeme, Span::new(line, col, lexeme.len() as u32))
    }

    fn scan_operator(&mut self, start: u32, line: u32, col: u32) -> Token<'src> {
        let Some(c) = self.cursor.advance() else {
            return self.make_token(TokenKind::Eof, "", self.here(0));
        };
        let kind = match c {
            '+' if self.cursor.eat('=') => TokenKind::PlusAssign,
            '+' => TokenKind::Plus,
            '-' if self.cursor.eat('=') => TokenKind::MinusAssign,
            '-' => TokenKind::Minus,
            '*' if self.cursor.eat('=') => TokenKind::StarAssign,
            '*' => TokenKind::Star,
            '/' if self.cursor.eat('=') => TokenKind::SlashAssign,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' if self.cursor.eat('=') => TokenKind::EqualEqual,
            '=' => TokenKind::Assign,
            ':' if self.cursor.eat('=') => TokenKind::ColonAssign,
            ':' => TokenKind::Colon,
            '!' if self.cursor.eat('=') => TokenKind::NotEqual,
            '<' if self.cursor.eat('=') => TokenKind::LessEqual,
            '<' => TokenKind::Less,
            '>' if self.cursor.eat('=') => TokenKind::GreaterEqual,
            '>' => TokenKind::Greater,
            '?' => TokenKind::Question,
            '(' => {
                self.paren_depth += 1;
                TokenKind::LeftParen
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RightParen
            }
            '[' => {
                self.paren_depth += 1;
                TokenKind::LeftBracket
            }
            ']' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                TokenKind::RightBracket
            }
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            _ => TokenKind::Error,
        };

        let lexeme = self.cursor.slice_from(start);
        let span = Span::new(line, col, lexeme.len() as u32);
        if kind == TokenKind::Error {
            self.errors.push(ParseError::new(
                ParseErrorKind::UnexpectedChar,
                span,
                format!("unexpected character '{c}'"),
            ));
        }
        self.make_token(kind, lexeme, span)
    }

    // =========================================
    // Internal: Helpers
    // =========================================

    fn here(&self, len: u32) -> Span {
        Span::new(self.cursor.line(), self.cursor.column(), len)
    }

    #[inline]
    fn make_token(&self, kind: TokenKind, lexeme: &'src str, span: Span) -> Token<'src> {
        Token::new(kind, lexeme, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::tokenize(source);
        assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_assignment() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = close\n"),
            vec![Identifier, Assign, Identifier, Newline, Eof]
        );
    }

    #[test]
    fn missing_trailing_newline_is_synthesized() {
        use TokenKind::*;
        assert_eq!(kinds("x = 1"), vec![Identifier, Assign, Number, Newline, Eof]);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        use TokenKind::*;
        assert_eq!(
            kinds("//@version=5\n\n// note\nx = 1 // trailing\n"),
            vec![Identifier, Assign, Number, Newline, Eof]
        );
    }

    #[test]
    fn indentation_produces_blocks() {
        use TokenKind::*;
        assert_eq!(
            kinds("if c\n    x := 1\ny = 2\n"),
            vec![
                If, Identifier, Newline, Indent, Identifier, ColonAssign, Number, Newline, Dedent,
                Identifier, Assign, Number, Newline, Eof
            ]
        );
    }

    #[test]
    fn open_blocks_close_at_eof() {
        use TokenKind::*;
        assert_eq!(
            kinds("if c\n    x := 1"),
            vec![If, Identifier, Newline, Indent, Identifier, ColonAssign, Number, Newline, Dedent, Eof]
        );
    }

    #[test]
    fn newlines_inside_parens_are_ignored() {
        use TokenKind::*;
        assert_eq!(
            kinds("plot(x,\n     title=\"a\")\n"),
            vec![
                Identifier, LeftParen, Identifier, Comma, Identifier, Assign, String, RightParen,
                Newline, Eof
            ]
        );
    }

    #[test]
    fn operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("a := b >= c != d ? e : f[1]"),
            vec![
                Identifier, ColonAssign, Identifier, GreaterEqual, Identifier, NotEqual, Identifier,
                Question, Identifier, Colon, Identifier, LeftBracket, Number, RightBracket, Newline,
                Eof
            ]
        );
    }

    #[test]
    fn numbers() {
        let (tokens, _) = Lexer::tokenize("20 0.5 .25 1e-3 2.");
        let lexemes: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Number)
            .map(|t| t.lexeme)
            .collect();
        assert_eq!(lexemes, vec!["20", "0.5", ".25", "1e-3", "2."]);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let (_, errors) = Lexer::tokenize("x = \"abc\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn inconsistent_dedent_is_reported() {
        let (_, errors) = Lexer::tokenize("if a\n    x := 1\n  y = 2\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::InconsistentIndent);
    }

    #[test]
    fn spans_are_one_indexed() {
        let (tokens, _) = Lexer::tokenize("x = close");
        assert_eq!(tokens[2].span, Span::new(1, 5, 5));
    }
}
