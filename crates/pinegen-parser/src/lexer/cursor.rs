/// Character-level reader over one script.
///
/// Positions are byte offsets. The line and the offset where it starts are
/// kept so columns can be derived for spans and indentation.
pub struct Cursor<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    line_start: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.pos as u32
    }

    /// 1-indexed line.
    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-indexed byte column within the current line.
    #[inline]
    pub fn column(&self) -> u32 {
        (self.pos - self.line_start) as u32 + 1
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// The character `n` places ahead, `0` being the current one.
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    #[inline]
    pub fn check_str(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(ch)
    }

    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        let matched = self.peek() == Some(ch);
        if matched {
            self.advance();
        }
        matched
    }

    /// Consume the run of characters matching `f` and return it.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        while self.peek().is_some_and(&f) {
            self.advance();
        }
        &self.source[start..self.pos]
    }

    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.pos]
    }

    fn remaining(&self) -> &'src str {
        &self.source[self.pos..]
    }
}

#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
