//! Host source writer.
//!
//! The [`CodeWriter`] accumulates tab-indented lines of host source. Every
//! emitter receives the writer, appends its lines at the current indent
//! level and leaves the level as it found it.
//!
//! # Example
//!
//! ```
//! use pinegen_compiler::emit::CodeWriter;
//!
//! let mut w = CodeWriter::new(1);
//! w.open("if i > 0 {");
//! w.line("xSeries.Set(1.0)");
//! w.close("}");
//! assert_eq!(w.finish(), "\tif i > 0 {\n\t\txSeries.Set(1.0)\n\t}\n");
//! ```

/// Accumulates indented host source lines.
#[derive(Debug, Clone, Default)]
pub struct CodeWriter {
    /// Output buffer
    buf: String,
    /// Current indent level in tabs
    indent: usize,
}

impl CodeWriter {
    /// Create a writer starting at `indent` tabs.
    pub fn new(indent: usize) -> Self {
        Self {
            buf: String::new(),
            indent,
        }
    }

    /// Current indent level.
    pub fn indent_level(&self) -> usize {
        self.indent
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append one line at the current indent level.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        for _ in 0..self.indent {
            self.buf.push('\t');
        }
        self.buf.push_str(text.trim_end());
        self.buf.push('\n');
    }

    /// Append an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Increase the indent level.
    pub fn indent(&mut self) {
        self.indent += 1;
    }

    /// Decrease the indent level.
    pub fn dedent(&mut self) {
        debug_assert!(self.indent > 0, "unbalanced dedent");
        self.indent = self.indent.saturating_sub(1);
    }

    /// Write a line that opens a block and indent.
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent();
    }

    /// Dedent and write a line that closes a block.
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.dedent();
        self.line(text);
    }

    /// Dedent, write a line such as `} else {`, and indent again.
    pub fn reopen(&mut self, text: impl AsRef<str>) {
        self.dedent();
        self.open(text);
    }

    /// Consume the writer and return the source.
    pub fn finish(self) -> String {
        self.buf
    }
}
