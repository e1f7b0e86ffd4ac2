//! Unified error types for the Pine code generator.
//!
//! ## Error Hierarchy
//!
//! ```text
//! PinegenError (top-level wrapper)
//! ├── ParseErrors   - Lexer/parser errors (with ParseErrorKind)
//! └── CodegenError  - Code generation errors
//! ```
//!
//! Each phase-specific error type can be used directly, or converted into
//! [`PinegenError`] with `?`:
//!
//! ```ignore
//! use pinegen_core::PinegenError;
//!
//! fn compile(source: &str) -> Result<String, PinegenError> {
//!     let program = parse(source)?;          // ParseErrors -> PinegenError
//!     let code = generate(&program)?;        // CodegenError -> PinegenError
//!     Ok(code)
//! }
//! ```

use thiserror::Error;

use crate::Span;

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// An unexpected character was encountered by the lexer.
    UnexpectedChar,
    /// A string literal was not terminated before end of line.
    UnterminatedString,
    /// A numeric literal could not be parsed.
    InvalidNumber,
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,
    /// An expression was expected.
    ExpectedExpression,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// An indented block was expected.
    ExpectedBlock,
    /// Dedent to a column that matches no enclosing block.
    InconsistentIndent,
    /// Left-hand side of an assignment is not a plain name.
    InvalidAssignmentTarget,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedChar => "unexpected character",
            ParseErrorKind::UnterminatedString => "unterminated string",
            ParseErrorKind::InvalidNumber => "invalid number",
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedBlock => "expected block",
            ParseErrorKind::InconsistentIndent => "inconsistent indentation",
            ParseErrorKind::InvalidAssignmentTarget => "invalid assignment target",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "unexpected token" error.
    pub fn unexpected_token(span: Span, token: &str) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            span,
            format!("unexpected token: {token}"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    /// Format the error with the offending source line and a caret.
    pub fn display_with_source(&self, source: &str) -> String {
        let mut output = format!("Error at {}:{}: {}\n", self.span.line, self.span.col, self.kind);
        if !self.message.is_empty() {
            output.push_str(&format!("  {}\n", self.message));
        }

        if let Some(line_text) = source.lines().nth((self.span.line as usize).saturating_sub(1)) {
            output.push_str("  |\n");
            output.push_str(&format!("{:>3} | {}\n", self.span.line, line_text));
            let indent = " ".repeat((self.span.col as usize).saturating_sub(1));
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            output.push_str(&format!("  | {indent}{pointer}\n"));
        }

        output
    }
}

/// A collection of parse errors.
///
/// The parser recovers at statement boundaries, so several errors may be
/// reported for one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create a new empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// The first error, if any.
    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// Convert to a Vec of errors.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Codegen Errors
// ============================================================================

/// Errors raised while lowering an AST into the per-bar host function.
///
/// Every variant names the construct it rejects. No partial output is ever
/// returned alongside one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodegenError {
    /// A call has the wrong arity, a non-constant period, or an argument of
    /// the wrong shape.
    #[error("at {span}: malformed call to '{function}': {message}")]
    MalformedCall {
        /// The (canonical) function name.
        function: String,
        /// What is wrong with the call.
        message: String,
        /// Where the call appears.
        span: Span,
    },

    /// An expression or statement kind the generator cannot lower.
    #[error("at {span}: unsupported {construct}")]
    Unsupported {
        /// Description of the construct, e.g. `function 'label.new'`.
        construct: String,
        /// Where the construct appears.
        span: Span,
    },

    /// Two declarations claim the same storage name.
    #[error("at {span}: '{name}' collides with existing storage '{storage}'")]
    NameCollision {
        /// The DSL name being declared.
        name: String,
        /// The host storage name already taken.
        storage: String,
        /// Where the second declaration appears.
        span: Span,
    },

    /// A name is read or reassigned without being declared.
    #[error("at {span}: undefined variable '{name}'")]
    UndefinedVariable {
        /// The unknown name.
        name: String,
        /// Where it was referenced.
        span: Span,
    },

    /// A configured safety limit was exceeded.
    #[error("{limit} limit exceeded (max {max})")]
    LimitExceeded {
        /// Which limit.
        limit: &'static str,
        /// The configured maximum.
        max: usize,
    },

    /// A generator component was handed input that violates its contract.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the breach.
        message: String,
    },
}

impl CodegenError {
    /// Shorthand for [`CodegenError::MalformedCall`].
    pub fn malformed(function: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        CodegenError::MalformedCall {
            function: function.into(),
            message: message.into(),
            span,
        }
    }

    /// Shorthand for [`CodegenError::Unsupported`].
    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        CodegenError::Unsupported {
            construct: construct.into(),
            span,
        }
    }

    /// Shorthand for [`CodegenError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        CodegenError::Internal {
            message: message.into(),
        }
    }

    /// Get the span where this error occurred, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            CodegenError::MalformedCall { span, .. }
            | CodegenError::Unsupported { span, .. }
            | CodegenError::NameCollision { span, .. }
            | CodegenError::UndefinedVariable { span, .. } => Some(*span),
            CodegenError::LimitExceeded { .. } | CodegenError::Internal { .. } => None,
        }
    }
}

// ============================================================================
// Top-level Error
// ============================================================================

/// Top-level error for the full parse + generate pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PinegenError {
    /// The source failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseErrors),

    /// The AST failed to lower.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}
