//! Abstract Syntax Tree (AST) for the DSL.
//!
//! This module provides:
//! - AST node definitions for expressions and statements
//! - Parser for transforming tokens into AST
//!
//! # Example
//!
//! ```
//! use pinegen_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = "//@version=5\nfast = ta.sma(close, 10)\nplot(fast)\n";
//!
//! match Parser::parse(source, &arena) {
//!     Ok(program) => println!("Parsed successfully: {} statements", program.body().len()),
//!     Err(errors) => eprintln!("Parse errors: {}", errors),
//! }
//! ```

pub mod ops;

mod parser;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub use pinegen_core::{ParseError, ParseErrorKind, ParseErrors};

pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;

/// A parsed DSL program.
///
/// The program borrows from an arena allocator. All AST nodes are allocated
/// in the arena and remain valid for the lifetime of the arena.
#[derive(Debug, Clone, Copy)]
pub struct Program<'ast> {
    body: &'ast [Stmt<'ast>],
    span: pinegen_core::Span,
}

impl<'ast> Program<'ast> {
    /// Create a program from already-built statements.
    pub fn new(body: &'ast [Stmt<'ast>], span: pinegen_core::Span) -> Self {
        Self { body, span }
    }

    /// The top-level statements, in source order.
    pub fn body(&self) -> &'ast [Stmt<'ast>] {
        self.body
    }

    /// Whether the program has no statements.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Get the source location span of this program.
    pub fn span(&self) -> pinegen_core::Span {
        self.span
    }
}
