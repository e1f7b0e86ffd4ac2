//! Parser crate for the Pine-style indicator/strategy DSL.
//!
//! This crate provides the lexer and parser that turn DSL source into the
//! AST consumed by the code generator. It includes:
//! - Lexical analysis with indentation-aware layout tokens
//! - Abstract Syntax Tree (AST) definitions
//! - Pratt expression parser and line-oriented statement parser
//!
//! # Example
//!
//! ```
//! use pinegen_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//! //@version=5
//! strategy("Crossover")
//! fast = ta.sma(close, 10)
//! slow = ta.sma(close, 30)
//! if ta.crossover(fast, slow)
//!     strategy.entry("Long", strategy.long)
//! "#;
//!
//! match Parser::parse(source, &arena) {
//!     Ok(program) => println!("Parsed successfully: {} statements", program.body().len()),
//!     Err(errors) => eprintln!("Parse errors: {}", errors),
//! }
//! ```

// Lexer module
pub mod lexer;

// AST module
pub mod ast;

// Re-export commonly used types at crate root
pub use ast::{Parser, Program};
pub use lexer::{Lexer, Token, TokenKind};
pub use pinegen_core::Span;
