//! Core types shared by the Pine code generator crates.
//!
//! - [`Span`]: source locations attached to AST nodes and errors
//! - [`error`]: the error hierarchy (`ParseError`, `CodegenError`, `PinegenError`)
//! - [`ConstantValue`]: typed compile-time constants
//! - [`TypeTag`]: the three-way bool/float/string inference tag
//! - [`fingerprint`]: stable call-site hashing for temp-series deduplication

pub mod constant;
pub mod error;
pub mod fingerprint;
mod span;
mod type_tag;

pub use constant::{ConstantValue, quote, render_float, render_plain};
pub use error::{CodegenError, ParseError, ParseErrorKind, ParseErrors, PinegenError};
pub use fingerprint::fingerprint;
pub use span::Span;
pub use type_tag::TypeTag;
