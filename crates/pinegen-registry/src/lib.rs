//! Symbol tables for the Pine code generator.
//!
//! ## Modules
//!
//! - [`constants`]: the qualified-name constant table (`barmerge.*`,
//!   `strategy.*`, `color.*`, `plot.style_*`) plus lifted `input.*` values
//! - [`builtins`]: builtin identifiers (OHLCV fields, bar scalars, strategy
//!   runtime values) and their host spellings
//! - [`functions`]: function-name canonicalization and call categories

pub mod builtins;
pub mod constants;
pub mod functions;

pub use builtins::{Builtin, BuiltinScalar, OhlcvField, RuntimeValue};
pub use constants::{ConstantRegistry, RegistrationError};
pub use functions::{FunctionCategory, canonical_name};
