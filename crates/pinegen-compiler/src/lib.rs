//! Pinegen Code Generator
//!
//! Turns a parsed script into the body of a per-bar host function in which
//! every user name is a ring-buffered series.
//!
//! ## Architecture
//!
//! - **Pass 1 (Collection)**: Declare every name, lift inputs to constants,
//!   record the script title
//! - **Pass 2 (Materialization)**: Allocate deduplicated temp series for
//!   nested TA calls and note the features the preamble needs
//! - **Emission**: Write the preamble and the bar loop, each statement
//!   preceded by the temps it reads
//!
//! ## Modules
//!
//! - [`analyzer`]: Call-site discovery, structural predicates, temp naming
//! - [`boolean`]: Coercion between host booleans and float storage
//! - [`builtins`]: Math, value, input, time, plot, strategy and security handlers
//! - [`config`]: Generator settings and safety limits
//! - [`constants`]: Compile-time constant folding
//! - [`context`]: Per-compilation state shared by the passes
//! - [`emit`]: Tab-indented source writer
//! - [`expr`]: Expression lowering
//! - [`generator`]: The driver
//! - [`passes`]: Collection and materialization
//! - [`series`]: Source classification and offset accessors
//! - [`stmt`]: Statement emission
//! - [`symbols`]: The name environment
//! - [`ta`]: Inline technical-analysis primitives
//! - [`temp_vars`]: Temp-series allocation
//! - [`types`]: Type inference over expressions

pub mod analyzer;
pub mod boolean;
pub mod builtins;
pub mod config;
pub mod constants;
pub mod context;
pub mod emit;
pub mod expr;
pub mod generator;
mod host_expr;
pub mod passes;
pub mod series;
pub mod stmt;
pub mod symbols;
pub mod ta;
pub mod temp_vars;
pub mod types;

pub use config::{GeneratorConfig, SafetyLimits};
pub use context::{GenContext, ProgramFeatures};
pub use emit::CodeWriter;
pub use expr::ExprLowerer;
pub use generator::{CodeGenerator, StrategyCode, generate_strategy_code};
pub use host_expr::{HostExpr, Precedence};
pub use passes::{CollectionOutput, CollectionPass, MaterializationOutput, MaterializationPass};
pub use stmt::StmtEmitter;
pub use ta::{TaCall, TaHandler, TaRegistry};

// Re-export CodegenError from core for convenience
pub use pinegen_core::CodegenError;
