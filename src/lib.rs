//! Pinegen
//!
//! Compiles a Pine-style indicator/strategy script into the body of a Go
//! per-bar function. The emitted body allocates one ring-buffered series per
//! user variable, walks the bars once, and drives a strategy runtime and a
//! plot collector supplied by the host.
//!
//! # Example
//!
//! ```
//! let code = pinegen::compile("strategy(\"Demo\")\nx = close\n").unwrap();
//! assert_eq!(code.strategy_name, "Demo");
//! assert!(code.function_body.contains("xSeries.Set(bar.Close)"));
//! ```
//!
//! The crates behind this facade can be used on their own:
//! - [`pinegen_parser`]: Lexer and AST
//! - [`pinegen_registry`]: Builtin names and function categories
//! - [`pinegen_compiler`]: The two-pass generator

use bumpalo::Bump;
use tracing::debug;

pub use pinegen_compiler::{
    CodeGenerator, GeneratorConfig, SafetyLimits, StrategyCode, generate_strategy_code,
};
pub use pinegen_core::{CodegenError, ParseError, ParseErrors, PinegenError, Span};
pub use pinegen_parser::{Parser, Program};

pub use pinegen_compiler as compiler;
pub use pinegen_core as core;
pub use pinegen_parser as parser;
pub use pinegen_registry as registry;

/// Parse and generate with the default [`GeneratorConfig`].
pub fn compile(source: &str) -> Result<StrategyCode, PinegenError> {
    compile_with(source, &GeneratorConfig::default())
}

/// Parse and generate with an explicit configuration.
///
/// The AST lives in an arena dropped before returning; only the emitted
/// text escapes.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_with(source: &str, config: &GeneratorConfig) -> Result<StrategyCode, PinegenError> {
    let arena = Bump::new();
    let program = Parser::parse(source, &arena)?;
    debug!(statements = program.body().len(), "parsed script");
    Ok(generate_strategy_code(&program, config)?)
}
