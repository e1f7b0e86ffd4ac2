//! Inline technical-analysis primitives.
//!
//! Every TA call the generator supports is expanded inline into a block
//! that writes one value per bar into the call's backing series. The
//! pieces compose as follows:
//!
//! - [`warmup`]: the NaN gate for bars before the window is full
//! - [`loops`]: forward and backward window loops over an accessor
//! - [`accumulator`]: pluggable folds (sum, weighted, exponential, moments)
//! - [`builder`]: composes the above into a complete windowed indicator
//!
//! Handlers for the individual functions live in their own modules and are
//! collected by the [`TaRegistry`].
//!
//! # Example
//!
//! ```ignore
//! let registry = TaRegistry::new();
//! let call = TaCall::new("ta.sma", call_expr, ctx);
//! registry.generate_inline(&call, "sma20", &lowerer, &mut writer)?;
//! ```

pub mod accumulator;
pub mod builder;
pub mod loops;
pub mod warmup;

mod cross;
mod deviation;
mod moving_average;
mod oscillator;
mod pivot;
mod stateful;

use pinegen_core::{CodegenError, Span, render_plain};
use pinegen_parser::ast::{CallExpr, Expr};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::context::GenContext;
use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;
use crate::series::{SeriesSource, SourceClassifier};

type Result<T> = std::result::Result<T, CodegenError>;

/// One inline TA function.
pub trait TaHandler: Send + Sync {
    /// The canonical function name (`ta.sma`).
    fn name(&self) -> &'static str;

    /// The argument that names the window length in temp names, if any.
    fn period_arg<'ast>(&self, call: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>>;

    /// Arguments read at offsets inside the generated loop. Each must be a
    /// series; anything else is materialized first.
    fn source_args<'ast>(&self, call: &CallExpr<'ast>) -> Vec<&'ast Expr<'ast>>;

    /// Whether a numeric literal may stand in for a series source.
    fn accepts_literal_source(&self) -> bool {
        false
    }

    /// Emit the block writing into `{target}Series`.
    fn generate<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        lowerer: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()>;
}

// ==========================================================================
// Call view
// ==========================================================================

/// A TA call site with argument helpers.
pub struct TaCall<'a, 'ast> {
    name: &'a str,
    call: &'ast CallExpr<'ast>,
    ctx: &'a GenContext<'ast>,
}

impl<'a, 'ast> TaCall<'a, 'ast> {
    /// `name` must be canonical.
    pub fn new(name: &'a str, call: &'ast CallExpr<'ast>, ctx: &'a GenContext<'ast>) -> Self {
        Self { name, call, ctx }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// The name without its namespace (`sma`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(self.name)
    }

    pub fn call(&self) -> &'ast CallExpr<'ast> {
        self.call
    }

    pub fn span(&self) -> Span {
        self.call.span
    }

    /// Positional argument `index`, or the named argument `key`.
    pub fn arg(&self, index: usize, key: &str) -> Option<&'ast Expr<'ast>> {
        self.call.arg(index, key)
    }

    /// Like [`arg`](Self::arg), failing when absent.
    pub fn require(&self, index: usize, key: &str) -> Result<&'ast Expr<'ast>> {
        self.arg(index, key)
            .ok_or_else(|| self.malformed(format!("missing argument '{key}'")))
    }

    /// Fail unless the call has between `min` and `max` arguments.
    pub fn check_arity(&self, min: usize, max: usize) -> Result<()> {
        let count = argument_count(self.call);
        if count < min || count > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min} to {max}")
            };
            return Err(self.malformed(format!("expected {expected} arguments, found {count}")));
        }
        Ok(())
    }

    /// A window length: a positive integer literal or input constant.
    pub fn period(&self, index: usize, key: &str) -> Result<u32> {
        let expr = self.require(index, key)?;
        self.ctx
            .resolver()
            .resolve_int(expr)
            .filter(|&n| n >= 1)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                self.malformed(format!(
                    "'{key}' must be a positive integer constant, found '{expr}'"
                ))
            })
    }

    /// A non-negative integer constant, defaulting when absent.
    pub fn count_or(&self, index: usize, key: &str, default: u32) -> Result<u32> {
        let Some(expr) = self.arg(index, key) else {
            return Ok(default);
        };
        self.ctx
            .resolver()
            .resolve_int(expr)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                self.malformed(format!(
                    "'{key}' must be a non-negative integer constant, found '{expr}'"
                ))
            })
    }

    /// Classify a source argument. Non-series sources must have been
    /// materialized by the analysis pass.
    pub fn source(&self, expr: &'ast Expr<'ast>) -> Result<SeriesSource> {
        SourceClassifier::new(self.ctx).classify(expr).ok_or_else(|| {
            CodegenError::internal(format!(
                "source '{expr}' of '{}' was not materialized",
                self.name
            ))
        })
    }

    pub fn malformed(&self, message: impl Into<String>) -> CodegenError {
        CodegenError::malformed(self.name, message, self.call.span)
    }
}

/// Positional plus named arguments.
fn argument_count(call: &CallExpr<'_>) -> usize {
    call.positional().len() + call.named().map_or(0, |obj| obj.properties.len())
}

/// Render a period argument for a temp name: literals as written, names
/// with dots replaced.
pub fn period_label(expr: &Expr<'_>) -> Option<String> {
    if let Some(n) = expr.as_number() {
        return Some(render_plain(n));
    }
    expr.qualified_name().map(|name| name.replace('.', "_"))
}

// ==========================================================================
// Registry
// ==========================================================================

/// Maps canonical names to inline handlers.
pub struct TaRegistry {
    handlers: FxHashMap<&'static str, Box<dyn TaHandler>>,
}

impl TaRegistry {
    /// A registry with every supported function.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: FxHashMap::default(),
        };
        moving_average::register(&mut registry);
        deviation::register(&mut registry);
        oscillator::register(&mut registry);
        cross::register(&mut registry);
        pivot::register(&mut registry);
        stateful::register(&mut registry);
        registry
    }

    /// Add a handler under its canonical name.
    pub fn register(&mut self, handler: Box<dyn TaHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    /// Find the handler for a canonical name.
    pub fn find_handler(&self, name: &str) -> Option<&dyn TaHandler> {
        self.handlers.get(name).map(|h| h.as_ref())
    }

    pub fn is_supported(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Emit the inline block for `call` writing into `{target}Series`.
    pub fn generate_inline<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        lowerer: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()> {
        let handler = self.find_handler(call.name()).ok_or_else(|| {
            CodegenError::unsupported(format!("function '{}'", call.name()), call.span())
        })?;
        trace!(function = call.name(), target, "inline TA");
        let indent = w.indent_level();
        handler.generate(call, target, lowerer, w)?;
        debug_assert_eq!(w.indent_level(), indent, "unbalanced TA block");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for TaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use pinegen_parser::Parser;

    #[test]
    fn catalog_is_complete() {
        let registry = TaRegistry::new();
        for name in [
            "ta.sma",
            "ta.ema",
            "ta.rma",
            "ta.wma",
            "math.sum",
            "ta.stdev",
            "ta.dev",
            "ta.atr",
            "ta.rsi",
            "ta.change",
            "ta.crossover",
            "ta.crossunder",
            "ta.pivothigh",
            "ta.pivotlow",
            "ta.valuewhen",
            "fixnan",
        ] {
            assert!(registry.is_supported(name), "{name}");
        }
        assert_eq!(registry.len(), 16);
        assert!(!registry.is_supported("sma"));
        assert!(!registry.is_supported("ta.vwap"));
    }

    #[test]
    fn period_labels() {
        let arena = Bump::new();
        let program = Parser::parse("f(20, length, a.b, 2 * x)\n", &arena).unwrap();
        let pinegen_parser::ast::Stmt::Expr(stmt) = program.body()[0] else {
            panic!("expected expression");
        };
        let Expr::Call(call) = stmt.expr else {
            panic!("expected call");
        };
        let labels: Vec<_> = call.arguments.iter().map(period_label).collect();
        assert_eq!(
            labels,
            vec![
                Some("20".to_string()),
                Some("length".to_string()),
                Some("a_b".to_string()),
                None
            ]
        );
    }

    #[test]
    fn period_must_be_positive_constant() {
        let arena = Bump::new();
        let program =
            Parser::parse("ta.sma(close, 0)\nta.sma(close, x)\nta.sma(close, 14)\n", &arena)
                .unwrap();
        let ctx = GenContext::new(crate::config::GeneratorConfig::default());
        let calls: Vec<_> = program
            .body()
            .iter()
            .map(|s| match s {
                pinegen_parser::ast::Stmt::Expr(e) => match e.expr {
                    Expr::Call(c) => *c,
                    _ => panic!("expected call"),
                },
                _ => panic!("expected expression"),
            })
            .collect();
        assert!(matches!(
            TaCall::new("ta.sma", calls[0], &ctx).period(1, "length"),
            Err(CodegenError::MalformedCall { .. })
        ));
        assert!(TaCall::new("ta.sma", calls[1], &ctx).period(1, "length").is_err());
        assert_eq!(TaCall::new("ta.sma", calls[2], &ctx).period(1, "length"), Ok(14));
    }
}
