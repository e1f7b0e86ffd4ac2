//! Builtin function handlers.
//!
//! Inline handlers return a [`HostExpr`](crate::host_expr::HostExpr) for
//! use in expression position; statement handlers write lines into a
//! [`CodeWriter`]. [`emit_series_call`] is the single dispatch point for
//! every call that owns a series, whether the series belongs to a user
//! name or to a temp.

pub mod input;
pub mod math;
pub mod plot;
pub mod security;
pub mod strategy;
pub mod time;
pub mod value;

use pinegen_core::CodegenError;
use pinegen_parser::ast::CallExpr;
use pinegen_registry::{FunctionCategory, canonical_name};
use tracing::trace;

use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;
use crate::ta::TaCall;
use crate::temp_vars::{TempSource, TempVar};

type Result<T> = std::result::Result<T, CodegenError>;

/// Emit the per-bar calculation of a series-owning call into
/// `{target}Series`. `name` is the canonical function name.
pub fn emit_series_call<'ast>(
    call: &'ast CallExpr<'ast>,
    name: &str,
    target: &str,
    lowerer: &ExprLowerer<'_, 'ast>,
    w: &mut CodeWriter,
) -> Result<()> {
    let ctx = lowerer.ctx();
    trace!(function = name, target, "series call");
    match FunctionCategory::of(name) {
        FunctionCategory::Ta => {
            ctx.ta()
                .generate_inline(&TaCall::new(name, call, ctx), target, lowerer, w)
        }
        FunctionCategory::Math => {
            let short = name.strip_prefix("math.").unwrap_or(name);
            let value = math::lower_inline(lowerer, call, name)?;
            w.line(format!("/* Inline {short}() with TA dependencies */"));
            w.line(format!("{target}Series.Set({})", value.code));
            Ok(())
        }
        FunctionCategory::Time => time::emit_session(call, target, lowerer, w),
        FunctionCategory::Security => security::emit(call, name, target, lowerer, w),
        other => Err(CodegenError::internal(format!(
            "'{name}' ({other:?}) does not own a series"
        ))),
    }
}

/// Emit the per-bar calculation of one temp series.
pub fn emit_temp<'ast>(
    temp: &TempVar<'ast>,
    lowerer: &ExprLowerer<'_, 'ast>,
    w: &mut CodeWriter,
) -> Result<()> {
    match temp.source {
        TempSource::Call(call) => {
            let name = call.callee_name().ok_or_else(|| {
                CodegenError::internal(format!("temp '{}' has no callee name", temp.name))
            })?;
            let name = canonical_name(&name);
            emit_series_call(call, &name, &temp.name, lowerer, w)
        }
        TempSource::Expression(expr) => {
            let value = lowerer.lower_float(expr)?;
            w.line(format!("{}.Set({})", temp.storage(), value.code));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::prepare;
    use bumpalo::Bump;

    fn temps(source: &str) -> Vec<String> {
        let arena = Bump::new();
        let (ctx, _) = prepare(&arena, source);
        let lowerer = ExprLowerer::new(&ctx);
        ctx.temps()
            .temps()
            .iter()
            .map(|temp| {
                let mut w = CodeWriter::new(0);
                emit_temp(temp, &lowerer, &mut w).unwrap();
                w.finish()
            })
            .collect()
    }

    #[test]
    fn math_temp_has_header() {
        let out = temps("up = ta.rma(math.max(ta.change(close), 0), 9)\n");
        assert_eq!(out.len(), 3);
        let max = &out[1];
        assert!(max.starts_with("/* Inline max() with TA dependencies */\nmath_max_"));
        assert!(max.contains("Series.Set(math.Max(ta_change_"));
        assert!(max.ends_with("Series.GetCurrent(), 0.0))\n"));
    }

    #[test]
    fn expression_temp_sets_its_value() {
        let out = temps("x = ta.sma(close - open, 3)\n");
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("expr_"));
        assert!(out[0].ends_with("Series.Set(bar.Close - bar.Open)\n"));
    }

    #[test]
    fn session_time_temp() {
        let out = temps("x = time(\"D\", \"0930-1600\") > 0 ? 1 : 0\n");
        assert_eq!(out.len(), 1);
        assert!(out[0].starts_with("/* time(timeframe.period, \"0930-1600\") */\ntime_"));
    }

    #[test]
    fn non_series_call_is_internal_error() {
        let arena = Bump::new();
        let (ctx, expr) = prepare(&arena, "plot(close)\n");
        let pinegen_parser::ast::Expr::Call(call) = expr else {
            panic!("expected call");
        };
        let mut w = CodeWriter::new(0);
        let err = emit_series_call(call, "plot", "p", &ExprLowerer::new(&ctx), &mut w).unwrap_err();
        assert!(matches!(err, CodegenError::Internal { .. }));
    }
}
