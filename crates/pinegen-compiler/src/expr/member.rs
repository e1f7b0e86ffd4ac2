//! Series subscripts `x[k]`.
//!
//! A literal offset (or one folding to a constant) reads the series
//! directly: `bar.Close`, a bounds-checked `ctx.Data[i-k]` read, or
//! `xSeries.Get(k)`. Any other offset is lowered, truncated to an int and
//! checked against the bar array at run time.

use pinegen_core::CodegenError;
use pinegen_parser::ast::Expr;
use pinegen_registry::{Builtin, OhlcvField};

use super::ExprLowerer;
use crate::host_expr::HostExpr;
use crate::series::SeriesSource;
use crate::temp_vars::NodeId;

type Result<T> = std::result::Result<T, CodegenError>;

/// A resolved subscript offset.
enum Offset {
    Fixed(u32),
    Dynamic(String),
}

/// Lower `object[index]`.
pub fn lower_subscript<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    object: &'ast Expr<'ast>,
    index: &'ast Expr<'ast>,
) -> Result<HostExpr> {
    let offset = resolve_offset(lowerer, index)?;
    let source = subscript_source(lowerer, object)?;

    Ok(HostExpr::float(match (source, offset) {
        (SeriesSource::Ohlcv(field), Offset::Fixed(k)) => field.historical(k),
        (SeriesSource::Ohlcv(field), Offset::Dynamic(e)) => dynamic_bar_read(field, &e),
        (SeriesSource::Series(storage), Offset::Fixed(k)) => format!("{storage}.Get({k})"),
        (SeriesSource::Series(storage), Offset::Dynamic(e)) => format!("{storage}.Get(int({e}))"),
    }))
}

/// Literal offsets, and names folding to numeric constants, are fixed.
fn resolve_offset<'ast>(lowerer: &ExprLowerer<'_, 'ast>, index: &'ast Expr<'ast>) -> Result<Offset> {
    let Some(value) = lowerer.ctx().resolver().resolve_float(index) else {
        return Ok(Offset::Dynamic(lowerer.lower_float(index)?.code));
    };
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(CodegenError::unsupported(
            format!("history offset '{index}'"),
            index.span(),
        ));
    }
    Ok(Offset::Fixed(value as u32))
}

/// What `object` reads from when subscripted.
fn subscript_source<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    object: &'ast Expr<'ast>,
) -> Result<SeriesSource> {
    if let Expr::Call(call) = object {
        return lowerer
            .ctx()
            .temps()
            .lookup(NodeId::of_call(call))
            .map(|temp| SeriesSource::Series(temp.storage()))
            .ok_or_else(|| {
                CodegenError::unsupported(format!("history of '{object}'"), object.span())
            });
    }

    if let Some(source) = lowerer.classifier().classify_name(object) {
        return Ok(source);
    }

    match object.qualified_name() {
        Some(name)
            if lowerer.ctx().symbols().get(&name).is_none()
                && Builtin::lookup(&name).is_none() =>
        {
            Err(CodegenError::UndefinedVariable {
                name,
                span: object.span(),
            })
        }
        _ => Err(CodegenError::unsupported(
            format!("history of '{object}'"),
            object.span(),
        )),
    }
}

/// Bounds-checked read of a builtin field at a run-time offset.
fn dynamic_bar_read(field: OhlcvField, offset: &str) -> String {
    format!(
        "func() float64 {{ idx := i - int({offset}); if idx >= 0 && idx < len(ctx.Data) {{ return ctx.Data[idx].{} }}; return math.NaN() }}()",
        field.host_field()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::prepare;
    use bumpalo::Bump;
    use pretty_assertions::assert_eq;

    fn lower(source: &str) -> Result<String> {
        let arena = Bump::new();
        let (ctx, expr) = prepare(&arena, source);
        ExprLowerer::new(&ctx).lower(expr).map(|e| e.code)
    }

    #[test]
    fn builtin_fixed_offsets() {
        assert_eq!(lower("close[0]\n").unwrap(), "bar.Close");
        assert_eq!(
            lower("close[1]\n").unwrap(),
            "func() float64 { if i-1 >= 0 { return ctx.Data[i-1].Close }; return math.NaN() }()"
        );
    }

    #[test]
    fn builtin_dynamic_offset() {
        assert_eq!(
            lower("n = bar_index % 3\nhigh[n]\n").unwrap(),
            "func() float64 { idx := i - int(nSeries.GetCurrent()); if idx >= 0 && idx < len(ctx.Data) { return ctx.Data[idx].High }; return math.NaN() }()"
        );
    }

    #[test]
    fn user_series_offsets() {
        assert_eq!(lower("sma20 = ta.sma(close, 20)\nsma20[1]\n").unwrap(), "sma20Series.Get(1)");
        assert_eq!(
            lower("x = close\nk = 2\nx[k]\n").unwrap(),
            "xSeries.Get(int(kSeries.GetCurrent()))"
        );
    }

    #[test]
    fn input_constant_offsets_fold() {
        assert_eq!(lower("lb = input.int(3)\nx = close\nx[lb]\n").unwrap(), "xSeries.Get(3)");
    }

    #[test]
    fn aliases_and_runtime_values() {
        assert_eq!(
            lower("src = input.source(low)\nsrc[2]\n").unwrap(),
            "func() float64 { if i-2 >= 0 { return ctx.Data[i-2].Low }; return math.NaN() }()"
        );
        assert_eq!(
            lower("strategy.equity[1]\n").unwrap(),
            "strategy_equitySeries.Get(1)"
        );
    }

    #[test]
    fn subscripted_calls_read_their_temp() {
        let code = lower("x = ta.sma(close, 10)[1]\n").unwrap();
        assert!(code.starts_with("ta_sma_10_"));
        assert!(code.ends_with("Series.Get(1)"));
    }

    #[test]
    fn rejected_offsets() {
        assert!(matches!(
            lower("x = close\nx[-1]\n").unwrap_err(),
            CodegenError::Unsupported { .. }
        ));
        assert!(matches!(
            lower("y[1]\n").unwrap_err(),
            CodegenError::UndefinedVariable { .. }
        ));
        assert!(matches!(
            lower("n = input(3)\nn[1]\n").unwrap_err(),
            CodegenError::Unsupported { .. }
        ));
    }
}
