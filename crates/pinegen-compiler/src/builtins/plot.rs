//! `plot(series[, title])`.

use pinegen_core::{CodegenError, quote};
use pinegen_parser::ast::CallExpr;

use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;

type Result<T> = std::result::Result<T, CodegenError>;

/// Emit one collector sample for the current bar.
///
/// The title is the second positional string or `title=`; without one the
/// plotted expression's own rendering names the plot.
pub fn emit<'ast>(
    call: &'ast CallExpr<'ast>,
    lowerer: &ExprLowerer<'_, 'ast>,
    w: &mut CodeWriter,
) -> Result<()> {
    let series = call
        .arg(0, "series")
        .ok_or_else(|| CodegenError::malformed("plot", "missing series argument", call.span))?;
    let title = match call.arg(1, "title") {
        Some(title) => title
            .as_string()
            .map(str::to_string)
            .ok_or_else(|| CodegenError::malformed("plot", "title must be a string", call.span))?,
        None => series.to_string(),
    };
    let value = lowerer.lower_float(series)?;
    w.line(format!(
        "collector.Add({}, bar.Time, {}, nil)",
        quote(&title),
        value.code
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::test_support::prepare;
    use bumpalo::Bump;
    use pinegen_parser::ast::Expr;

    fn emit_source(source: &str) -> Result<String> {
        let arena = Bump::new();
        let (ctx, expr) = prepare(&arena, source);
        let Expr::Call(call) = expr else {
            panic!("expected call");
        };
        let mut w = CodeWriter::new(0);
        emit(call, &ExprLowerer::new(&ctx), &mut w)?;
        Ok(w.finish())
    }

    #[test]
    fn titles() {
        assert_eq!(
            emit_source("plot(close, \"Close\")\n").unwrap(),
            "collector.Add(\"Close\", bar.Time, bar.Close, nil)\n"
        );
        assert_eq!(
            emit_source("x = close\nplot(x, title=\"X\", color=color.red)\n").unwrap(),
            "collector.Add(\"X\", bar.Time, xSeries.GetCurrent(), nil)\n"
        );
        assert_eq!(
            emit_source("plot(volume)\n").unwrap(),
            "collector.Add(\"volume\", bar.Time, bar.Volume, nil)\n"
        );
    }

    #[test]
    fn bool_plots_as_float() {
        let out = emit_source("plot(close > open, \"Up\")\n").unwrap();
        assert_eq!(
            out,
            "collector.Add(\"Up\", bar.Time, func() float64 { if bar.Close > bar.Open { return 1.0 } else { return 0.0 } }(), nil)\n"
        );
    }

    #[test]
    fn non_string_title() {
        assert!(matches!(
            emit_source("plot(close, 5)\n").unwrap_err(),
            CodegenError::MalformedCall { .. }
        ));
    }
}
