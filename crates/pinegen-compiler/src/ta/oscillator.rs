//! `rsi`, `atr` and `change`.
//!
//! These read two offsets per step (a value and its predecessor), so they
//! drive their loops directly instead of going through an accumulator.

use pinegen_core::CodegenError;
use pinegen_parser::ast::{CallExpr, Expr};
use pinegen_registry::OhlcvField;

use super::warmup::WarmupChecker;
use super::{TaCall, TaHandler, TaRegistry};
use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;
use crate::series::{OhlcvAccessor, SeriesAccessor};

type Result<T> = std::result::Result<T, CodegenError>;

/// Relative strength index with Wilder smoothing of gains and losses.
struct Rsi;

impl TaHandler for Rsi {
    fn name(&self) -> &'static str {
        "ta.rsi"
    }

    fn period_arg<'ast>(&self, call: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>> {
        call.arg(1, "length")
    }

    fn source_args<'ast>(&self, call: &CallExpr<'ast>) -> Vec<&'ast Expr<'ast>> {
        call.arg(0, "source").into_iter().collect()
    }

    fn generate<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        _: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()> {
        call.check_arity(2, 2)?;
        let period = call.period(1, "length")?;
        let source = call.source(call.require(0, "source")?)?;
        let a = source.accessor();
        let nan_check = a.needs_nan_check();
        let seed = period - 1;

        // One extra bar for the first difference.
        let gate = WarmupChecker::new(period + 1);
        w.line(format!("/* Inline rsi({period}) */"));
        gate.open(target, w);
        w.line(format!("alpha := 1.0 / {period}.0"));
        w.line("avgGain := 0.0");
        w.line("avgLoss := 0.0");
        if nan_check {
            w.line("hasNaN := false");
        }
        w.open(format!("for j := {seed}; j >= 0; j-- {{"));
        w.line(format!("cur := {}", a.at("j")));
        w.line(format!("prev := {}", a.at("j+1")));
        if nan_check {
            w.open("if math.IsNaN(cur) || math.IsNaN(prev) {");
            w.line("hasNaN = true");
            w.line("break");
            w.close("}");
        }
        w.line("change := cur - prev");
        w.line("gain := math.Max(change, 0)");
        w.line("loss := math.Max(-change, 0)");
        w.open(format!("if j == {seed} {{"));
        w.line("avgGain = gain");
        w.line("avgLoss = loss");
        w.reopen("} else {");
        w.line("avgGain = alpha*gain + (1-alpha)*avgGain");
        w.line("avgLoss = alpha*loss + (1-alpha)*avgLoss");
        w.close("}");
        w.close("}");

        if nan_check {
            w.open("if hasNaN {");
            w.line(format!("{target}Series.Set(math.NaN())"));
            w.reopen("} else if avgLoss == 0 {");
        } else {
            w.open("if avgLoss == 0 {");
        }
        w.line(format!("{target}Series.Set(100.0)"));
        w.reopen("} else {");
        w.line("rs := avgGain / avgLoss");
        w.line(format!("{target}Series.Set(100.0 - 100.0/(1.0+rs))"));
        w.close("}");
        gate.close(w);
        Ok(())
    }
}

/// Average true range over the chart's own bars.
struct Atr;

impl TaHandler for Atr {
    fn name(&self) -> &'static str {
        "ta.atr"
    }

    fn period_arg<'ast>(&self, call: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>> {
        call.arg(0, "length")
    }

    fn source_args<'ast>(&self, _: &CallExpr<'ast>) -> Vec<&'ast Expr<'ast>> {
        Vec::new()
    }

    fn generate<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        _: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()> {
        call.check_arity(1, 1)?;
        let period = call.period(0, "length")?;
        let high = OhlcvAccessor::new(OhlcvField::High);
        let low = OhlcvAccessor::new(OhlcvField::Low);
        let close = OhlcvAccessor::new(OhlcvField::Close);
        let seed = period - 1;

        let gate = WarmupChecker::new(period + 1);
        w.line(format!("/* Inline atr({period}) */"));
        gate.open(target, w);
        w.line(format!("alpha := 1.0 / {period}.0"));
        w.line("atr := 0.0");
        w.open(format!("for j := {seed}; j >= 0; j-- {{"));
        w.line(format!("hi := {}", high.at("j")));
        w.line(format!("lo := {}", low.at("j")));
        w.line(format!("prevClose := {}", close.at("j+1")));
        w.line("tr := math.Max(hi-lo, math.Max(math.Abs(hi-prevClose), math.Abs(lo-prevClose)))");
        w.open(format!("if j == {seed} {{"));
        w.line("atr = tr");
        w.reopen("} else {");
        w.line("atr = alpha*tr + (1-alpha)*atr");
        w.close("}");
        w.close("}");
        w.line(format!("{target}Series.Set(atr)"));
        gate.close(w);
        Ok(())
    }
}

/// `source - source[length]`.
struct Change;

impl TaHandler for Change {
    fn name(&self) -> &'static str {
        "ta.change"
    }

    fn period_arg<'ast>(&self, _: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>> {
        None
    }

    fn source_args<'ast>(&self, call: &CallExpr<'ast>) -> Vec<&'ast Expr<'ast>> {
        call.arg(0, "source").into_iter().collect()
    }

    fn generate<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        _: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()> {
        call.check_arity(1, 2)?;
        let offset = call.count_or(1, "length", 1)?;
        let source = call.source(call.require(0, "source")?)?;
        let a = source.accessor();

        let gate = WarmupChecker::new(offset + 1);
        w.line(format!("/* Inline change({offset}) */"));
        gate.open(target, w);
        w.line(format!(
            "{target}Series.Set({} - {})",
            a.at("0"),
            a.at(&offset.to_string())
        ));
        gate.close(w);
        Ok(())
    }
}

pub(super) fn register(registry: &mut TaRegistry) {
    registry.register(Box::new(Rsi));
    registry.register(Box::new(Atr));
    registry.register(Box::new(Change));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::context::GenContext;
    use bumpalo::Bump;
    use pinegen_parser::Parser;
    use pinegen_parser::ast::Stmt;
    use pretty_assertions::assert_eq;

    fn emit(source: &str, name: &str) -> String {
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).unwrap();
        let Stmt::Expr(stmt) = program.body()[0] else {
            panic!("expected expression");
        };
        let Expr::Call(call) = stmt.expr else {
            panic!("expected call");
        };
        let ctx = GenContext::new(GeneratorConfig::default());
        let lowerer = ExprLowerer::new(&ctx);
        let mut w = CodeWriter::new(0);
        ctx.ta()
            .generate_inline(&TaCall::new(name, call, &ctx), "t", &lowerer, &mut w)
            .unwrap();
        w.finish()
    }

    #[test]
    fn change_over_close() {
        assert_eq!(
            emit("ta.change(close)\n", "ta.change"),
            "/* Inline change(1) */
if ctx.BarIndex < 1 {
\ttSeries.Set(math.NaN())
} else {
\ttSeries.Set(ctx.Data[i].Close - ctx.Data[i-1].Close)
}
"
        );
    }

    #[test]
    fn change_over_zero_bars_is_zero() {
        assert_eq!(
            emit("ta.change(close, 0)\n", "ta.change"),
            "/* Inline change(0) */
if ctx.BarIndex < 0 {
\ttSeries.Set(math.NaN())
} else {
\ttSeries.Set(ctx.Data[i].Close - ctx.Data[i].Close)
}
"
        );
    }

    #[test]
    fn change_rejects_negative_offset() {
        let arena = Bump::new();
        let program = Parser::parse("ta.change(close, -2)\n", &arena).unwrap();
        let Stmt::Expr(stmt) = program.body()[0] else {
            panic!("expected expression");
        };
        let Expr::Call(call) = stmt.expr else {
            panic!("expected call");
        };
        let ctx = GenContext::new(GeneratorConfig::default());
        let lowerer = ExprLowerer::new(&ctx);
        let mut w = CodeWriter::new(0);
        let err = ctx
            .ta()
            .generate_inline(&TaCall::new("ta.change", call, &ctx), "t", &lowerer, &mut w)
            .unwrap_err();
        assert!(matches!(err, CodegenError::MalformedCall { .. }));
    }

    #[test]
    fn atr_needs_one_extra_bar() {
        let out = emit("ta.atr(14)\n", "ta.atr");
        assert!(out.starts_with("/* Inline atr(14) */\nif ctx.BarIndex < 14 {\n"));
        assert!(out.contains("\t\tprevClose := ctx.Data[i-(j+1)].Close\n"));
        assert!(out.contains("\tfor j := 13; j >= 0; j-- {\n"));
        assert!(out.ends_with("\ttSeries.Set(atr)\n}\n"));
    }

    #[test]
    fn rsi_over_ohlcv_has_no_nan_guard() {
        let out = emit("ta.rsi(close, 14)\n", "ta.rsi");
        assert!(out.contains("\talpha := 1.0 / 14.0\n"));
        assert!(!out.contains("hasNaN"));
        assert!(out.contains("\tif avgLoss == 0 {\n\t\ttSeries.Set(100.0)\n"));
        assert!(out.contains("tSeries.Set(100.0 - 100.0/(1.0+rs))"));
    }

    #[test]
    fn atr_rejects_missing_length() {
        let arena = Bump::new();
        let program = Parser::parse("ta.atr()\n", &arena).unwrap();
        let Stmt::Expr(stmt) = program.body()[0] else {
            panic!("expected expression");
        };
        let Expr::Call(call) = stmt.expr else {
            panic!("expected call");
        };
        let ctx = GenContext::new(GeneratorConfig::default());
        let lowerer = ExprLowerer::new(&ctx);
        let mut w = CodeWriter::new(0);
        let err = ctx
            .ta()
            .generate_inline(&TaCall::new("ta.atr", call, &ctx), "t", &lowerer, &mut w)
            .unwrap_err();
        assert!(matches!(err, CodegenError::MalformedCall { ref function, .. } if function == "ta.atr"));
    }
}
