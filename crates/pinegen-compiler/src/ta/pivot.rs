//! `pivothigh` and `pivotlow`.
//!
//! A pivot is confirmed `rightbars` bars after it happens, so the value is
//! written on the confirming bar and reads the center `rightbars` back.

use pinegen_core::CodegenError;
use pinegen_parser::ast::{CallExpr, Expr};
use pinegen_registry::OhlcvField;

use super::warmup::WarmupChecker;
use super::{TaCall, TaHandler, TaRegistry};
use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;
use crate::series::{SeriesAccessor, SeriesSource};

type Result<T> = std::result::Result<T, CodegenError>;

struct Pivot {
    name: &'static str,
    high: bool,
}

impl Pivot {
    /// `(source, left, right)` with an explicit source, else `(left, right)`.
    fn has_source(call: &CallExpr<'_>) -> bool {
        call.positional().len() == 3 || call.named_arg("source").is_some()
    }

    fn bar_args(call: &CallExpr<'_>) -> (usize, usize) {
        if Self::has_source(call) { (1, 2) } else { (0, 1) }
    }
}

impl TaHandler for Pivot {
    fn name(&self) -> &'static str {
        self.name
    }

    fn period_arg<'ast>(&self, _: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>> {
        None
    }

    fn source_args<'ast>(&self, call: &CallExpr<'ast>) -> Vec<&'ast Expr<'ast>> {
        if Self::has_source(call) {
            call.arg(0, "source").into_iter().collect()
        } else {
            Vec::new()
        }
    }

    fn generate<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        _: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()> {
        call.check_arity(2, 3)?;
        let (left_index, right_index) = Self::bar_args(call.call());
        let left = call.count_or(left_index, "leftbars", 0)?;
        let right = call.count_or(right_index, "rightbars", 0)?;
        if call.arg(left_index, "leftbars").is_none() || call.arg(right_index, "rightbars").is_none()
        {
            return Err(call.malformed("expected 'leftbars' and 'rightbars'"));
        }
        let source = if Self::has_source(call.call()) {
            call.source(call.require(0, "source")?)?
        } else if self.high {
            SeriesSource::Ohlcv(OhlcvField::High)
        } else {
            SeriesSource::Ohlcv(OhlcvField::Low)
        };
        let a = source.accessor();
        let span = left + right;
        let beyond = if self.high { ">" } else { "<" };

        let gate = WarmupChecker::new(span + 1);
        w.line(format!("/* Inline {}({left}, {right}) */", call.short_name()));
        gate.open(target, w);
        w.line(format!("pivotCenter := {}", a.at(&right.to_string())));
        w.line("isPivot := !math.IsNaN(pivotCenter)");
        w.open(format!("for j := 0; j <= {span} && isPivot; j++ {{"));
        w.open(format!("if j == {right} {{"));
        w.line("continue");
        w.close("}");
        w.line(format!("v := {}", a.at("j")));
        w.open(format!("if math.IsNaN(v) || v {beyond} pivotCenter {{"));
        w.line("isPivot = false");
        w.close("}");
        w.close("}");
        w.open("if isPivot {");
        w.line(format!("{target}Series.Set(pivotCenter)"));
        w.reopen("} else {");
        w.line(format!("{target}Series.Set(math.NaN())"));
        w.close("}");
        gate.close(w);
        Ok(())
    }
}

pub(super) fn register(registry: &mut TaRegistry) {
    registry.register(Box::new(Pivot {
        name: "ta.pivothigh",
        high: true,
    }));
    registry.register(Box::new(Pivot {
        name: "ta.pivotlow",
        high: false,
    }));
}
