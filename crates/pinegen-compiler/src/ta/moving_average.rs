//! `sma`, `ema`, `rma`, `wma` and the windowed `sum`.

use pinegen_core::CodegenError;
use pinegen_parser::ast::{CallExpr, Expr};

use super::accumulator::{Accumulator, Alpha, Exponential, Sum, WeightedSum};
use super::builder::IndicatorBuilder;
use super::{TaCall, TaHandler, TaRegistry};
use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Average {
    Simple,
    Exponential,
    Smoothed,
    Weighted,
    Total,
}

/// `(source, length)` window folds.
struct MovingAverage {
    name: &'static str,
    kind: Average,
}

impl MovingAverage {
    fn accumulator(&self) -> Box<dyn Accumulator> {
        match self.kind {
            Average::Simple => Box::new(Sum::mean()),
            Average::Exponential => Box::new(Exponential::new(Alpha::Ema)),
            Average::Smoothed => Box::new(Exponential::new(Alpha::Rma)),
            Average::Weighted => Box::new(WeightedSum),
            Average::Total => Box::new(Sum::total()),
        }
    }
}

impl TaHandler for MovingAverage {
    fn name(&self) -> &'static str {
        self.name
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
    ) -> Result<(), CodegenError> {
        call.check_arity(2, 2)?;
        let period = call.period(1, "length")?;
        let source = call.source(call.require(0, "source")?)?;
        let accessor = source.accessor();
        IndicatorBuilder::new(call.short_name(), target, period, accessor.as_ref())
            .build(self.accumulator().as_ref(), w);
        Ok(())
    }
}

pub(super) fn register(registry: &mut TaRegistry) {
    for (name, kind) in [
        ("ta.sma", Average::Simple),
        ("ta.ema", Average::Exponential),
        ("ta.rma", Average::Smoothed),
        ("ta.wma", Average::Weighted),
        ("math.sum", Average::Total),
    ] {
        registry.register(Box::new(MovingAverage { name, kind }));
    }
}
