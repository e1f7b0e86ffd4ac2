//! `stdev` and `dev`: two passes over one window.

use pinegen_core::CodegenError;
use pinegen_parser::ast::{CallExpr, Expr};

use super::accumulator::{AbsDeviation, Variance};
use super::builder::IndicatorBuilder;
use super::{TaCall, TaHandler, TaRegistry};
use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;

/// Population standard deviation or mean absolute deviation.
struct Deviation {
    name: &'static str,
    standard: bool,
}

impl TaHandler for Deviation {
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
        let builder = IndicatorBuilder::new(call.short_name(), target, period, accessor.as_ref());
        if self.standard {
            builder.build_two_pass(&Variance, Some("math.Sqrt"), w);
        } else {
            builder.build_two_pass(&AbsDeviation, None, w);
        }
        Ok(())
    }
}

pub(super) fn register(registry: &mut TaRegistry) {
    registry.register(Box::new(Deviation {
        name: "ta.stdev",
        standard: true,
    }));
    registry.register(Box::new(Deviation {
        name: "ta.dev",
        standard: false,
    }));
}
