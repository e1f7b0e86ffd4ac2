//! `valuewhen` and `fixnan`: primitives that look back an unbounded
//! distance or carry state across bars.

use pinegen_core::CodegenError;
use pinegen_parser::ast::{CallExpr, Expr};

use super::{TaCall, TaHandler, TaRegistry};
use crate::context::fixnan_state_name;
use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;

type Result<T> = std::result::Result<T, CodegenError>;

/// Value of `source` at the n-th most recent bar where `condition` held.
struct ValueWhen;

impl TaHandler for ValueWhen {
    fn name(&self) -> &'static str {
        "ta.valuewhen"
    }

    fn period_arg<'ast>(&self, _: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>> {
        None
    }

    fn source_args<'ast>(&self, call: &CallExpr<'ast>) -> Vec<&'ast Expr<'ast>> {
        [call.arg(0, "condition"), call.arg(1, "source")]
            .into_iter()
            .flatten()
            .collect()
    }

    fn generate<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        _: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()> {
        call.check_arity(3, 3)?;
        let condition = call.source(call.require(0, "condition")?)?.accessor();
        let source = call.source(call.require(1, "source")?)?.accessor();
        call.require(2, "occurrence")?;
        let occurrence = call.count_or(2, "occurrence", 0)?;

        w.line(format!("/* Inline valuewhen({occurrence}) */"));
        w.open(format!("{target}Series.Set(func() float64 {{"));
        w.line("occurrenceCount := 0");
        w.open("for lookbackOffset := 0; lookbackOffset <= i; lookbackOffset++ {");
        w.open(format!(
            "if cond := {}; !math.IsNaN(cond) && cond != 0 {{",
            condition.at("lookbackOffset")
        ));
        w.open(format!("if occurrenceCount == {occurrence} {{"));
        w.line(format!("return {}", source.at("lookbackOffset")));
        w.close("}");
        w.line("occurrenceCount++");
        w.close("}");
        w.close("}");
        w.line("return math.NaN()");
        w.close("}())");
        Ok(())
    }
}

/// Forward fill through a function-scope state cell.
struct FixNan;

impl TaHandler for FixNan {
    fn name(&self) -> &'static str {
        "fixnan"
    }

    fn period_arg<'ast>(&self, _: &CallExpr<'ast>) -> Option<&'ast Expr<'ast>> {
        None
    }

    fn source_args<'ast>(&self, _: &CallExpr<'ast>) -> Vec<&'ast Expr<'ast>> {
        Vec::new()
    }

    fn generate<'ast>(
        &self,
        call: &TaCall<'_, 'ast>,
        target: &str,
        lowerer: &ExprLowerer<'_, 'ast>,
        w: &mut CodeWriter,
    ) -> Result<()> {
        call.check_arity(1, 1)?;
        let value = lowerer.lower_float(call.require(0, "source")?)?;
        let cell = fixnan_state_name(target);
        if !lowerer.ctx().fixnan_states().contains(&cell) {
            return Err(CodegenError::internal(format!(
                "state cell '{cell}' was not registered"
            )));
        }

        w.line("/* Inline fixnan() */");
        w.open(format!("if !math.IsNaN({}) {{", value.code));
        w.line(format!("{cell} = {}", value.code));
        w.close("}");
        w.line(format!("{target}Series.Set({cell})"));
        Ok(())
    }
}

pub(super) fn register(registry: &mut TaRegistry) {
    registry.register(Box::new(ValueWhen));
    registry.register(Box::new(FixNan));
}
