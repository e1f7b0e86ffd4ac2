//! Calls in expression position.
//!
//! Calls that own a series (TA, cross-timeframe, session time and math
//! with TA dependencies) read their temp; the rest lower inline through
//! the builtin handlers.

use pinegen_core::CodegenError;
use pinegen_parser::ast::CallExpr;
use pinegen_registry::{FunctionCategory, canonical_name};
use tracing::trace;

use super::ExprLowerer;
use crate::analyzer::has_session;
use crate::builtins::{input, math, time, value};
use crate::host_expr::HostExpr;
use crate::temp_vars::NodeId;

type Result<T> = std::result::Result<T, CodegenError>;

/// Lower a call.
pub fn lower_call<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    call: &'ast CallExpr<'ast>,
) -> Result<HostExpr> {
    let Some(name) = call.callee_name() else {
        return Err(CodegenError::unsupported(
            format!("call of '{}'", call.callee),
            call.span,
        ));
    };
    let name = canonical_name(&name).into_owned();
    let category = FunctionCategory::of(&name);
    trace!(function = %name, ?category, "lowering call");

    match category {
        FunctionCategory::Ta | FunctionCategory::Security => temp_read(lowerer, call, &name),
        FunctionCategory::Time if has_session(call) => temp_read(lowerer, call, &name),
        FunctionCategory::Time => time::lower_value(call),
        FunctionCategory::Math => match lookup_temp(lowerer, call) {
            Some(read) => Ok(read),
            None => math::lower_inline(lowerer, call, &name),
        },
        FunctionCategory::Value => value::lower(lowerer, call, &name),
        FunctionCategory::Input => input::lower(lowerer, call, &name),
        FunctionCategory::Unknown => Err(CodegenError::unsupported(
            format!("unknown function '{name}'"),
            call.span,
        )),
        FunctionCategory::Plot
        | FunctionCategory::StrategyAction
        | FunctionCategory::Declaration
        | FunctionCategory::DisplayOnly => Err(CodegenError::unsupported(
            format!("'{name}()' used as a value"),
            call.span,
        )),
    }
}

fn lookup_temp(lowerer: &ExprLowerer<'_, '_>, call: &CallExpr<'_>) -> Option<HostExpr> {
    lowerer
        .ctx()
        .temps()
        .lookup(NodeId::of_call(call))
        .map(|temp| HostExpr::float(format!("{}.GetCurrent()", temp.storage())))
}

/// Read the temp the materialization pass allocated for a call.
fn temp_read(lowerer: &ExprLowerer<'_, '_>, call: &CallExpr<'_>, name: &str) -> Result<HostExpr> {
    lookup_temp(lowerer, call).ok_or_else(|| {
        CodegenError::internal(format!("no series registered for call to '{name}'"))
    })
}
