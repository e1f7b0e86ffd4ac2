//! Strategy actions: `strategy.entry`, `strategy.close`, `strategy.close_all`.

use pinegen_core::{CodegenError, quote, render_plain};
use pinegen_parser::ast::CallExpr;

use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;

type Result<T> = std::result::Result<T, CodegenError>;

/// Emit the runtime call for a strategy action statement.
pub fn emit<'ast>(
    call: &'ast CallExpr<'ast>,
    name: &str,
    lowerer: &ExprLowerer<'_, 'ast>,
    w: &mut CodeWriter,
) -> Result<()> {
    match name {
        "strategy.entry" => {
            let id = trade_id(call, name, lowerer)?;
            let direction = direction(call, name, lowerer)?;
            let qty = match call.arg(2, "qty") {
                Some(qty) => match lowerer.ctx().resolver().resolve_float(qty) {
                    Some(n) => render_plain(n),
                    None => lowerer.lower_float(qty)?.code,
                },
                None => "1".to_string(),
            };
            w.line(format!("strat.Entry({id}, {direction}, {qty})"));
        }
        "strategy.close" => {
            let id = trade_id(call, name, lowerer)?;
            w.line(format!("strat.Close({id}, bar.Close, bar.Time)"));
        }
        "strategy.close_all" => w.line("strat.CloseAll(bar.Close, bar.Time)"),
        _ => {
            return Err(CodegenError::unsupported(
                format!("strategy action '{name}'"),
                call.span,
            ));
        }
    }
    Ok(())
}

fn trade_id(call: &CallExpr<'_>, name: &str, lowerer: &ExprLowerer<'_, '_>) -> Result<String> {
    let id = call
        .arg(0, "id")
        .ok_or_else(|| CodegenError::malformed(name, "missing trade id", call.span))?;
    lowerer
        .ctx()
        .resolver()
        .resolve_string(id)
        .map(|s| quote(&s))
        .ok_or_else(|| CodegenError::malformed(name, format!("trade id '{id}' is not a string"), call.span))
}

fn direction(call: &CallExpr<'_>, name: &str, lowerer: &ExprLowerer<'_, '_>) -> Result<&'static str> {
    let dir = call
        .arg(1, "direction")
        .ok_or_else(|| CodegenError::malformed(name, "missing direction", call.span))?;
    match lowerer.ctx().resolver().resolve_int(dir) {
        Some(1) => Ok("strategy.Long"),
        Some(-1) => Ok("strategy.Short"),
        _ => Err(CodegenError::malformed(
            name,
            format!("direction '{dir}' is not strategy.long or strategy.short"),
            call.span,
        )),
    }
}
