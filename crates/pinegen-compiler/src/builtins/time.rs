//! `time()` and session-filtered `time(tf, session)`.

use pinegen_core::{CodegenError, ConstantValue, quote};
use pinegen_parser::ast::{CallExpr, Expr};

use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;
use crate::host_expr::HostExpr;

type Result<T> = std::result::Result<T, CodegenError>;

const BAR_TIME: &str = "float64(ctx.Data[ctx.BarIndex].Time)";

/// Lower `time()` or `time(tf)` to the current bar's timestamp.
pub fn lower_value(_call: &CallExpr<'_>) -> Result<HostExpr> {
    Ok(HostExpr::float(BAR_TIME))
}

/// The session argument as host code.
enum Session {
    Literal(String),
    Constant(String),
    Invalid,
}

fn session_argument(lowerer: &ExprLowerer<'_, '_>, expr: &Expr<'_>) -> Session {
    if let Some(s) = expr.as_string() {
        return Session::Literal(s.to_string());
    }
    match expr.as_ident() {
        Some(name) => match lowerer.ctx().constants().get(name) {
            Some(ConstantValue::String(_)) => Session::Constant(name.to_string()),
            _ => Session::Invalid,
        },
        None => Session::Invalid,
    }
}

/// Emit a session-filtered `time` call into `{target}Series`.
pub fn emit_session<'ast>(
    call: &'ast CallExpr<'ast>,
    target: &str,
    lowerer: &ExprLowerer<'_, 'ast>,
    w: &mut CodeWriter,
) -> Result<()> {
    let Some(session) = call.arg(1, "session") else {
        w.line(format!("{target}Series.Set({BAR_TIME})"));
        return Ok(());
    };

    let code = match session_argument(lowerer, session) {
        Session::Literal(s) => quote(&s),
        Session::Constant(name) => name,
        Session::Invalid => {
            w.line(format!("{target}Series.Set(math.NaN())"));
            return Ok(());
        }
    };
    w.line(format!("/* time(timeframe.period, {code}) */"));
    w.line(format!(
        "{target}_result := session.TimeFunc(ctx.Data[ctx.BarIndex].Time*1000, ctx.Timeframe, {code}, ctx.Timezone)"
    ));
    w.line(format!("{target}Series.Set({target}_result)"));
    Ok(())
}
