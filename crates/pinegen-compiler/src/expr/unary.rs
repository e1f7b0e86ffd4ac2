use pinegen_core::CodegenError;
use pinegen_parser::ast::{UnaryExpr, UnaryOp};

use super::ExprLowerer;
use crate::host_expr::{HostExpr, Precedence};

type Result<T> = std::result::Result<T, CodegenError>;

/// Lower `not x`, `-x` and `+x`.
pub fn lower_unary<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    un: &'ast UnaryExpr<'ast>,
) -> Result<HostExpr> {
    match un.op {
        UnaryOp::Not => {
            let test = lowerer.lower_condition(un.argument)?;
            Ok(HostExpr::bool(format!("!({test})")).with_prec(Precedence::Unary))
        }
        UnaryOp::Neg => {
            let value = lowerer.lower_float(un.argument)?;
            let code = if value.code.starts_with('-') {
                format!("-({})", value.code)
            } else {
                format!("-{}", value.operand(Precedence::Unary))
            };
            Ok(HostExpr::float(code).with_prec(Precedence::Unary))
        }
        UnaryOp::Plus => lowerer.lower_float(un.argument),
    }
}
