//! Arithmetic, comparison and logical operators.

use pinegen_core::CodegenError;
use pinegen_parser::ast::{BinaryExpr, BinaryOp, LogicalExpr};

use super::ExprLowerer;
use crate::boolean::BooleanConverter;
use crate::host_expr::{HostExpr, Precedence};

type Result<T> = std::result::Result<T, CodegenError>;

/// Lower a binary operation.
pub fn lower_binary<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    bin: &'ast BinaryExpr<'ast>,
) -> Result<HostExpr> {
    let left = lowerer.lower(bin.left)?;
    let right = lowerer.lower(bin.right)?;
    let op = bin.op.as_str();

    match (left.is_string(), right.is_string()) {
        (true, true) => {
            return match bin.op {
                BinaryOp::Add => Ok(HostExpr::string(format!(
                    "{} + {}",
                    left.operand(Precedence::Additive),
                    right.operand(Precedence::Multiplicative)
                ))
                .with_prec(Precedence::Additive)),
                _ if bin.op.is_comparison() => Ok(HostExpr::bool(format!(
                    "{} {op} {}",
                    left.operand(Precedence::Additive),
                    right.operand(Precedence::Additive)
                ))
                .with_prec(Precedence::Comparison)),
                _ => Err(CodegenError::unsupported(
                    format!("operator '{op}' on strings"),
                    bin.span,
                )),
            };
        }
        (false, false) => {}
        _ => {
            return Err(CodegenError::unsupported(
                format!("operator '{op}' between a string and a number"),
                bin.span,
            ));
        }
    }

    let left = BooleanConverter::float_value(left);
    let right = BooleanConverter::float_value(right);

    Ok(match bin.op {
        _ if bin.op.is_comparison() => HostExpr::bool(format!(
            "{} {op} {}",
            left.operand(Precedence::Additive),
            right.operand(Precedence::Additive)
        ))
        .with_prec(Precedence::Comparison),
        BinaryOp::Mod => HostExpr::float(format!("math.Mod({}, {})", left.code, right.code)),
        BinaryOp::Add | BinaryOp::Sub => HostExpr::float(format!(
            "{} {op} {}",
            left.operand(Precedence::Additive),
            right.operand(Precedence::Multiplicative)
        ))
        .with_prec(Precedence::Additive),
        _ => HostExpr::float(format!(
            "{} {op} {}",
            left.operand(Precedence::Multiplicative),
            right.operand(Precedence::Unary)
        ))
        .with_prec(Precedence::Multiplicative),
    })
}

/// Lower `and` / `or`. Each operand is coerced to a host bool once.
pub fn lower_logical<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    log: &'ast LogicalExpr<'ast>,
) -> Result<HostExpr> {
    let left = lowerer.lower(log.left)?;
    let right = lowerer.lower(log.right)?;
    if left.is_string() || right.is_string() {
        return Err(CodegenError::unsupported(
            format!("'{}' on a string", log.op),
            log.span,
        ));
    }
    let left = BooleanConverter::logical_operand(left);
    let right = BooleanConverter::logical_operand(right);
    Ok(HostExpr::bool(format!(
        "({} {} {})",
        left.operand(Precedence::Comparison),
        log.op.host_op(),
        right.operand(Precedence::Comparison)
    )))
}
