//! `input` and `input.*`.
//!
//! Inputs are compile-time: the collection pass lifts a declared input to
//! a host constant, and an input call anywhere else folds to its default.

use pinegen_core::{CodegenError, ConstantValue};
use pinegen_parser::ast::CallExpr;

use crate::constants::ConstantResolver;
use crate::expr::ExprLowerer;
use crate::expr::identifiers::constant_literal;
use crate::host_expr::HostExpr;

type Result<T> = std::result::Result<T, CodegenError>;

/// Fold an input's default value to a constant of the input's type.
///
/// The default is the first positional argument or `defval`. Plain
/// `input(x)` keeps the type of `x`, with integral numbers becoming ints.
pub fn default_value(
    resolver: ConstantResolver<'_>,
    name: &str,
    call: &CallExpr<'_>,
) -> Result<ConstantValue> {
    let defval = call
        .arg(0, "defval")
        .ok_or_else(|| CodegenError::malformed(name, "missing default value", call.span))?;
    let value = resolver.resolve(defval).ok_or_else(|| {
        CodegenError::malformed(
            name,
            format!("default value '{defval}' is not a constant"),
            call.span,
        )
    })?;
    let mismatch = |expected: &str| {
        CodegenError::malformed(
            name,
            format!("default value '{defval}' is not {expected}"),
            call.span,
        )
    };

    match name {
        "input.int" => value
            .as_int()
            .map(ConstantValue::Int)
            .ok_or_else(|| mismatch("an integer")),
        "input.float" | "input.price" => value
            .as_float()
            .map(ConstantValue::float)
            .ok_or_else(|| mismatch("a number")),
        "input.bool" => value
            .as_bool()
            .map(ConstantValue::Bool)
            .ok_or_else(|| mismatch("a boolean")),
        "input.string" | "input.session" | "input.timeframe" | "input.symbol" | "input.color" => {
            match value {
                ConstantValue::String(_) => Ok(value),
                _ => Err(mismatch("a string")),
            }
        }
        _ => Ok(match value {
            ConstantValue::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                ConstantValue::Int(f.0 as i64)
            }
            other => other,
        }),
    }
}

/// Lower an input call used as a value.
///
/// `input.source(x)` reads `x`; every other input folds to its default.
pub fn lower<'ast>(
    lowerer: &ExprLowerer<'_, 'ast>,
    call: &'ast CallExpr<'ast>,
    name: &str,
) -> Result<HostExpr> {
    if name == "input.source" {
        let source = call.arg(0, "defval").ok_or_else(|| {
            CodegenError::malformed(name, "missing default source", call.span)
        })?;
        return lowerer.lower(source);
    }
    let value = default_value(lowerer.ctx().resolver(), name, call)?;
    Ok(constant_literal(&value))
}
