//! Boolean coercion at use sites.
//!
//! Every series stores `float64`, so a boolean written into a series reads
//! back as `0.0`/`1.0`. The converter turns lowered operands into the host
//! shape each context needs. It looks at the operand's host type, never at
//! its text, and each rule is applied at most once per operand.

use crate::host_expr::{HostExpr, Precedence};

/// Applies the coercion rules to already-lowered operands.
pub struct BooleanConverter;

impl BooleanConverter {
    /// Rule 1: an `if` or ternary test.
    ///
    /// Host booleans pass through; float reads gain `!= 0`.
    pub fn condition(value: HostExpr) -> String {
        if value.is_bool() {
            value.code
        } else {
            format!("{} != 0", value.operand(Precedence::Additive))
        }
    }

    /// Rule 2: an operand of `&&` / `||`.
    ///
    /// Comparisons, logical expressions and known-bool calls pass through;
    /// anything else becomes `(x != 0)`.
    pub fn logical_operand(value: HostExpr) -> HostExpr {
        if value.is_bool() {
            value
        } else {
            HostExpr::bool(format!("({} != 0)", value.operand(Precedence::Additive)))
        }
    }

    /// A value written into float storage or used in arithmetic.
    ///
    /// `true`/`false` fold to `1.0`/`0.0`; other booleans are wrapped in an
    /// inline function returning `1.0` or `0.0`.
    pub fn float_value(value: HostExpr) -> HostExpr {
        if !value.is_bool() {
            return value;
        }
        match value.code.as_str() {
            "true" => HostExpr::float("1.0"),
            "false" => HostExpr::float("0.0"),
            _ => HostExpr::float(format!(
                "func() float64 {{ if {} {{ return 1.0 }} else {{ return 0.0 }} }}()",
                value.code
            )),
        }
    }
}
