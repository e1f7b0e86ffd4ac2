//! Compile-time constant values.
//!
//! [`ConstantValue`] is the tagged union stored in the constant registry:
//! DSL builtins such as `barmerge.lookahead_on` or `color.red`, and the
//! typed default values of lifted `input.*` declarations.

use ordered_float::OrderedFloat;

use crate::TypeTag;

/// A typed compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(String),
}

impl ConstantValue {
    /// Construct a float constant.
    pub fn float(value: f64) -> Self {
        ConstantValue::Float(OrderedFloat(value))
    }

    /// Construct a string constant.
    pub fn string(value: impl Into<String>) -> Self {
        ConstantValue::String(value.into())
    }

    /// The boolean value, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstantValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer value. Floats with no fractional part convert.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstantValue::Int(i) => Some(*i),
            ConstantValue::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(f.0 as i64),
            _ => None,
        }
    }

    /// The numeric value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConstantValue::Int(i) => Some(*i as f64),
            ConstantValue::Float(f) => Some(f.0),
            _ => None,
        }
    }

    /// The string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstantValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The DSL type tag of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            ConstantValue::Bool(_) => TypeTag::Bool,
            ConstantValue::Int(_) | ConstantValue::Float(_) => TypeTag::Float,
            ConstantValue::String(_) => TypeTag::String,
        }
    }

    /// Render as a host (Go) literal.
    pub fn to_host_literal(&self) -> String {
        match self {
            ConstantValue::Bool(b) => b.to_string(),
            ConstantValue::Int(i) => i.to_string(),
            ConstantValue::Float(f) => render_float(f.0),
            ConstantValue::String(s) => quote(s),
        }
    }
}

/// Render a float as a host literal that always reads back as a float.
///
/// `20.0`, `0.015` and `1e-7` render as written; NaN and infinities map to
/// the host's `math` helpers.
pub fn render_float(value: f64) -> String {
    if value.is_nan() {
        "math.NaN()".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            "math.Inf(1)".to_string()
        } else {
            "math.Inf(-1)".to_string()
        }
    } else {
        format!("{value:?}")
    }
}

/// Render a number the way a generic value formatter does: integral values
/// without a fractional part (`50`), others in shortest form (`0.5`).
pub fn render_plain(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Quote a string as a host double-quoted literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
