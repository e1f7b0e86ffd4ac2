//! Lowered host expressions.

use pinegen_core::TypeTag;

/// Host operator precedence, loosest first.
///
/// Matches the host language's five binary levels plus unary and primary
/// expressions, so that lowering only parenthesizes where required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Or,
    And,
    Comparison,
    Additive,
    Multiplicative,
    Unary,
    Primary,
}

/// The result of lowering one DSL expression.
///
/// `ty` is the host-level type of `code`: a comparison is a host `bool`,
/// while a read of a bool-tagged series is a host `float64`.
#[derive(Debug, Clone, PartialEq)]
pub struct HostExpr {
    /// Host source text.
    pub code: String,
    /// Host value type.
    pub ty: TypeTag,
    /// Binding strength of the outermost operator in `code`.
    pub prec: Precedence,
}

impl HostExpr {
    /// A primary float expression (`bar.Close`, `xSeries.GetCurrent()`).
    pub fn float(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ty: TypeTag::Float,
            prec: Precedence::Primary,
        }
    }

    /// A primary bool expression.
    pub fn bool(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ty: TypeTag::Bool,
            prec: Precedence::Primary,
        }
    }

    /// A primary string expression.
    pub fn string(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ty: TypeTag::String,
            prec: Precedence::Primary,
        }
    }

    /// Override the precedence.
    pub fn with_prec(mut self, prec: Precedence) -> Self {
        self.prec = prec;
        self
    }

    /// The code, parenthesized if it binds looser than `min`.
    pub fn operand(&self, min: Precedence) -> String {
        if self.prec < min {
            format!("({})", self.code)
        } else {
            self.code.clone()
        }
    }

    pub fn is_bool(&self) -> bool {
        self.ty.is_bool()
    }

    pub fn is_string(&self) -> bool {
        self.ty.is_string()
    }
}
