//! Compile-time constant folding.
//!
//! The [`ConstantResolver`] interprets an expression as a typed literal, a
//! lookup in the [`ConstantRegistry`], or numeric arithmetic over those.
//! Lifted inputs and constant-valued declarations are registered there
//! too, so `length * 2` folds when `length` does.

use pinegen_core::ConstantValue;
use pinegen_parser::ast::{BinaryOp, CallExpr, Expr, LiteralKind, UnaryOp};
use pinegen_registry::{ConstantRegistry, canonical_name};

/// Extract the registry key of a name expression (`barmerge.lookahead_on`,
/// `length`). Subscripts and other shapes have no key.
pub fn constant_key(expr: &Expr<'_>) -> Option<String> {
    match expr {
        Expr::Ident(_) | Expr::Member(_) => expr.qualified_name(),
        _ => None,
    }
}

/// Folds expressions to [`ConstantValue`]s.
#[derive(Clone, Copy)]
pub struct ConstantResolver<'a> {
    registry: &'a ConstantRegistry,
}

impl<'a> ConstantResolver<'a> {
    pub fn new(registry: &'a ConstantRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a literal, a registered name, or `+ - * /`, negation and
    /// `round`/`sqrt`/`floor`/`ceil`/`pow` over numeric constants.
    pub fn resolve(&self, expr: &Expr<'_>) -> Option<ConstantValue> {
        match expr {
            Expr::Literal(lit) => Some(match lit.kind {
                LiteralKind::Number(n) => ConstantValue::float(n),
                LiteralKind::Bool(b) => ConstantValue::Bool(b),
                LiteralKind::String(s) => ConstantValue::string(s),
            }),
            Expr::Unary(un) if un.op == UnaryOp::Neg => {
                let n = self.resolve_float(un.argument)?;
                Some(ConstantValue::float(-n))
            }
            Expr::Binary(bin) => {
                let left = self.resolve_float(bin.left)?;
                let right = self.resolve_float(bin.right)?;
                let value = match bin.op {
                    BinaryOp::Add => left + right,
                    BinaryOp::Sub => left - right,
                    BinaryOp::Mul => left * right,
                    BinaryOp::Div if right != 0.0 => left / right,
                    _ => return None,
                };
                finite(value)
            }
            Expr::Call(call) => self.resolve_math(call),
            _ => {
                let key = constant_key(expr)?;
                self.registry.get(&key).cloned()
            }
        }
    }

    fn resolve_math(&self, call: &CallExpr<'_>) -> Option<ConstantValue> {
        let name = call.callee_name()?;
        let args = call.positional();
        let value = match (canonical_name(&name).as_ref(), args) {
            ("math.pow", [base, exp]) => self.resolve_float(base)?.powf(self.resolve_float(exp)?),
            ("math.round", [x, ..]) => self.resolve_float(x)?.round(),
            ("math.sqrt", [x]) => self.resolve_float(x)?.sqrt(),
            ("math.floor", [x]) => self.resolve_float(x)?.floor(),
            ("math.ceil", [x]) => self.resolve_float(x)?.ceil(),
            _ => return None,
        };
        finite(value)
    }

    pub fn resolve_bool(&self, expr: &Expr<'_>) -> Option<bool> {
        self.resolve(expr)?.as_bool()
    }

    pub fn resolve_int(&self, expr: &Expr<'_>) -> Option<i64> {
        self.resolve(expr)?.as_int()
    }

    pub fn resolve_float(&self, expr: &Expr<'_>) -> Option<f64> {
        self.resolve(expr)?.as_float()
    }

    pub fn resolve_string(&self, expr: &Expr<'_>) -> Option<String> {
        match self.resolve(expr)? {
            ConstantValue::String(s) => Some(s),
            _ => None,
        }
    }
}

fn finite(value: f64) -> Option<ConstantValue> {
    value.is_finite().then(|| ConstantValue::float(value))
}
