//! Three-way type inference.
//!
//! Assigns `bool`, `float` or `string` to a declaration from its
//! initializer. The tag decides coercion at read sites and whether a
//! declaration becomes a string alias instead of a series.

use pinegen_core::TypeTag;
use pinegen_parser::ast::{Expr, LiteralKind, MemberProperty, UnaryOp};
use pinegen_registry::{Builtin, ConstantRegistry, canonical_name};

use crate::symbols::SymbolTable;

/// Infers DSL type tags against the current name environment.
pub struct TypeInference<'a, 'ast> {
    symbols: &'a SymbolTable<'ast>,
    constants: &'a ConstantRegistry,
}

impl<'a, 'ast> TypeInference<'a, 'ast> {
    pub fn new(symbols: &'a SymbolTable<'ast>, constants: &'a ConstantRegistry) -> Self {
        Self { symbols, constants }
    }

    /// Infer the tag of an expression.
    pub fn infer(&self, expr: &Expr<'_>) -> TypeTag {
        match expr {
            Expr::Literal(lit) => match lit.kind {
                LiteralKind::Bool(_) => TypeTag::Bool,
                LiteralKind::String(_) => TypeTag::String,
                LiteralKind::Number(_) => TypeTag::Float,
            },
            Expr::Binary(bin) if bin.op.is_comparison() => TypeTag::Bool,
            Expr::Logical(_) => TypeTag::Bool,
            Expr::Unary(un) if un.op == UnaryOp::Not => TypeTag::Bool,
            Expr::Conditional(cond) => self.infer(cond.consequent),
            Expr::Call(call) => {
                let Some(name) = call.callee_name() else {
                    return TypeTag::Float;
                };
                match canonical_name(&name).as_ref() {
                    "ta.crossover" | "ta.crossunder" | "input.bool" | "na" => TypeTag::Bool,
                    "input.string" | "input.session" | "input.timeframe" | "input.symbol"
                    | "input.color" => TypeTag::String,
                    "input" => call
                        .arg(0, "defval")
                        .map_or(TypeTag::Float, |defval| self.infer(defval)),
                    _ => TypeTag::Float,
                }
            }
            Expr::Ident(_) | Expr::Member(_) => self.infer_name(expr),
            _ => TypeTag::Float,
        }
    }

    fn infer_name(&self, expr: &Expr<'_>) -> TypeTag {
        if let Expr::Member(member) = expr
            && let MemberProperty::Index(_) = member.property
        {
            return TypeTag::Float;
        }
        let Some(name) = expr.qualified_name() else {
            return TypeTag::Float;
        };
        if let Some(symbol) = self.symbols.get(&name) {
            return symbol.type_tag();
        }
        match Builtin::lookup(&name) {
            Some(Builtin::Scalar(scalar)) => scalar.type_tag(),
            Some(_) => TypeTag::Float,
            None => self
                .constants
                .get(&name)
                .map_or(TypeTag::Float, |value| value.type_tag()),
        }
    }
}
