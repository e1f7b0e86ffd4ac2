//! Names: user declarations, builtins and qualified constants.

use pinegen_core::{CodegenError, ConstantValue, TypeTag, quote, render_float};
use pinegen_parser::ast::Expr;
use pinegen_registry::Builtin;

use super::ExprLowerer;
use crate::host_expr::HostExpr;
use crate::symbols::SymbolKind;

type Result<T> = std::result::Result<T, CodegenError>;

/// Lower an identifier or a dotted name.
///
/// Lookup order: user declarations, builtins, then the constant table.
pub fn lower_name<'ast>(lowerer: &ExprLowerer<'_, 'ast>, expr: &'ast Expr<'ast>) -> Result<HostExpr> {
    let Some(name) = expr.qualified_name() else {
        return Err(CodegenError::unsupported(
            format!("member access '{expr}'"),
            expr.span(),
        ));
    };
    let ctx = lowerer.ctx();

    if let Some(symbol) = ctx.symbols().get(&name) {
        return match &symbol.kind {
            SymbolKind::Series { .. } => Ok(HostExpr::float(format!("{name}Series.GetCurrent()"))),
            SymbolKind::Input(value) => Ok(match value.type_tag() {
                TypeTag::Bool => HostExpr::bool(name),
                TypeTag::String => HostExpr::string(name),
                TypeTag::Float => HostExpr::float(name),
            }),
            SymbolKind::SourceAlias(field) => Ok(HostExpr::float(field.current_bar())),
            SymbolKind::StringAlias(aliased) => lowerer.lower_alias(&name, *aliased),
        };
    }

    match Builtin::lookup(&name) {
        Some(Builtin::Ohlcv(field)) => return Ok(HostExpr::float(field.current_bar())),
        Some(Builtin::Na) => return Ok(HostExpr::float("math.NaN()")),
        Some(Builtin::Scalar(scalar)) => {
            return Ok(match scalar.type_tag() {
                TypeTag::String => HostExpr::string(scalar.host_expr()),
                _ => HostExpr::float(scalar.host_expr()),
            });
        }
        Some(Builtin::Runtime(value)) => return Ok(HostExpr::float(value.current())),
        None => {}
    }

    match ctx.constants().get(&name) {
        Some(value) => Ok(constant_literal(value)),
        None => Err(CodegenError::UndefinedVariable {
            name,
            span: expr.span(),
        }),
    }
}

/// A folded constant as a host literal. Integers render as floats.
pub fn constant_literal(value: &ConstantValue) -> HostExpr {
    match value {
        ConstantValue::Bool(b) => HostExpr::bool(b.to_string()),
        ConstantValue::Int(i) => HostExpr::float(render_float(*i as f64)),
        ConstantValue::Float(f) => HostExpr::float(render_float(f.0)),
        ConstantValue::String(s) => HostExpr::string(quote(s)),
    }
}
