//! Expression lowering.
//!
//! The [`ExprLowerer`] turns DSL expressions into host expressions. Each
//! result is a [`HostExpr`] carrying its host type, so callers coerce by
//! type and never by inspecting text:
//! - `lower()` - the natural host form of the expression
//! - `lower_float()` - a value fit for float storage or arithmetic
//! - `lower_condition()` - a host `bool` for `if` and ternary tests
//!
//! # Example
//!
//! ```ignore
//! let lowerer = ExprLowerer::new(&ctx);
//!
//! // `close > open` becomes a host bool
//! let test = lowerer.lower_condition(expr)?;
//!
//! // `bull` (a bool-tagged series) becomes a float read
//! let value = lowerer.lower_float(expr)?;
//! ```

mod binary;
mod calls;
pub(crate) mod identifiers;
pub(crate) mod member;
mod ternary;
mod unary;

use std::cell::Cell;

use pinegen_core::{CodegenError, quote, render_float};
use pinegen_parser::ast::{Expr, LiteralKind, MemberProperty};

use crate::boolean::BooleanConverter;
use crate::context::GenContext;
use crate::host_expr::HostExpr;
use crate::series::SourceClassifier;

type Result<T> = std::result::Result<T, CodegenError>;

/// How many string aliases may chain before lowering gives up.
const MAX_ALIAS_DEPTH: u32 = 32;

/// Lowers expressions against a finished generation context.
///
/// Lowering never mutates the context: every temp series and state cell an
/// expression needs was allocated by the passes.
pub struct ExprLowerer<'a, 'ast> {
    /// Generation context with names, constants and temps
    ctx: &'a GenContext<'ast>,
    /// Current string-alias nesting
    alias_depth: Cell<u32>,
}

impl<'a, 'ast> ExprLowerer<'a, 'ast> {
    /// Create a lowerer over a context.
    pub fn new(ctx: &'a GenContext<'ast>) -> Self {
        Self {
            ctx,
            alias_depth: Cell::new(0),
        }
    }

    /// Lower an expression to its natural host form.
    pub fn lower(&self, expr: &'ast Expr<'ast>) -> Result<HostExpr> {
        match expr {
            Expr::Literal(lit) => Ok(match lit.kind {
                LiteralKind::Number(n) => HostExpr::float(render_float(n)),
                LiteralKind::Bool(b) => HostExpr::bool(b.to_string()),
                LiteralKind::String(s) => HostExpr::string(quote(s)),
            }),
            Expr::Ident(_) => identifiers::lower_name(self, expr),
            Expr::Member(member) => match member.property {
                MemberProperty::Field(_) => identifiers::lower_name(self, expr),
                MemberProperty::Index(index) => member::lower_subscript(self, member.object, index),
            },
            Expr::Binary(bin) => binary::lower_binary(self, bin),
            Expr::Logical(log) => binary::lower_logical(self, log),
            Expr::Unary(un) => unary::lower_unary(self, un),
            Expr::Conditional(cond) => ternary::lower_ternary(self, cond),
            Expr::Call(call) => calls::lower_call(self, call),
            Expr::Object(obj) => Err(CodegenError::unsupported(
                "named arguments outside a call",
                obj.span,
            )),
        }
    }

    /// Lower a value for float storage or arithmetic.
    ///
    /// Host booleans become `1.0`/`0.0`; strings are rejected.
    pub fn lower_float(&self, expr: &'ast Expr<'ast>) -> Result<HostExpr> {
        let value = self.lower(expr)?;
        if value.is_string() {
            return Err(CodegenError::unsupported(
                format!("string value '{expr}' used as a number"),
                expr.span(),
            ));
        }
        Ok(BooleanConverter::float_value(value))
    }

    /// Lower an `if` or ternary test to a host boolean.
    pub fn lower_condition(&self, expr: &'ast Expr<'ast>) -> Result<String> {
        let value = self.lower(expr)?;
        if value.is_string() {
            return Err(CodegenError::unsupported(
                format!("string value '{expr}' used as a condition"),
                expr.span(),
            ));
        }
        Ok(BooleanConverter::condition(value))
    }

    /// The context being lowered against.
    pub fn ctx(&self) -> &'a GenContext<'ast> {
        self.ctx
    }

    /// A source classifier over the same context.
    pub fn classifier(&self) -> SourceClassifier<'a, 'ast> {
        SourceClassifier::new(self.ctx)
    }

    /// Lower the expression a string alias stands for.
    fn lower_alias(&self, name: &str, aliased: &'ast Expr<'ast>) -> Result<HostExpr> {
        let depth = self.alias_depth.get();
        if depth >= MAX_ALIAS_DEPTH {
            return Err(CodegenError::unsupported(
                format!("string alias '{name}' refers to itself"),
                aliased.span(),
            ));
        }
        self.alias_depth.set(depth + 1);
        let result = self.lower(aliased);
        self.alias_depth.set(depth);
        result
    }
}
