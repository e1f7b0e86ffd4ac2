//! Call-site analysis.
//!
//! The [`ExpressionAnalyzer`] walks an expression tree and reports every
//! call it contains, innermost first, with the call's canonical name and
//! fingerprint. The free functions here answer the structural questions
//! the passes and emitters share: which calls become series, which
//! sources can be read at an offset, and which declarations write a call
//! straight into their own series.

use pinegen_core::fingerprint;
use pinegen_parser::ast::{CallExpr, DeclKind, Expr, MemberProperty};
use pinegen_registry::{Builtin, FunctionCategory, canonical_name};

use crate::context::GenContext;
use crate::symbols::SymbolKind;
use crate::ta::period_label;
use crate::temp_vars::NodeId;

/// One call site found by the analyzer.
#[derive(Debug, Clone)]
pub struct CallInfo<'ast> {
    /// Identity of the call node.
    pub node: NodeId,
    /// The call itself.
    pub call: &'ast CallExpr<'ast>,
    /// Canonical function name.
    pub name: String,
    /// Category of the canonical name.
    pub category: FunctionCategory,
    /// Fingerprint over the canonical name and rendered arguments.
    pub fingerprint: String,
}

impl<'ast> CallInfo<'ast> {
    /// Describe a call. Calls with a computed callee have no name.
    pub fn of(call: &'ast CallExpr<'ast>) -> Option<Self> {
        let name = canonical_name(&call.callee_name()?).into_owned();
        let args: Vec<String> = call.arguments.iter().map(ToString::to_string).collect();
        Some(Self {
            node: NodeId::of_call(call),
            call,
            category: FunctionCategory::of(&name),
            fingerprint: fingerprint(&name, &args),
            name,
        })
    }
}

/// Collects call sites in post-order.
pub struct ExpressionAnalyzer<'ast> {
    calls: Vec<CallInfo<'ast>>,
}

impl<'ast> ExpressionAnalyzer<'ast> {
    /// Every call in `expr`, innermost first. The inner expression of a
    /// cross-timeframe call is evaluated elsewhere and is not descended.
    pub fn collect(expr: &'ast Expr<'ast>) -> Vec<CallInfo<'ast>> {
        let mut analyzer = Self { calls: Vec::new() };
        analyzer.visit(expr);
        analyzer.calls
    }

    fn visit(&mut self, expr: &'ast Expr<'ast>) {
        match expr {
            Expr::Literal(_) | Expr::Ident(_) => {}
            Expr::Binary(bin) => {
                self.visit(bin.left);
                self.visit(bin.right);
            }
            Expr::Logical(log) => {
                self.visit(log.left);
                self.visit(log.right);
            }
            Expr::Unary(un) => self.visit(un.argument),
            Expr::Conditional(cond) => {
                self.visit(cond.test);
                self.visit(cond.consequent);
                self.visit(cond.alternate);
            }
            Expr::Member(member) => {
                self.visit(member.object);
                if let MemberProperty::Index(index) = member.property {
                    self.visit(index);
                }
            }
            Expr::Object(obj) => {
                for prop in obj.properties {
                    self.visit(&prop.value);
                }
            }
            Expr::Call(call) => {
                let info = CallInfo::of(call);
                let is_security = info
                    .as_ref()
                    .is_some_and(|i| i.category == FunctionCategory::Security);
                if !is_security {
                    for arg in call.arguments {
                        self.visit(arg);
                    }
                }
                if let Some(info) = info {
                    self.calls.push(info);
                }
            }
        }
    }
}

// ==========================================================================
// Structural predicates
// ==========================================================================

/// Whether a `time(...)` call carries a session argument.
pub fn has_session(call: &CallExpr<'_>) -> bool {
    call.positional().len() >= 2 || call.named_arg("session").is_some()
}

/// Whether evaluating `expr` reads a TA, cross-timeframe or session-time
/// series.
pub fn has_series_dependency(expr: &Expr<'_>) -> bool {
    ExpressionAnalyzer::collect(expr)
        .iter()
        .any(|info| is_materialized(info.call))
}

/// Whether a call gets its own backing series when it is not the direct
/// initializer of a declaration.
pub fn is_materialized(call: &CallExpr<'_>) -> bool {
    let Some(name) = call.callee_name() else {
        return false;
    };
    let name = canonical_name(&name);
    match FunctionCategory::of(&name) {
        FunctionCategory::Ta | FunctionCategory::Security => true,
        FunctionCategory::Time => has_session(call),
        FunctionCategory::Math => call.arguments.iter().any(has_series_dependency),
        _ => false,
    }
}

/// Whether `expr` can be read at arbitrary offsets as it stands: a builtin
/// field or alias, a user or runtime series, or a call that is
/// materialized.
pub fn is_simple_source(expr: &Expr<'_>, ctx: &GenContext<'_>) -> bool {
    match expr {
        Expr::Call(call) => is_materialized(call),
        Expr::Ident(_) | Expr::Member(_) => {
            let Some(name) = expr.qualified_name() else {
                return false;
            };
            if let Some(symbol) = ctx.symbols().get(&name) {
                return matches!(
                    symbol.kind,
                    SymbolKind::Series { .. } | SymbolKind::SourceAlias(_)
                );
            }
            matches!(
                Builtin::lookup(&name),
                Some(Builtin::Ohlcv(_) | Builtin::Runtime(_))
            )
        }
        _ => false,
    }
}

/// The call a declaration writes straight into its own series, if any.
///
/// `var` declarations never qualify: their first-bar initialization is
/// wrapped around the value. A TA or session-time call qualifies only
/// when none of its arguments needs a temp of its own.
pub fn direct_call<'ast>(
    kind: DeclKind,
    init: &'ast Expr<'ast>,
    ctx: &GenContext<'ast>,
) -> Option<&'ast CallExpr<'ast>> {
    if kind == DeclKind::Var {
        return None;
    }
    let Expr::Call(call) = init else {
        return None;
    };
    let name = canonical_name(&call.callee_name()?).into_owned();
    match FunctionCategory::of(&name) {
        FunctionCategory::Security => Some(*call),
        FunctionCategory::Time if has_session(call) => {
            (!call.arguments.iter().any(has_series_dependency)).then_some(*call)
        }
        FunctionCategory::Ta => {
            if call.arguments.iter().any(has_series_dependency) {
                return None;
            }
            let handler = ctx.ta().find_handler(&name)?;
            let literal_ok = handler.accepts_literal_source();
            handler
                .source_args(call)
                .into_iter()
                .all(|src| is_simple_source(src, ctx) || (literal_ok && src.as_number().is_some()))
                .then_some(*call)
        }
        _ => None,
    }
}

// ==========================================================================
// Temp naming
// ==========================================================================

/// Base name of the temp series for a call.
///
/// TA calls: `{function}_{period}_{fingerprint}`, dropping the period for
/// functions without a window. Everything else: `{function}_{fingerprint}`.
pub fn call_temp_name(info: &CallInfo<'_>, ctx: &GenContext<'_>) -> String {
    let base = info.name.replace('.', "_");
    let period = match info.category {
        FunctionCategory::Ta => ctx
            .ta()
            .find_handler(&info.name)
            .and_then(|h| h.period_arg(info.call))
            .and_then(period_label),
        _ => None,
    };
    match period {
        Some(period) => format!("{base}_{period}_{}", info.fingerprint),
        None => format!("{base}_{}", info.fingerprint),
    }
}

/// Base name of the temp series for a non-series TA source expression.
pub fn expression_temp_name(expr: &Expr<'_>) -> String {
    let kind = match expr {
        Expr::Conditional(_) => "ternary",
        _ => "expr",
    };
    format!("{kind}_{}", fingerprint(kind, &[expr.to_string()]))
}
