//! Expression statements.

use pinegen_core::CodegenError;
use pinegen_parser::ast::{Expr, ExprStmt};
use pinegen_registry::{FunctionCategory, canonical_name};
use tracing::trace;

use crate::builtins::{plot, strategy};

use super::{Result, StmtEmitter};

impl<'a, 'ast> StmtEmitter<'a, 'ast> {
    /// Emit an expression statement.
    ///
    /// Only calls with an effect are meaningful here: `plot` and strategy
    /// actions emit code, declarations and display-only calls emit nothing.
    pub fn emit_expr_stmt(&mut self, stmt: &'ast ExprStmt<'ast>) -> Result<()> {
        let Expr::Call(call) = *stmt.expr else {
            return Err(CodegenError::unsupported(
                format!("expression statement '{}'", stmt.expr),
                stmt.span,
            ));
        };
        let Some(name) = call.callee_name() else {
            return Err(CodegenError::unsupported(
                format!("call of '{}'", call.callee),
                call.span,
            ));
        };
        let name = canonical_name(&name);
        let category = FunctionCategory::of(&name);
        trace!(function = %name, ?category, "statement call");

        match category {
            FunctionCategory::Plot => plot::emit(call, &self.lowerer, self.w),
            FunctionCategory::StrategyAction => strategy::emit(call, &name, &self.lowerer, self.w),
            FunctionCategory::Declaration | FunctionCategory::DisplayOnly => Ok(()),
            _ => Err(CodegenError::unsupported(
                format!("'{name}()' as a statement"),
                call.span,
            )),
        }
    }
}
