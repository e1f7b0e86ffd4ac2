//! Statement emission.
//!
//! The [`StmtEmitter`] writes the per-bar form of each user statement:
//! - Declarations and reassignments `Set` their series
//! - `var` declarations carry their value forward after the first bar
//! - `if`/`else` blocks become host `if` chains
//! - Expression statements dispatch to the plot and strategy handlers
//!
//! Each statement is preceded by the temps it owns. Temps owned by
//! statements inside an `if` are computed in the branch, and reset to NaN
//! ahead of the top-level `if` together with the series its blocks
//! declare.
//!
//! # Example
//!
//! ```ignore
//! let mut emitter = StmtEmitter::new(&ctx, &mut writer);
//! emitter.emit(stmt)?;
//! ```

mod expr_stmt;
mod if_stmt;
mod var_decl;

use pinegen_core::CodegenError;
use pinegen_parser::ast::Stmt;

use crate::builtins::emit_temp;
use crate::context::GenContext;
use crate::emit::CodeWriter;
use crate::expr::ExprLowerer;

type Result<T> = std::result::Result<T, CodegenError>;

/// Emits statements into a writer.
pub struct StmtEmitter<'a, 'ast> {
    /// Expression lowering over the finished context
    lowerer: ExprLowerer<'a, 'ast>,
    /// Output
    w: &'a mut CodeWriter,
}

impl<'a, 'ast> StmtEmitter<'a, 'ast> {
    pub fn new(ctx: &'a GenContext<'ast>, w: &'a mut CodeWriter) -> Self {
        Self {
            lowerer: ExprLowerer::new(ctx),
            w,
        }
    }

    /// Emit one top-level statement.
    pub fn emit(&mut self, stmt: &'ast Stmt<'ast>) -> Result<()> {
        let indent = self.w.indent_level();
        if let Stmt::If(if_stmt) = stmt {
            self.emit_branch_resets(*if_stmt);
        }
        self.emit_nested(stmt)?;
        debug_assert_eq!(self.w.indent_level(), indent, "unbalanced statement");
        Ok(())
    }

    /// Emit a statement with the temps it owns.
    fn emit_nested(&mut self, stmt: &'ast Stmt<'ast>) -> Result<()> {
        for temp in self.ctx().temps().owned_by(stmt) {
            emit_temp(temp, &self.lowerer, self.w)?;
        }
        match stmt {
            Stmt::VarDecl(decl) => self.emit_var_decl(*decl),
            Stmt::Expr(expr_stmt) => self.emit_expr_stmt(expr_stmt),
            Stmt::If(if_stmt) => self.emit_if(*if_stmt),
        }
    }

    fn emit_block(&mut self, block: &'ast [Stmt<'ast>]) -> Result<()> {
        for stmt in block {
            self.emit_nested(stmt)?;
        }
        Ok(())
    }

    fn ctx(&self) -> &'a GenContext<'ast> {
        self.lowerer.ctx()
    }
}
