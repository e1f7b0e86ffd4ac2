//! If/else blocks.
//!
//! Handles:
//! - `if c` with an indented block
//! - `else` blocks
//! - chained `else if`, rendered as `} else if c {`
//!
//! Series declared inside a top-level `if`, and temps computed inside it,
//! are reset to NaN before it, so a bar that takes no branch writing them
//! still stores a value.

use pinegen_parser::ast::{DeclKind, IfStmt, Stmt};

use crate::symbols::SymbolKind;
use crate::temp_vars::NodeId;

use super::{Result, StmtEmitter};

impl<'a, 'ast> StmtEmitter<'a, 'ast> {
    /// NaN writes for every series a top-level `if` may leave unwritten.
    pub(super) fn emit_branch_resets(&mut self, stmt: &'ast IfStmt<'ast>) {
        let mut declared = Vec::new();
        self.block_declarations(stmt.consequent, &mut declared);
        self.block_declarations(stmt.alternate, &mut declared);
        for name in declared {
            self.w.line(format!("{name}Series.Set(math.NaN())"));
        }

        let mut nested = Vec::new();
        block_statements(stmt.consequent, &mut nested);
        block_statements(stmt.alternate, &mut nested);
        for temp in self.ctx().temps().temps() {
            if nested.contains(&temp.owner.stmt) {
                self.w.line(format!("{}.Set(math.NaN())", temp.storage()));
            }
        }
    }

    /// Emit an `if` statement.
    pub fn emit_if(&mut self, stmt: &'ast IfStmt<'ast>) -> Result<()> {
        let test = self.lowerer.lower_condition(stmt.test)?;
        self.w.open(format!("if {test} {{"));
        self.emit_block(stmt.consequent)?;
        self.emit_alternate(stmt.alternate)?;
        self.w.close("}");
        Ok(())
    }

    fn emit_alternate(&mut self, alternate: &'ast [Stmt<'ast>]) -> Result<()> {
        match alternate {
            [] => Ok(()),
            [Stmt::If(chained)] => {
                let test = self.lowerer.lower_condition(chained.test)?;
                self.w.reopen(format!("}} else if {test} {{"));
                self.emit_block(chained.consequent)?;
                self.emit_alternate(chained.alternate)
            }
            block => {
                self.w.reopen("} else {");
                self.emit_block(block)
            }
        }
    }

    /// Names of series declared with `=` anywhere inside a block.
    fn block_declarations(&self, block: &'ast [Stmt<'ast>], out: &mut Vec<&'ast str>) {
        for stmt in block {
            match stmt {
                Stmt::VarDecl(decl) if decl.kind == DeclKind::Let => {
                    for declarator in decl.declarators {
                        let name = declarator.id.name;
                        let is_series = self
                            .ctx()
                            .symbols()
                            .get(name)
                            .is_some_and(|s| matches!(s.kind, SymbolKind::Series { .. }));
                        if is_series && !out.contains(&name) {
                            out.push(name);
                        }
                    }
                }
                Stmt::If(inner) => {
                    self.block_declarations(inner.consequent, out);
                    self.block_declarations(inner.alternate, out);
                }
                _ => {}
            }
        }
    }
}

/// Every statement inside a block, nested blocks included.
fn block_statements(block: &[Stmt<'_>], out: &mut Vec<NodeId>) {
    for stmt in block {
        out.push(NodeId::of_stmt(stmt));
        if let Stmt::If(inner) = stmt {
            block_statements(inner.consequent, out);
            block_statements(inner.alternate, out);
        }
    }
}
