//! Declarations and reassignments.
//!
//! Handles the three binding forms:
//! - `x = e`: `Set` every bar
//! - `x := e`: overwrite the current bar's value
//! - `var x = e`: `Set(e)` on the first bar, then carry `Get(1)` forward

use pinegen_core::CodegenError;
use pinegen_parser::ast::{DeclKind, Declarator, VarDeclStmt};
use pinegen_registry::canonical_name;

use crate::analyzer::direct_call;
use crate::builtins::emit_series_call;
use crate::symbols::SymbolKind;

use super::{Result, StmtEmitter};

impl<'a, 'ast> StmtEmitter<'a, 'ast> {
    /// Emit every declarator of a declaration statement.
    pub fn emit_var_decl(&mut self, decl: &'ast VarDeclStmt<'ast>) -> Result<()> {
        for declarator in decl.declarators {
            self.emit_declarator(decl.kind, declarator)?;
        }
        Ok(())
    }

    fn emit_declarator(&mut self, kind: DeclKind, declarator: &'ast Declarator<'ast>) -> Result<()> {
        let name = declarator.id.name;
        let symbol = self
            .ctx()
            .symbols()
            .get(name)
            .ok_or_else(|| CodegenError::UndefinedVariable {
                name: name.to_string(),
                span: declarator.span,
            })?;
        // Inputs are constants and aliases are inlined at reads.
        if !matches!(symbol.kind, SymbolKind::Series { .. }) {
            return Ok(());
        }
        let init = declarator.init.ok_or_else(|| {
            CodegenError::unsupported(format!("declaration of '{name}' without a value"), declarator.span)
        })?;

        if kind == DeclKind::Var {
            let value = self.lowerer.lower_float(init)?;
            self.w.open("if i == 0 {");
            self.w.line(format!("{name}Series.Set({})", value.code));
            self.w.reopen("} else {");
            self.w.line(format!("{name}Series.Set({name}Series.Get(1))"));
            self.w.close("}");
            return Ok(());
        }

        if let Some(call) = direct_call(kind, init, self.ctx()) {
            let callee = call.callee_name().ok_or_else(|| {
                CodegenError::internal(format!("direct call for '{name}' has no callee"))
            })?;
            return emit_series_call(call, &canonical_name(&callee), name, &self.lowerer, self.w);
        }

        let value = self.lowerer.lower_float(init)?;
        self.w.line(format!("{name}Series.Set({})", value.code));
        Ok(())
    }
}
