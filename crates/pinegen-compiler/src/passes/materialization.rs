//! Materialization Pass (Pass 2) - Allocate temp series.
//!
//! Every call that needs a series of its own but has no user name to write
//! into gets a temp series here: nested TA calls, math calls with TA
//! dependencies, session-time calls, cross-timeframe reads, and TA sources
//! that are plain expressions. Temps are registered innermost first and
//! owned by the statement that first needs them, which fixes where their
//! calculation is emitted. Inside `if` blocks that is the nested statement
//! itself, so a temp never reads a series its block has not yet written.
//! The test of an `if` and of each chained `else if` belongs to the
//! top-level `if`.
//!
//! The pass also records the program features the preamble depends on:
//! runtime-state sampling, security contexts and `fixnan` state cells.

use pinegen_core::{CodegenError, Span};
use pinegen_parser::Program;
use pinegen_parser::ast::{CallExpr, Expr, IfStmt, MemberProperty, Stmt};
use pinegen_registry::{Builtin, FunctionCategory};
use tracing::{debug, trace};

use crate::analyzer::{
    CallInfo, call_temp_name, direct_call, expression_temp_name, has_session, is_materialized,
    is_simple_source,
};
use crate::context::GenContext;
use crate::symbols::SymbolKind;
use crate::temp_vars::{NodeId, TempOwner, TempSource};

type Result<T> = std::result::Result<T, CodegenError>;

/// Output of the materialization pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MaterializationOutput {
    /// Temp series allocated for calls.
    pub call_temps: usize,
    /// Temp series allocated for expression sources.
    pub expression_temps: usize,
    /// Call sites that mapped onto an existing temp.
    pub deduplicated: usize,
}

/// The call a declaration writes into its own series, with that name.
#[derive(Clone, Copy)]
struct DirectTarget<'ast> {
    call: &'ast CallExpr<'ast>,
    name: &'ast str,
}

/// Pass 2: allocate temps.
pub struct MaterializationPass<'a, 'ast> {
    ctx: &'a mut GenContext<'ast>,
    owner: Option<TempOwner>,
    output: MaterializationOutput,
}

impl<'a, 'ast> MaterializationPass<'a, 'ast> {
    pub fn new(ctx: &'a mut GenContext<'ast>) -> Self {
        Self {
            ctx,
            owner: None,
            output: MaterializationOutput::default(),
        }
    }

    /// Run the pass over a program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>) -> Result<MaterializationOutput> {
        for stmt in program.body() {
            self.owner = Some(TempOwner::top_level(stmt));
            self.visit_stmt(stmt)?;
        }
        debug!(
            call_temps = self.output.call_temps,
            expression_temps = self.output.expression_temps,
            deduplicated = self.output.deduplicated,
            features = ?self.ctx.features(),
            "materialized temps"
        );
        Ok(self.output)
    }

    fn visit_stmt(&mut self, stmt: &Stmt<'ast>) -> Result<()> {
        match stmt {
            Stmt::VarDecl(decl) => {
                for declarator in decl.declarators {
                    let Some(init) = declarator.init else {
                        continue;
                    };
                    let is_series = self
                        .ctx
                        .symbols()
                        .get(declarator.id.name)
                        .is_some_and(|s| matches!(s.kind, SymbolKind::Series { .. }));
                    if !is_series {
                        continue;
                    }
                    let direct = direct_call(decl.kind, init, self.ctx).map(|call| DirectTarget {
                        call,
                        name: declarator.id.name,
                    });
                    self.visit_expr(init, direct)?;
                }
                Ok(())
            }
            Stmt::Expr(stmt) => self.visit_expr(stmt.expr, None),
            Stmt::If(stmt) => self.visit_if(stmt),
        }
    }

    fn visit_if(&mut self, stmt: &IfStmt<'ast>) -> Result<()> {
        self.visit_expr(stmt.test, None)?;
        self.visit_block(stmt.consequent)?;
        match stmt.alternate {
            [Stmt::If(chained)] => self.visit_if(chained),
            block => self.visit_block(block),
        }
    }

    fn visit_block(&mut self, block: &'ast [Stmt<'ast>]) -> Result<()> {
        let outer = self.owner;
        for inner in block {
            self.owner = Some(TempOwner::nested(inner));
            let result = self.visit_stmt(inner);
            self.owner = outer;
            result?;
        }
        Ok(())
    }

    fn current_owner(&self) -> Result<TempOwner> {
        self.owner
            .ok_or_else(|| CodegenError::internal("temp registered outside a statement"))
    }

    fn visit_expr(&mut self, expr: &'ast Expr<'ast>, direct: Option<DirectTarget<'ast>>) -> Result<()> {
        match expr {
            Expr::Literal(_) => Ok(()),
            Expr::Ident(_) => {
                self.note_name(expr);
                Ok(())
            }
            Expr::Member(member) => match member.property {
                MemberProperty::Field(_) => {
                    self.note_name(expr);
                    Ok(())
                }
                MemberProperty::Index(index) => {
                    self.visit_expr(member.object, None)?;
                    self.visit_expr(index, None)
                }
            },
            Expr::Binary(bin) => {
                self.visit_expr(bin.left, None)?;
                self.visit_expr(bin.right, None)
            }
            Expr::Logical(log) => {
                self.visit_expr(log.left, None)?;
                self.visit_expr(log.right, None)
            }
            Expr::Unary(un) => self.visit_expr(un.argument, None),
            Expr::Conditional(cond) => {
                self.visit_expr(cond.test, None)?;
                self.visit_expr(cond.consequent, None)?;
                self.visit_expr(cond.alternate, None)
            }
            Expr::Object(obj) => {
                for prop in obj.properties {
                    self.visit_expr(&prop.value, None)?;
                }
                Ok(())
            }
            Expr::Call(call) => self.visit_call(call, direct),
        }
    }

    /// Record reads of strategy runtime state.
    fn note_name(&mut self, expr: &Expr<'_>) {
        let Some(name) = expr.qualified_name() else {
            return;
        };
        if self.ctx.symbols().get(&name).is_some() {
            return;
        }
        if let Some(Builtin::Runtime(value)) = Builtin::lookup(&name) {
            self.ctx.note_runtime_read(value);
        }
    }

    fn visit_args(&mut self, call: &'ast CallExpr<'ast>) -> Result<()> {
        for arg in call.arguments {
            self.visit_expr(arg, None)?;
        }
        Ok(())
    }

    fn visit_call(
        &mut self,
        call: &'ast CallExpr<'ast>,
        direct: Option<DirectTarget<'ast>>,
    ) -> Result<()> {
        let Some(info) = CallInfo::of(call) else {
            return self.visit_args(call);
        };
        let direct = direct.filter(|d| std::ptr::eq(d.call, call));

        match info.category {
            FunctionCategory::Declaration | FunctionCategory::DisplayOnly | FunctionCategory::Input => {
                Ok(())
            }
            FunctionCategory::Security => {
                let uses_evaluator = matches!(
                    call.arg(2, "expression"),
                    Some(Expr::Call(_) | Expr::Binary(_))
                );
                self.ctx.note_security_call(uses_evaluator)?;
                if direct.is_none() {
                    self.register_call(&info)?;
                }
                Ok(())
            }
            FunctionCategory::Ta => {
                self.visit_args(call)?;
                self.materialize_sources(&info)?;
                let target = match direct {
                    Some(d) => d.name.to_string(),
                    None => self.register_call(&info)?,
                };
                if info.name == "fixnan" {
                    self.ctx.add_fixnan_state(&target);
                }
                Ok(())
            }
            FunctionCategory::Time => {
                self.visit_args(call)?;
                if has_session(call) && direct.is_none() {
                    self.register_call(&info)?;
                }
                Ok(())
            }
            FunctionCategory::Math => {
                self.visit_args(call)?;
                if is_materialized(call) {
                    self.register_call(&info)?;
                }
                Ok(())
            }
            _ => self.visit_args(call),
        }
    }

    /// Give each non-series TA source an expression temp.
    fn materialize_sources(&mut self, info: &CallInfo<'ast>) -> Result<()> {
        let Some(handler) = self.ctx.ta().find_handler(&info.name) else {
            return Err(CodegenError::internal(format!(
                "no handler registered for '{}'",
                info.name
            )));
        };
        let literal_ok = handler.accepts_literal_source();
        let pending: Vec<&'ast Expr<'ast>> = handler
            .source_args(info.call)
            .into_iter()
            .filter(|src| {
                !is_simple_source(src, self.ctx) && !(literal_ok && src.as_number().is_some())
            })
            .collect();

        let owner = self.current_owner()?;
        for src in pending {
            let name = expression_temp_name(src);
            self.check_storage(&name, &info.name, src.span())?;
            let (temp, created) = self.ctx.temps_mut().get_or_create(
                NodeId::of_expr(src),
                name,
                TempSource::Expression(src),
                owner,
            );
            if created {
                trace!(temp = %temp.name, conditional = owner.conditional, "expression temp");
                self.output.expression_temps += 1;
            } else {
                self.output.deduplicated += 1;
            }
        }
        Ok(())
    }

    /// Returns the name of the temp the call writes into.
    fn register_call(&mut self, info: &CallInfo<'ast>) -> Result<String> {
        let owner = self.current_owner()?;
        let name = call_temp_name(info, self.ctx);
        self.check_storage(&name, &info.name, info.call.span)?;
        let (temp, created) = self.ctx.temps_mut().get_or_create(
            info.node,
            name,
            TempSource::Call(info.call),
            owner,
        );
        let name = temp.name.clone();
        if created {
            trace!(temp = %name, conditional = owner.conditional, "call temp");
            self.output.call_temps += 1;
        } else {
            self.output.deduplicated += 1;
        }
        Ok(name)
    }

    /// A temp may not reuse storage claimed by a user declaration.
    fn check_storage(&self, name: &str, function: &str, span: Span) -> Result<()> {
        let storage = format!("{name}Series");
        if self.ctx.symbols().storage_taken(&storage) {
            return Err(CodegenError::NameCollision {
                name: function.to_string(),
                storage,
                span,
            });
        }
        Ok(())
    }
}
