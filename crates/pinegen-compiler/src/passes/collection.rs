//! Collection Pass (Pass 1) - Declare every name the script introduces.
//!
//! This pass walks every statement, including those nested in `if` blocks,
//! and enters each declared name into the symbol table with its kind and
//! inferred type. It also lifts `input.*` defaults into the constant table
//! so later passes can fold input identifiers used as periods. Top-level
//! `=` declarations whose value folds to a number (`len = 14`,
//! `slow = len * 2`) and that are never reassigned are entered there too.
//!
//! ## Responsibilities
//!
//! - Enforce the statement limit
//! - Record the script title from `strategy()` / `indicator()` / `study()`
//! - Declare series, input constants, source aliases and string aliases
//! - Validate reassignments against existing declarations

use pinegen_core::{CodegenError, ConstantValue, Span, TypeTag};
use pinegen_parser::Program;
use pinegen_parser::ast::{
    CallExpr, DeclKind, Declarator, Expr, ExprStmt, Stmt, TypeHint, VarDeclStmt,
};
use pinegen_registry::{FunctionCategory, OhlcvField, canonical_name};
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::builtins::input;
use crate::context::GenContext;
use crate::symbols::{Symbol, SymbolKind};

type Result<T> = std::result::Result<T, CodegenError>;

/// Output of the collection pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectionOutput {
    /// Statements visited, nested ones included.
    pub statements: usize,
    /// Series-backed names declared.
    pub series_declared: usize,
    /// Inputs lifted to constants.
    pub inputs_lifted: usize,
    /// Source and string aliases declared.
    pub aliases_declared: usize,
    /// Series declarations that also fold to a numeric constant.
    pub constants_folded: usize,
}

/// Pass 1: declare names.
pub struct CollectionPass<'a, 'ast> {
    ctx: &'a mut GenContext<'ast>,
    /// Top-level declarations that may fold, in declaration order.
    foldable: Vec<(&'ast str, &'ast Expr<'ast>, Span)>,
    reassigned: FxHashSet<&'ast str>,
    output: CollectionOutput,
}

impl<'a, 'ast> CollectionPass<'a, 'ast> {
    pub fn new(ctx: &'a mut GenContext<'ast>) -> Self {
        Self {
            ctx,
            foldable: Vec::new(),
            reassigned: FxHashSet::default(),
            output: CollectionOutput::default(),
        }
    }

    /// Run the pass over a program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>) -> Result<CollectionOutput> {
        for stmt in program.body() {
            self.visit_stmt(stmt, false)?;
        }
        self.fold_declarations()?;
        debug!(
            statements = self.output.statements,
            series = self.output.series_declared,
            inputs = self.output.inputs_lifted,
            aliases = self.output.aliases_declared,
            constants = self.output.constants_folded,
            "collected names"
        );
        Ok(self.output)
    }

    /// Register never-reassigned numeric declarations as constants. Each
    /// may use the ones before it.
    fn fold_declarations(&mut self) -> Result<()> {
        for (name, init, span) in std::mem::take(&mut self.foldable) {
            if self.reassigned.contains(name) {
                continue;
            }
            let Some(value) = self.ctx.resolver().resolve(init) else {
                continue;
            };
            if value.as_float().is_none() {
                continue;
            }
            trace!(name, ?value, "folded declaration");
            register_constant(self.ctx, name, value, span)?;
            self.output.constants_folded += 1;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt<'ast>, nested: bool) -> Result<()> {
        self.output.statements += 1;
        let max = self.ctx.config().limits.max_statements;
        if self.output.statements > max {
            return Err(CodegenError::LimitExceeded {
                limit: "statement",
                max,
            });
        }

        match stmt {
            Stmt::VarDecl(decl) => self.visit_decl(decl, nested),
            Stmt::Expr(stmt) => {
                self.visit_expr_stmt(stmt);
                Ok(())
            }
            Stmt::If(stmt) => {
                for inner in stmt.consequent.iter().chain(stmt.alternate) {
                    self.visit_stmt(inner, true)?;
                }
                Ok(())
            }
        }
    }

    fn visit_expr_stmt(&mut self, stmt: &ExprStmt<'ast>) {
        let Expr::Call(call) = stmt.expr else {
            return;
        };
        let Some(name) = call.callee_name() else {
            return;
        };
        if FunctionCategory::of(&canonical_name(&name)) != FunctionCategory::Declaration {
            return;
        }
        if let Some(title) = call.arg(0, "title").and_then(|t| t.as_string()) {
            self.ctx.set_strategy_name(title);
        }
    }

    fn visit_decl(&mut self, decl: &VarDeclStmt<'ast>, nested: bool) -> Result<()> {
        for declarator in decl.declarators {
            let init = declarator.init.ok_or_else(|| {
                CodegenError::unsupported(
                    format!("declaration of '{}' without a value", declarator.id.name),
                    declarator.span,
                )
            })?;
            match decl.kind {
                DeclKind::Reassign => {
                    self.check_reassign(declarator)?;
                    self.reassigned.insert(declarator.id.name);
                }
                DeclKind::Var if nested => {
                    return Err(CodegenError::unsupported(
                        format!("'var' declaration of '{}' inside a block", declarator.id.name),
                        declarator.span,
                    ));
                }
                DeclKind::Let | DeclKind::Var => self.declare(decl.kind, declarator, init, nested)?,
            }
        }
        Ok(())
    }

    fn check_reassign(&self, declarator: &Declarator<'ast>) -> Result<()> {
        let name = declarator.id.name;
        match self.ctx.symbols().get(name) {
            None => Err(CodegenError::UndefinedVariable {
                name: name.to_string(),
                span: declarator.id.span,
            }),
            Some(symbol) if !symbol.is_series() => Err(CodegenError::unsupported(
                format!("reassignment of constant '{name}'"),
                declarator.span,
            )),
            Some(_) => Ok(()),
        }
    }

    fn declare(
        &mut self,
        kind: DeclKind,
        declarator: &Declarator<'ast>,
        init: &'ast Expr<'ast>,
        nested: bool,
    ) -> Result<()> {
        let kind = match self.input_call(init) {
            Some((name, call)) if name == "input.source" => {
                self.output.aliases_declared += 1;
                SymbolKind::SourceAlias(source_field(call)?)
            }
            Some((name, call)) => {
                let value = input::default_value(self.ctx.resolver(), &name, call)?;
                self.output.inputs_lifted += 1;
                SymbolKind::Input(value)
            }
            None => {
                let tag = match declarator.type_hint {
                    Some(TypeHint::Bool) => TypeTag::Bool,
                    Some(TypeHint::String | TypeHint::Color) => TypeTag::String,
                    Some(TypeHint::Int | TypeHint::Float) => TypeTag::Float,
                    None => self.ctx.inference().infer(init),
                };
                if tag.is_string() {
                    self.output.aliases_declared += 1;
                    SymbolKind::StringAlias(init)
                } else {
                    if kind == DeclKind::Let && !nested {
                        self.foldable.push((declarator.id.name, init, declarator.span));
                    }
                    self.output.series_declared += 1;
                    SymbolKind::Series {
                        tag,
                        persistent: kind == DeclKind::Var,
                    }
                }
            }
        };

        let symbol = Symbol {
            name: declarator.id.name,
            kind,
            span: declarator.span,
        };
        let value = match &symbol.kind {
            SymbolKind::Input(value) => Some(value.clone()),
            _ => None,
        };
        self.ctx.symbols_mut().declare(symbol)?;
        if let Some(value) = value {
            register_constant(self.ctx, declarator.id.name, value, declarator.span)?;
        }
        Ok(())
    }

    /// The canonical name and call of an `input*` initializer.
    fn input_call(&self, init: &'ast Expr<'ast>) -> Option<(String, &'ast CallExpr<'ast>)> {
        let Expr::Call(call) = init else {
            return None;
        };
        let name = canonical_name(&call.callee_name()?).into_owned();
        (FunctionCategory::of(&name) == FunctionCategory::Input).then_some((name, *call))
    }
}

fn register_constant(
    ctx: &mut GenContext<'_>,
    name: &str,
    value: ConstantValue,
    span: Span,
) -> Result<()> {
    ctx.constants_mut()
        .register(name, value)
        .map_err(|_| CodegenError::NameCollision {
            name: name.to_string(),
            storage: name.to_string(),
            span,
        })
}

/// The builtin field an `input.source(x)` defaults to.
fn source_field(call: &CallExpr<'_>) -> Result<OhlcvField> {
    call.arg(0, "defval")
        .and_then(|d| d.as_ident())
        .and_then(OhlcvField::from_name)
        .ok_or_else(|| {
            CodegenError::malformed(
                "input.source",
                "default must be one of close, open, high, low, volume",
                call.span,
            )
        })
}
