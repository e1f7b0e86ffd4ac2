//! Statement AST nodes for the DSL.
//!
//! A script is a flat sequence of line statements; `if` introduces an
//! indented block. There are no loops or user-defined functions.

use pinegen_core::Span;

use super::expr::{Expr, Ident};

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    /// Declaration or reassignment
    VarDecl(&'ast VarDeclStmt<'ast>),
    /// Bare expression (usually a call such as `plot(...)`)
    Expr(ExprStmt<'ast>),
    /// Conditional block
    If(&'ast IfStmt<'ast>),
}

impl<'ast> Stmt<'ast> {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Self::VarDecl(s) => s.span,
            Self::Expr(s) => s.span,
            Self::If(s) => s.span,
        }
    }
}

/// How a declaration binds its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// `x = e`: evaluated on every bar.
    Let,
    /// `var x = e`: initialized on the first bar, then carried forward.
    Var,
    /// `x := e` (and desugared `x += e`): overwrites an existing name.
    Reassign,
}

/// Optional type annotation before a declared name (`float x = ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeHint {
    Int,
    Float,
    Bool,
    String,
    Color,
}

impl TypeHint {
    /// Parse a type keyword.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(TypeHint::Int),
            "float" => Some(TypeHint::Float),
            "bool" => Some(TypeHint::Bool),
            "string" => Some(TypeHint::String),
            "color" => Some(TypeHint::Color),
            _ => None,
        }
    }
}

/// A variable declaration statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDeclStmt<'ast> {
    pub kind: DeclKind,
    pub declarators: &'ast [Declarator<'ast>],
    pub span: Span,
}

/// One `name = init` binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Declarator<'ast> {
    pub id: Ident<'ast>,
    pub type_hint: Option<TypeHint>,
    pub init: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

/// An expression evaluated for its side effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}

/// `if test` with an indented block and an optional `else` block.
///
/// `else if` is represented as an alternate block holding a single
/// nested [`IfStmt`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub test: &'ast Expr<'ast>,
    pub consequent: &'ast [Stmt<'ast>],
    pub alternate: &'ast [Stmt<'ast>],
    pub span: Span,
}
