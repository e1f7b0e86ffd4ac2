//! Temporary series for nested calls.
//!
//! A nested TA call such as the `ta.change(close)` inside
//! `ta.rma(math.max(ta.change(close), 0), 9)` has no user name to write
//! into, so it is materialized into a temp series named
//! `{function}_{period}_{fingerprint}`. Textually identical call sites share
//! one fingerprint and therefore one temp.
//!
//! Temps are registered by the materialization pass, innermost first, and
//! looked up by AST node identity during emission. Each temp is owned by the
//! statement whose evaluation first needs it and is computed right before
//! that statement. A temp owned by a statement inside an `if` block is
//! conditional: it is only shared with later sites of the same statement.

use pinegen_parser::ast::{CallExpr, Expr, Stmt};
use rustc_hash::FxHashMap;

/// Identity of an arena-allocated AST node.
///
/// Nodes live in the arena for the whole compilation, so their addresses
/// are stable and unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Identity of a call node.
    pub fn of_call(call: &CallExpr<'_>) -> Self {
        Self(std::ptr::from_ref(call) as usize)
    }

    /// Identity of an expression slot (an argument or operand reference).
    pub fn of_expr(expr: &Expr<'_>) -> Self {
        Self(std::ptr::from_ref(expr) as usize)
    }

    /// Identity of a statement.
    pub fn of_stmt(stmt: &Stmt<'_>) -> Self {
        Self(std::ptr::from_ref(stmt) as usize)
    }
}

/// The statement a temp is computed in front of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempOwner {
    /// The owning statement.
    pub stmt: NodeId,
    /// The statement sits inside an `if` block, so it may not run every bar.
    pub conditional: bool,
}

impl TempOwner {
    /// Owner for a statement of the program body.
    pub fn top_level(stmt: &Stmt<'_>) -> Self {
        Self {
            stmt: NodeId::of_stmt(stmt),
            conditional: false,
        }
    }

    /// Owner for a statement inside an `if` block.
    pub fn nested(stmt: &Stmt<'_>) -> Self {
        Self {
            stmt: NodeId::of_stmt(stmt),
            conditional: true,
        }
    }

    /// Whether a temp owned by `self` has already been computed, on every
    /// bar, by the time `other` runs.
    fn covers(&self, other: &TempOwner) -> bool {
        !self.conditional || self == other
    }
}

/// What a temp series is computed from.
#[derive(Debug, Clone, Copy)]
pub enum TempSource<'ast> {
    /// A TA, math, cross-timeframe or session-time call.
    Call(&'ast CallExpr<'ast>),
    /// A non-series expression used as a TA source.
    Expression(&'ast Expr<'ast>),
}

/// One materialized temp series.
#[derive(Debug, Clone)]
pub struct TempVar<'ast> {
    /// Base name; the storage is `{name}Series`.
    pub name: String,
    /// What the series is computed from.
    pub source: TempSource<'ast>,
    /// The statement before which it is computed.
    pub owner: TempOwner,
}

impl TempVar<'_> {
    /// The host storage name.
    pub fn storage(&self) -> String {
        format!("{}Series", self.name)
    }
}

/// Allocates and tracks temp series.
#[derive(Debug, Default)]
pub struct TempVarManager<'ast> {
    temps: Vec<TempVar<'ast>>,
    by_node: FxHashMap<NodeId, usize>,
    by_name: FxHashMap<String, usize>,
}

impl<'ast> TempVarManager<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the temp for `node`, creating it if needed.
    ///
    /// Idempotent per node. A second node whose name (and so fingerprint)
    /// matches an existing temp is mapped onto that temp when the existing
    /// temp is computed on every bar before the new site. Otherwise the
    /// new site gets its own temp under a numbered name. The boolean is
    /// `true` when a new temp was allocated.
    pub fn get_or_create(
        &mut self,
        node: NodeId,
        name: String,
        source: TempSource<'ast>,
        owner: TempOwner,
    ) -> (&TempVar<'ast>, bool) {
        if let Some(&index) = self.by_node.get(&node) {
            return (&self.temps[index], false);
        }
        let mut name = name;
        if let Some(&index) = self.by_name.get(&name) {
            if self.temps[index].owner.covers(&owner) {
                self.by_node.insert(node, index);
                return (&self.temps[index], false);
            }
            name = self.numbered(&name, owner);
            if let Some(&index) = self.by_name.get(&name) {
                self.by_node.insert(node, index);
                return (&self.temps[index], false);
            }
        }

        let index = self.temps.len();
        self.by_node.insert(node, index);
        self.by_name.insert(name.clone(), index);
        self.temps.push(TempVar {
            name,
            source,
            owner,
        });
        (&self.temps[index], true)
    }

    /// The temp registered for a node.
    pub fn lookup(&self, node: NodeId) -> Option<&TempVar<'ast>> {
        self.by_node.get(&node).map(|&i| &self.temps[i])
    }

    /// First `{name}_{n}` that is free or already owned by `owner`.
    fn numbered(&self, name: &str, owner: TempOwner) -> String {
        (2..)
            .map(|n| format!("{name}_{n}"))
            .find(|candidate| {
                self.by_name
                    .get(candidate)
                    .is_none_or(|&i| self.temps[i].owner == owner)
            })
            .unwrap_or_else(|| name.to_string())
    }

    /// Whether a temp with this base name exists.
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All temps in creation order.
    pub fn temps(&self) -> &[TempVar<'ast>] {
        &self.temps
    }

    /// Temps computed before the given statement, innermost first.
    pub fn owned_by(&self, stmt: &Stmt<'_>) -> impl Iterator<Item = &TempVar<'ast>> {
        let id = NodeId::of_stmt(stmt);
        self.temps.iter().filter(move |t| t.owner.stmt == id)
    }

    pub fn len(&self) -> usize {
        self.temps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temps.is_empty()
    }

    /// `var xSeries *series.Series` lines.
    pub fn declarations(&self) -> Vec<String> {
        self.temps
            .iter()
            .map(|t| format!("var {} *series.Series", t.storage()))
            .collect()
    }

    /// `xSeries = series.NewSeries(barCount)` lines.
    pub fn initializations(&self) -> Vec<String> {
        self.temps
            .iter()
            .map(|t| format!("{} = series.NewSeries(barCount)", t.storage()))
            .collect()
    }

    /// `xSeries.Next()` lines.
    pub fn next_calls(&self) -> Vec<String> {
        self.temps
            .iter()
            .map(|t| format!("{}.Next()", t.storage()))
            .collect()
    }

    /// Forget every temp.
    pub fn reset(&mut self) {
        self.temps.clear();
        self.by_node.clear();
        self.by_name.clear();
    }
}
