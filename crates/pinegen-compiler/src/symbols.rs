//! The name environment.
//!
//! Every name a script declares is entered here by the collection pass,
//! together with its kind and inferred [`TypeTag`]. Lookups during
//! emission never mutate the table.

use pinegen_core::{CodegenError, ConstantValue, Span, TypeTag};
use pinegen_parser::ast::Expr;
use pinegen_registry::{Builtin, OhlcvField, RuntimeValue};
use rustc_hash::{FxHashMap, FxHashSet};

/// Identifiers the emitted function body already uses. A lifted input
/// constant is declared under its own name, so it must avoid these.
const HOST_IDENTIFIERS: &[&str] = &[
    "i",
    "bar",
    "barCount",
    "ctx",
    "strat",
    "collector",
    "securityContexts",
    "secBarEvaluator",
    "math",
    "fmt",
    "series",
    "strategy",
    "session",
    "security",
    "context",
    "value",
    "ast",
    "len",
    "float64",
    "int",
    "nil",
];

/// What a declared name stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind<'ast> {
    /// A series-backed user variable.
    Series {
        /// Inferred type, governing coercion at read sites.
        tag: TypeTag,
        /// Declared with `var`: carried forward across bars.
        persistent: bool,
    },
    /// An `input.*` default lifted to a host constant.
    Input(ConstantValue),
    /// `input.source(x)`: another name for a builtin field.
    SourceAlias(OhlcvField),
    /// A string-typed declaration, inlined at every read.
    StringAlias(&'ast Expr<'ast>),
}

/// A declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol<'ast> {
    /// The DSL name.
    pub name: &'ast str,
    /// What it stands for.
    pub kind: SymbolKind<'ast>,
    /// Where it was declared.
    pub span: Span,
}

impl<'ast> Symbol<'ast> {
    /// The host storage name, if the symbol has storage.
    pub fn storage(&self) -> Option<String> {
        match &self.kind {
            SymbolKind::Series { .. } => Some(format!("{}Series", self.name)),
            SymbolKind::Input(_) => Some(self.name.to_string()),
            SymbolKind::SourceAlias(_) | SymbolKind::StringAlias(_) => None,
        }
    }

    /// The inferred type tag.
    pub fn type_tag(&self) -> TypeTag {
        match &self.kind {
            SymbolKind::Series { tag, .. } => *tag,
            SymbolKind::Input(value) => value.type_tag(),
            SymbolKind::SourceAlias(_) => TypeTag::Float,
            SymbolKind::StringAlias(_) => TypeTag::String,
        }
    }

    /// Whether this symbol is a series-backed user variable.
    pub fn is_series(&self) -> bool {
        matches!(self.kind, SymbolKind::Series { .. })
    }
}

/// Declared names, in declaration order.
#[derive(Debug, Default)]
pub struct SymbolTable<'ast> {
    symbols: Vec<Symbol<'ast>>,
    by_name: FxHashMap<&'ast str, usize>,
    storage: FxHashSet<String>,
}

impl<'ast> SymbolTable<'ast> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a name.
    ///
    /// Fails with [`CodegenError::NameCollision`] when the name is already
    /// declared, shadows a builtin, or its storage name is taken.
    pub fn declare(&mut self, symbol: Symbol<'ast>) -> Result<(), CodegenError> {
        let collision = |storage: String| CodegenError::NameCollision {
            name: symbol.name.to_string(),
            storage,
            span: symbol.span,
        };

        if let Some(&index) = self.by_name.get(symbol.name) {
            let existing = &self.symbols[index];
            return Err(collision(
                existing.storage().unwrap_or_else(|| existing.name.to_string()),
            ));
        }
        if Builtin::is_reserved(symbol.name) {
            return Err(collision(symbol.name.to_string()));
        }

        if let Some(storage) = symbol.storage() {
            if self.storage.contains(&storage) || is_reserved_storage(&storage) {
                return Err(collision(storage));
            }
            self.storage.insert(storage);
        }

        self.by_name.insert(symbol.name, self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }

    /// Look up a name.
    pub fn get(&self, name: &str) -> Option<&Symbol<'ast>> {
        self.by_name.get(name).map(|&i| &self.symbols[i])
    }

    /// Whether a host storage name is taken by a declared symbol.
    pub fn storage_taken(&self, storage: &str) -> bool {
        self.storage.contains(storage)
    }

    /// Series-backed symbols in declaration order.
    pub fn series(&self) -> impl Iterator<Item = &Symbol<'ast>> {
        self.symbols.iter().filter(|s| s.is_series())
    }

    /// Lifted inputs in declaration order, with their values.
    pub fn inputs(&self) -> impl Iterator<Item = (&'ast str, &ConstantValue)> {
        self.symbols.iter().filter_map(|s| match &s.kind {
            SymbolKind::Input(value) => Some((s.name, value)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Storage names owned by the fixed preamble.
fn is_reserved_storage(storage: &str) -> bool {
    HOST_IDENTIFIERS.contains(&storage)
        || OhlcvField::ALL.iter().any(|f| f.series_name() == storage)
        || RuntimeValue::ALL.iter().any(|v| v.series_name() == storage)
}
