//! ConstantRegistry - compile-time constant table.
//!
//! Holds the DSL's builtin qualified constants and the typed default values
//! of lifted `input.*` declarations. Lookup is one case-sensitive hash access
//! on the whole key.
//!
//! # Example
//!
//! ```
//! use pinegen_core::ConstantValue;
//! use pinegen_registry::ConstantRegistry;
//!
//! let mut registry = ConstantRegistry::with_builtins();
//! assert_eq!(registry.get("barmerge.lookahead_on"), Some(&ConstantValue::Bool(true)));
//!
//! registry.register("length", ConstantValue::Int(14)).unwrap();
//! assert_eq!(registry.get("length").and_then(|v| v.as_int()), Some(14));
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use pinegen_core::ConstantValue;

/// Errors raised while populating the constant table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("constant '{name}' is already registered")]
    Duplicate { name: String },
}

/// Compile-time constant table keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct ConstantRegistry {
    /// Constants by qualified name.
    constants: FxHashMap<String, ConstantValue>,
    /// Namespaces that own at least one builtin constant.
    namespaces: FxHashSet<String>,
}

impl ConstantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with every builtin namespace.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Get a constant by qualified name.
    pub fn get(&self, name: &str) -> Option<&ConstantValue> {
        self.constants.get(name)
    }

    /// Check if a constant exists.
    pub fn contains(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    /// Check if a namespace owns builtin constants (`color`, `barmerge`, ...).
    pub fn has_namespace(&self, ns: &str) -> bool {
        self.namespaces.contains(ns)
    }

    /// Number of registered constants.
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a new constant.
    ///
    /// Fails if the name is taken; builtin constants are never overwritten.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        value: ConstantValue,
    ) -> Result<(), RegistrationError> {
        let name = name.into();
        if self.constants.contains_key(&name) {
            return Err(RegistrationError::Duplicate { name });
        }
        self.constants.insert(name, value);
        Ok(())
    }

    /// Remove every non-builtin constant, keeping the builtin table.
    pub fn clear_user_constants(&mut self) {
        self.constants.clear();
        self.register_builtins();
    }

    /// Register all builtin namespaces.
    pub fn register_builtins(&mut self) {
        self.register_barmerge();
        self.register_strategy();
        self.register_colors();
        self.register_plot_styles();
    }

    fn builtin(&mut self, name: &str, value: ConstantValue) {
        if let Some((ns, _)) = name.split_once('.') {
            self.namespaces.insert(ns.to_string());
        }
        self.constants.insert(name.to_string(), value);
    }

    fn register_barmerge(&mut self) {
        self.builtin("barmerge.lookahead_on", ConstantValue::Bool(true));
        self.builtin("barmerge.lookahead_off", ConstantValue::Bool(false));
        self.builtin("barmerge.gaps_on", ConstantValue::Bool(true));
        self.builtin("barmerge.gaps_off", ConstantValue::Bool(false));
    }

    fn register_strategy(&mut self) {
        self.builtin("strategy.long", ConstantValue::Int(1));
        self.builtin("strategy.short", ConstantValue::Int(-1));
        self.builtin("strategy.cash", ConstantValue::string("cash"));
        self.builtin(
            "strategy.percent_of_equity",
            ConstantValue::string("percent_of_equity"),
        );
        self.builtin("strategy.fixed", ConstantValue::string("fixed"));
    }

    fn register_colors(&mut self) {
        const COLORS: &[(&str, &str)] = &[
            ("red", "#FF0000"),
            ("green", "#00FF00"),
            ("blue", "#0000FF"),
            ("yellow", "#FFFF00"),
            ("orange", "#FFA500"),
            ("purple", "#800080"),
            ("gray", "#808080"),
            ("black", "#000000"),
            ("white", "#FFFFFF"),
            ("lime", "#00FF00"),
            ("teal", "#008080"),
        ];
        for (name, hex) in COLORS {
            self.builtin(&format!("color.{name}"), ConstantValue::string(*hex));
        }
    }

    fn register_plot_styles(&mut self) {
        const STYLES: &[&str] = &[
            "line",
            "linebr",
            "stepline",
            "histogram",
            "cross",
            "area",
            "columns",
            "circles",
        ];
        for style in STYLES {
            self.builtin(&format!("plot.style_{style}"), ConstantValue::string(*style));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables() {
        let registry = ConstantRegistry::with_builtins();
        assert_eq!(registry.get("barmerge.gaps_off"), Some(&ConstantValue::Bool(false)));
        assert_eq!(registry.get("strategy.short"), Some(&ConstantValue::Int(-1)));
        assert_eq!(
            registry.get("strategy.percent_of_equity").and_then(|v| v.as_str()),
            Some("percent_of_equity")
        );
        assert_eq!(registry.get("color.teal").and_then(|v| v.as_str()), Some("#008080"));
        assert_eq!(registry.get("plot.style_histogram").and_then(|v| v.as_str()), Some("histogram"));
        assert_eq!(registry.len(), 4 + 5 + 11 + 8);
    }

    #[test]
    fn lookup_is_case_sensitive_whole_key() {
        let registry = ConstantRegistry::with_builtins();
        assert!(registry.get("Color.red").is_none());
        assert!(registry.get("color").is_none());
        assert!(registry.get("red").is_none());
    }

    #[test]
    fn namespaces_are_tracked() {
        let registry = ConstantRegistry::with_builtins();
        assert!(registry.has_namespace("barmerge"));
        assert!(registry.has_namespace("plot"));
        assert!(!registry.has_namespace("ta"));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ConstantRegistry::with_builtins();
        registry.register("length", ConstantValue::Int(20)).unwrap();
        let err = registry.register("length", ConstantValue::Int(30)).unwrap_err();
        assert_eq!(err.to_string(), "constant 'length' is already registered");
        assert!(registry.register("color.red", ConstantValue::string("#000")).is_err());
    }

    #[test]
    fn clearing_keeps_builtins() {
        let mut registry = ConstantRegistry::with_builtins();
        let builtins = registry.len();
        registry.register("len", ConstantValue::Int(5)).unwrap();
        registry.clear_user_constants();
        assert_eq!(registry.len(), builtins);
        assert!(!registry.contains("len"));
    }
}
