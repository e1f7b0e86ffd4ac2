//! Generator configuration.
//!
//! [`GeneratorConfig`] carries the few knobs a host can set: the fallback
//! strategy name, the initial capital passed to the strategy runtime, and
//! the [`SafetyLimits`] that bound the work a single script may request.

/// Limits that reject oversized scripts before emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SafetyLimits {
    /// Maximum number of statements visited by the collection pass,
    /// counting statements nested in `if` blocks.
    pub max_statements: usize,
    /// Maximum number of cross-timeframe calls.
    pub max_security_calls: usize,
}

impl SafetyLimits {
    pub const DEFAULT_MAX_STATEMENTS: usize = 10_000;
    pub const DEFAULT_MAX_SECURITY_CALLS: usize = 100;
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_statements: Self::DEFAULT_MAX_STATEMENTS,
            max_security_calls: Self::DEFAULT_MAX_SECURITY_CALLS,
        }
    }
}

/// Settings for one generator run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeneratorConfig {
    /// Name used when the script declares no `strategy()`/`indicator()` title.
    pub strategy_name: String,
    /// Starting capital handed to `strat.Call`.
    pub initial_capital: f64,
    /// Size limits.
    pub limits: SafetyLimits,
}

impl GeneratorConfig {
    pub const DEFAULT_STRATEGY_NAME: &'static str = "Generated Strategy";
    pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback strategy name.
    pub fn with_strategy_name(mut self, name: impl Into<String>) -> Self {
        self.strategy_name = name.into();
        self
    }

    /// Set the initial capital.
    pub fn with_initial_capital(mut self, capital: f64) -> Self {
        self.initial_capital = capital;
        self
    }

    /// Set the statement limit.
    pub fn with_max_statements(mut self, max: usize) -> Self {
        self.limits.max_statements = max;
        self
    }

    /// Set the cross-timeframe call limit.
    pub fn with_max_security_calls(mut self, max: usize) -> Self {
        self.limits.max_security_calls = max;
        self
    }

    /// Replace all limits.
    pub fn with_limits(mut self, limits: SafetyLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            strategy_name: Self::DEFAULT_STRATEGY_NAME.to_string(),
            initial_capital: Self::DEFAULT_INITIAL_CAPITAL,
            limits: SafetyLimits::default(),
        }
    }
}
