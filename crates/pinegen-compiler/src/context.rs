//! Generation context.
//!
//! [`GenContext`] owns everything one compilation learns about a program:
//! the name environment, the constant table, the temp-series table, the TA
//! handler registry, and the program-wide facts the preamble depends on.
//! The two passes fill it in; emission only reads it.

use std::collections::BTreeSet;

use bitflags::bitflags;
use pinegen_core::CodegenError;
use pinegen_registry::{ConstantRegistry, RuntimeValue};

use crate::config::GeneratorConfig;
use crate::constants::ConstantResolver;
use crate::symbols::SymbolTable;
use crate::ta::TaRegistry;
use crate::temp_vars::TempVarManager;
use crate::types::TypeInference;

bitflags! {
    /// Program-wide facts discovered by the passes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProgramFeatures: u8 {
        /// Some expression reads strategy runtime state.
        const RUNTIME_SAMPLING = 1 << 0;
        /// At least one cross-timeframe call.
        const SECURITY = 1 << 1;
        /// A cross-timeframe call routes through the streaming evaluator.
        const SECURITY_EVALUATOR = 1 << 2;
        /// At least one `fixnan` state cell.
        const FIXNAN_STATE = 1 << 3;
        /// The script declares a strategy/indicator title.
        const NAMED = 1 << 4;
    }
}

/// Everything one compilation knows about the program.
pub struct GenContext<'ast> {
    config: GeneratorConfig,
    symbols: SymbolTable<'ast>,
    constants: ConstantRegistry,
    temps: TempVarManager<'ast>,
    ta: TaRegistry,
    features: ProgramFeatures,
    runtime_values: BTreeSet<RuntimeValue>,
    fixnan_states: Vec<String>,
    strategy_name: Option<String>,
    security_calls: usize,
}

impl<'ast> GenContext<'ast> {
    /// Create an empty context with the builtin constant table.
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            symbols: SymbolTable::new(),
            constants: ConstantRegistry::with_builtins(),
            temps: TempVarManager::new(),
            ta: TaRegistry::new(),
            features: ProgramFeatures::empty(),
            runtime_values: BTreeSet::new(),
            fixnan_states: Vec::new(),
            strategy_name: None,
            security_calls: 0,
        }
    }

    // ==========================================================================
    // Read access
    // ==========================================================================

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable<'ast> {
        &self.symbols
    }

    pub fn constants(&self) -> &ConstantRegistry {
        &self.constants
    }

    pub fn temps(&self) -> &TempVarManager<'ast> {
        &self.temps
    }

    pub fn ta(&self) -> &TaRegistry {
        &self.ta
    }

    pub fn features(&self) -> ProgramFeatures {
        self.features
    }

    /// A resolver over the constant table.
    pub fn resolver(&self) -> ConstantResolver<'_> {
        ConstantResolver::new(&self.constants)
    }

    /// Type inference over the current name environment.
    pub fn inference(&self) -> TypeInference<'_, 'ast> {
        TypeInference::new(&self.symbols, &self.constants)
    }

    /// Runtime values read anywhere in the program, in sampling order.
    pub fn runtime_values(&self) -> impl Iterator<Item = RuntimeValue> + '_ {
        self.runtime_values.iter().copied()
    }

    /// `fixnan` state cells in registration order.
    pub fn fixnan_states(&self) -> &[String] {
        &self.fixnan_states
    }

    /// The strategy name: the script's title, else the configured default.
    pub fn strategy_name(&self) -> &str {
        self.strategy_name
            .as_deref()
            .unwrap_or(&self.config.strategy_name)
    }

    // ==========================================================================
    // Pass-time mutation
    // ==========================================================================

    pub fn symbols_mut(&mut self) -> &mut SymbolTable<'ast> {
        &mut self.symbols
    }

    pub fn constants_mut(&mut self) -> &mut ConstantRegistry {
        &mut self.constants
    }

    pub fn temps_mut(&mut self) -> &mut TempVarManager<'ast> {
        &mut self.temps
    }

    /// Record the script's declared title. The first one wins.
    pub fn set_strategy_name(&mut self, name: impl Into<String>) {
        if self.strategy_name.is_none() {
            self.strategy_name = Some(name.into());
            self.features |= ProgramFeatures::NAMED;
        }
    }

    /// Record a read of strategy runtime state.
    pub fn note_runtime_read(&mut self, value: RuntimeValue) {
        self.runtime_values.insert(value);
        self.features |= ProgramFeatures::RUNTIME_SAMPLING;
    }

    /// Record a cross-timeframe call, enforcing the configured limit.
    pub fn note_security_call(&mut self, uses_evaluator: bool) -> Result<(), CodegenError> {
        self.security_calls += 1;
        let max = self.config.limits.max_security_calls;
        if self.security_calls > max {
            return Err(CodegenError::LimitExceeded {
                limit: "security call",
                max,
            });
        }
        self.features |= ProgramFeatures::SECURITY;
        if uses_evaluator {
            self.features |= ProgramFeatures::SECURITY_EVALUATOR;
        }
        Ok(())
    }

    /// Register the `fixnan` state cell for a target series base name.
    pub fn add_fixnan_state(&mut self, target: &str) {
        let cell = fixnan_state_name(target);
        if !self.fixnan_states.contains(&cell) {
            self.fixnan_states.push(cell);
        }
        self.features |= ProgramFeatures::FIXNAN_STATE;
    }

    /// Clear per-program state so the context can be reused.
    pub fn reset(&mut self) {
        self.symbols = SymbolTable::new();
        self.constants.clear_user_constants();
        self.temps.reset();
        self.features = ProgramFeatures::empty();
        self.runtime_values.clear();
        self.fixnan_states.clear();
        self.strategy_name = None;
        self.security_calls = 0;
    }
}

/// The function-scope state cell of a `fixnan` writing into `target`.
pub fn fixnan_state_name(target: &str) -> String {
    format!("fixnanState_{target}")
}
