//! The generator driver.
//!
//! Runs both passes over a program and writes the complete body of the
//! per-bar host function:
//!
//! ```text
//! strat.Call(name, capital)
//! // Input constants          one const per lifted input
//! // Series variables         OHLCV, runtime, user, temp series; state cells
//! // Initialize Series storage
//! for i := 0; i < barCount; i++ {
//!     cursor bookkeeping, strategy bar update
//!     runtime sampling, OHLCV population
//!     per statement: the temps it owns (innermost first), then the statement;
//!     statements inside `if` blocks compute their temps inside the branch
//!     // Advance Series cursors
//! }
//! ```

use pinegen_core::{CodegenError, quote, render_plain};
use pinegen_parser::Program;
use pinegen_registry::OhlcvField;
use tracing::debug;

use crate::builtins::security;
use crate::config::GeneratorConfig;
use crate::context::{GenContext, ProgramFeatures};
use crate::emit::CodeWriter;
use crate::passes::{CollectionPass, MaterializationPass};
use crate::stmt::StmtEmitter;

type Result<T> = std::result::Result<T, CodegenError>;

/// Indent of the function body inside its host function.
const BODY_INDENT: usize = 1;

/// The generated function body and the name the script declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyCode {
    /// Body of the per-bar host function.
    pub function_body: String,
    /// Title from `strategy()`/`indicator()`, else the configured name.
    pub strategy_name: String,
}

/// Generates per-bar host functions.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    config: GeneratorConfig,
}

impl CodeGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate the function body for a program.
    ///
    /// Emission is all-or-nothing: any error aborts with no partial output.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate<'ast>(&self, program: &Program<'ast>) -> Result<StrategyCode> {
        if program.is_empty() {
            debug!("empty program, emitting placeholder");
            return Ok(StrategyCode {
                function_body: self.placeholder(),
                strategy_name: self.config.strategy_name.clone(),
            });
        }

        let mut ctx = GenContext::new(self.config.clone());
        let collected = CollectionPass::new(&mut ctx).run(program)?;
        let materialized = MaterializationPass::new(&mut ctx).run(program)?;
        debug!(?collected, ?materialized, "passes complete");

        let mut w = CodeWriter::new(BODY_INDENT);
        emit_preamble(&ctx, &mut w);
        emit_bar_loop(&ctx, program, &mut w)?;
        debug_assert_eq!(w.indent_level(), BODY_INDENT, "unbalanced function body");

        Ok(StrategyCode {
            function_body: w.finish(),
            strategy_name: ctx.strategy_name().to_string(),
        })
    }

    /// The body emitted for a program with no statements.
    fn placeholder(&self) -> String {
        let mut w = CodeWriter::new(BODY_INDENT);
        w.line("// Strategy code will be generated here");
        w.line(self.strategy_call(&self.config.strategy_name));
        w.blank();
        w.open("for i := 0; i < len(ctx.Data); i++ {");
        w.line("ctx.BarIndex = i");
        w.line("strat.OnBarUpdate(i, ctx.Data[i].Open, ctx.Data[i].Time)");
        w.line("// Strategy logic placeholder");
        w.close("}");
        w.finish()
    }

    fn strategy_call(&self, name: &str) -> String {
        format!(
            "strat.Call({}, {})",
            quote(name),
            render_plain(self.config.initial_capital)
        )
    }
}

/// Generate the function body for `program` with `config`.
pub fn generate_strategy_code(
    program: &Program<'_>,
    config: &GeneratorConfig,
) -> Result<StrategyCode> {
    CodeGenerator::new(config.clone()).generate(program)
}

// ==========================================================================
// Preamble
// ==========================================================================

/// Every series storage name in declaration order.
fn series_storage(ctx: &GenContext<'_>) -> Vec<String> {
    let ohlcv = OhlcvField::ALL.iter().map(|f| f.series_name().to_string());
    let runtime = ctx.runtime_values().map(|v| v.series_name());
    let user = ctx.symbols().series().filter_map(|s| s.storage());
    let temps = ctx.temps().temps().iter().map(|t| t.storage());
    ohlcv.chain(runtime).chain(user).chain(temps).collect()
}

fn emit_preamble(ctx: &GenContext<'_>, w: &mut CodeWriter) {
    debug!(strategy = ctx.strategy_name(), "emitting preamble");
    w.line(format!(
        "strat.Call({}, {})",
        quote(ctx.strategy_name()),
        render_plain(ctx.config().initial_capital)
    ));
    w.blank();

    let inputs: Vec<_> = ctx.symbols().inputs().collect();
    if !inputs.is_empty() {
        w.line("// Input constants");
        for (name, value) in inputs {
            w.line(format!("const {name} = {}", value.to_host_literal()));
        }
        w.blank();
    }

    let storage = series_storage(ctx);
    w.line("// Series variables");
    for name in &storage {
        w.line(format!("var {name} *series.Series"));
    }
    for cell in ctx.fixnan_states() {
        w.line(format!("var {cell} = math.NaN()"));
    }
    if ctx.features().contains(ProgramFeatures::SECURITY_EVALUATOR) {
        w.line(format!("var {} security.BarEvaluator", security::EVALUATOR));
    }
    w.blank();

    w.line("// Initialize Series storage");
    w.line("barCount := len(ctx.Data)");
    for name in &storage {
        w.line(format!("{name} = series.NewSeries(barCount)"));
    }
    w.blank();
}

// ==========================================================================
// Bar loop
// ==========================================================================

fn emit_bar_loop<'ast>(
    ctx: &GenContext<'ast>,
    program: &Program<'ast>,
    w: &mut CodeWriter,
) -> Result<()> {
    debug!(statements = program.body().len(), "emitting bar loop");
    w.open("for i := 0; i < barCount; i++ {");
    w.line("ctx.BarIndex = i");
    w.line("bar := ctx.Data[i]");
    w.line("strat.OnBarUpdate(i, bar.Open, bar.Time)");
    w.blank();

    if ctx.features().contains(ProgramFeatures::RUNTIME_SAMPLING) {
        w.line("// Sample strategy runtime state");
        for value in ctx.runtime_values() {
            w.line(format!("{}.Set({})", value.series_name(), value.sampler()));
        }
        w.blank();
    }

    w.line("// Populate OHLCV series");
    for field in OhlcvField::ALL {
        w.line(format!("{}.Set({})", field.series_name(), field.current_bar()));
    }
    w.blank();

    for stmt in program.body() {
        StmtEmitter::new(ctx, w).emit(stmt)?;
    }
    w.blank();

    w.line("// Advance Series cursors");
    w.open("if i < barCount-1 {");
    for name in series_storage(ctx) {
        w.line(format!("{name}.Next()"));
    }
    w.close("}");
    w.close("}");
    Ok(())
}
