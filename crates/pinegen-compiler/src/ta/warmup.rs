//! Warmup gates.

use crate::emit::CodeWriter;

/// Emits the static two-state gate in front of an indicator: NaN while the
/// window is not yet full, the calculation afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmupChecker {
    min_bars: u32,
}

impl WarmupChecker {
    /// A gate for an indicator that needs `min_bars` bars of history,
    /// counting the current one.
    pub fn new(min_bars: u32) -> Self {
        Self {
            min_bars: min_bars.max(1),
        }
    }

    /// Bars required before the first value.
    pub fn min_bars(&self) -> u32 {
        self.min_bars
    }

    /// Open the gate: `if ctx.BarIndex < n-1 { NaN } else {`.
    pub fn open(&self, target: &str, w: &mut CodeWriter) {
        w.open(format!("if ctx.BarIndex < {} {{", self.min_bars - 1));
        w.line(format!("{target}Series.Set(math.NaN())"));
        w.reopen("} else {");
    }

    /// Close the `else` branch.
    pub fn close(&self, w: &mut CodeWriter) {
        w.close("}");
    }
}
