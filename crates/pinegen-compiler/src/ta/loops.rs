//! Window loops over a source accessor.

use crate::emit::CodeWriter;
use crate::series::SeriesAccessor;

/// Iteration order over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopDirection {
    /// `j` from 0 (newest) to `p-1` (oldest). For commutative folds.
    Forward,
    /// `j` from `p-2` down to 0, after seeding from offset `p-1`.
    /// For recurrences that must run oldest to newest.
    Backward,
}

/// Emits `for j` loops that read through an accessor.
pub struct LoopGenerator<'a> {
    period: u32,
    accessor: &'a dyn SeriesAccessor,
    nan_check: bool,
}

impl<'a> LoopGenerator<'a> {
    pub fn new(period: u32, accessor: &'a dyn SeriesAccessor) -> Self {
        Self {
            period,
            accessor,
            nan_check: accessor.needs_nan_check(),
        }
    }

    /// Read without a NaN guard regardless of the accessor.
    pub fn without_nan_check(mut self) -> Self {
        self.nan_check = false;
        self
    }

    /// Whether the body guards reads and maintains `hasNaN`.
    pub fn needs_nan_check(&self) -> bool {
        self.nan_check
    }

    /// Open the loop header.
    pub fn open(&self, direction: LoopDirection, w: &mut CodeWriter) {
        match direction {
            LoopDirection::Forward => {
                w.open(format!("for j := 0; j < {}; j++ {{", self.period));
            }
            LoopDirection::Backward => {
                let start = i64::from(self.period) - 2;
                w.open(format!("for j := {start}; j >= 0; j-- {{"));
            }
        }
    }

    /// Emit the read of the current element and return the expression that
    /// names it. With a NaN guard, the value is bound to `val` and a NaN
    /// sets `hasNaN` and leaves the loop.
    pub fn read(&self, w: &mut CodeWriter) -> String {
        let access = self.accessor.at("j");
        if !self.nan_check {
            return access;
        }
        w.line(format!("val := {access}"));
        w.open("if math.IsNaN(val) {");
        w.line("hasNaN = true");
        w.line("break");
        w.close("}");
        "val".to_string()
    }

    /// Close the loop.
    pub fn close(&self, w: &mut CodeWriter) {
        w.close("}");
    }
}
