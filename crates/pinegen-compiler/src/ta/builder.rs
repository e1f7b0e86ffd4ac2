//! Windowed indicator composition.
//!
//! The [`IndicatorBuilder`] composes the pieces every windowed primitive
//! shares: the header comment, the warmup gate, the accumulator's
//! initialization, the window loop and the NaN-aware finalization.

use super::accumulator::{Accumulator, Sum};
use super::loops::LoopGenerator;
use super::warmup::WarmupChecker;
use crate::emit::CodeWriter;
use crate::series::SeriesAccessor;

/// Builds one windowed indicator writing into `{target}Series`.
pub struct IndicatorBuilder<'a> {
    name: &'a str,
    target: &'a str,
    period: u32,
    accessor: &'a dyn SeriesAccessor,
}

impl<'a> IndicatorBuilder<'a> {
    pub fn new(
        name: &'a str,
        target: &'a str,
        period: u32,
        accessor: &'a dyn SeriesAccessor,
    ) -> Self {
        Self {
            name,
            target,
            period,
            accessor,
        }
    }

    /// `/* Inline sma(20) */`
    pub fn header(&self, w: &mut CodeWriter) {
        w.line(format!("/* Inline {}({}) */", self.name, self.period));
    }

    /// A single-pass fold.
    pub fn build(&self, acc: &dyn Accumulator, w: &mut CodeWriter) {
        let gate = WarmupChecker::new(self.period);
        self.header(w);
        gate.open(self.target, w);

        let lp = LoopGenerator::new(self.period, self.accessor);
        self.fold(acc, &lp, w);
        self.finish(lp.needs_nan_check(), w, |w| {
            w.line(self.set(&acc.finalize(self.period)));
        });

        gate.close(w);
    }

    /// A mean pass followed by a second-moment pass over the same window.
    ///
    /// The second pass sees `mean` in scope. Its result is wrapped in
    /// `wrap(...)` when given (`math.Sqrt` for a standard deviation).
    pub fn build_two_pass(&self, second: &dyn Accumulator, wrap: Option<&str>, w: &mut CodeWriter) {
        let gate = WarmupChecker::new(self.period);
        self.header(w);
        gate.open(self.target, w);

        let mean = Sum::mean();
        let first = LoopGenerator::new(self.period, self.accessor);
        self.fold(&mean, &first, w);
        self.finish(first.needs_nan_check(), w, |w| {
            w.line(format!("mean := {}", mean.finalize(self.period)));
            let pass = LoopGenerator::new(self.period, self.accessor).without_nan_check();
            self.fold(second, &pass, w);
            let result = second.finalize(self.period);
            let result = match wrap {
                Some(f) => format!("{f}({result})"),
                None => result,
            };
            w.line(self.set(&result));
        });

        gate.close(w);
    }

    /// `{target}Series.Set(value)`
    pub fn set(&self, value: &str) -> String {
        format!("{}Series.Set({value})", self.target)
    }

    fn fold(&self, acc: &dyn Accumulator, lp: &LoopGenerator<'_>, w: &mut CodeWriter) {
        for line in acc.initialize(self.period, self.accessor) {
            w.line(line);
        }
        if lp.needs_nan_check() {
            w.line("hasNaN := false");
        }
        lp.open(acc.direction(), w);
        let value = lp.read(w);
        for line in acc.accumulate(&value, self.period) {
            w.line(line);
        }
        lp.close(w);
    }

    fn finish(&self, nan_check: bool, w: &mut CodeWriter, body: impl FnOnce(&mut CodeWriter)) {
        if !nan_check {
            body(w);
            return;
        }
        w.open("if hasNaN {");
        w.line(self.set("math.NaN()"));
        w.reopen("} else {");
        body(w);
        w.close("}");
    }
}
