//! Accumulator strategies plugged into the indicator builder.
//!
//! Each strategy contributes the statements before the loop, the fold
//! statement(s) inside it, and the final expression.

use super::loops::LoopDirection;
use crate::series::SeriesAccessor;

/// A windowed fold.
pub trait Accumulator {
    /// Statements emitted before the loop.
    fn initialize(&self, period: u32, accessor: &dyn SeriesAccessor) -> Vec<String>;

    /// Loop order.
    fn direction(&self) -> LoopDirection {
        LoopDirection::Forward
    }

    /// Statements folding `value` into the state.
    fn accumulate(&self, value: &str, period: u32) -> Vec<String>;

    /// The result expression.
    fn finalize(&self, period: u32) -> String;
}

/// `sum += v`, optionally divided by the period.
#[derive(Debug, Clone, Copy)]
pub struct Sum {
    average: bool,
}

impl Sum {
    /// Mean of the window.
    pub fn mean() -> Self {
        Self { average: true }
    }

    /// Plain windowed sum.
    pub fn total() -> Self {
        Self { average: false }
    }
}

impl Accumulator for Sum {
    fn initialize(&self, _: u32, _: &dyn SeriesAccessor) -> Vec<String> {
        vec!["sum := 0.0".to_string()]
    }

    fn accumulate(&self, value: &str, _: u32) -> Vec<String> {
        vec![format!("sum += {value}")]
    }

    fn finalize(&self, period: u32) -> String {
        if self.average {
            format!("sum / {period}.0")
        } else {
            "sum".to_string()
        }
    }
}

/// Linearly weighted sum; the newest bar weighs `p`, the oldest 1.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSum;

impl Accumulator for WeightedSum {
    fn initialize(&self, _: u32, _: &dyn SeriesAccessor) -> Vec<String> {
        vec!["weightedSum := 0.0".to_string()]
    }

    fn accumulate(&self, value: &str, period: u32) -> Vec<String> {
        vec![format!("weightedSum += {value} * float64({period}-j)")]
    }

    fn finalize(&self, period: u32) -> String {
        let weights = u64::from(period) * (u64::from(period) + 1) / 2;
        format!("weightedSum / {weights}.0")
    }
}

/// Smoothing factor of an exponential average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alpha {
    /// `2/(p+1)`
    Ema,
    /// `1/p`
    Rma,
}

impl Alpha {
    fn render(&self, period: u32) -> String {
        match self {
            Alpha::Ema => format!("2.0 / float64({period}+1)"),
            Alpha::Rma => format!("1.0 / float64({period})"),
        }
    }
}

/// Exponential smoothing seeded from the oldest sample in the window.
#[derive(Debug, Clone, Copy)]
pub struct Exponential {
    alpha: Alpha,
}

impl Exponential {
    pub fn new(alpha: Alpha) -> Self {
        Self { alpha }
    }
}

impl Accumulator for Exponential {
    fn initialize(&self, period: u32, accessor: &dyn SeriesAccessor) -> Vec<String> {
        let oldest = period.saturating_sub(1).to_string();
        vec![
            format!("alpha := {}", self.alpha.render(period)),
            format!("ema := {}", accessor.at(&oldest)),
        ]
    }

    fn direction(&self) -> LoopDirection {
        LoopDirection::Backward
    }

    fn accumulate(&self, value: &str, _: u32) -> Vec<String> {
        vec![format!("ema = alpha*{value} + (1-alpha)*ema")]
    }

    fn finalize(&self, _: u32) -> String {
        "ema".to_string()
    }
}

/// Sum of squared deviations from `mean`; the second pass of STDEV.
#[derive(Debug, Clone, Copy)]
pub struct Variance;

impl Accumulator for Variance {
    fn initialize(&self, _: u32, _: &dyn SeriesAccessor) -> Vec<String> {
        vec!["variance := 0.0".to_string()]
    }

    fn accumulate(&self, value: &str, _: u32) -> Vec<String> {
        vec![
            format!("diff := {value} - mean"),
            "variance += diff * diff".to_string(),
        ]
    }

    fn finalize(&self, period: u32) -> String {
        format!("variance / {period}.0")
    }
}

/// Sum of absolute deviations from `mean`; the second pass of DEV.
#[derive(Debug, Clone, Copy)]
pub struct AbsDeviation;

impl Accumulator for AbsDeviation {
    fn initialize(&self, _: u32, _: &dyn SeriesAccessor) -> Vec<String> {
        vec!["deviation := 0.0".to_string()]
    }

    fn accumulate(&self, value: &str, _: u32) -> Vec<String> {
        vec![format!("deviation += math.Abs({value} - mean)")]
    }

    fn finalize(&self, period: u32) -> String {
        format!("deviation / {period}.0")
    }
}
