//! Function-name canonicalization and call categories.
//!
//! Scripts may spell builtins the unprefixed v4 way (`sma`, `max`,
//! `security`) or the namespaced v5 way (`ta.sma`, `math.max`,
//! `request.security`). Everything downstream (handler lookup, temp naming,
//! fingerprints) works on the canonical v5 spelling.

use std::borrow::Cow;

/// Technical-analysis functions that take a `ta.` prefix.
const TA_FUNCTIONS: &[&str] = &[
    "sma",
    "ema",
    "rma",
    "wma",
    "stdev",
    "dev",
    "atr",
    "rsi",
    "change",
    "crossover",
    "crossunder",
    "pivothigh",
    "pivotlow",
    "valuewhen",
];

/// Math functions that take a `math.` prefix.
const MATH_FUNCTIONS: &[&str] = &[
    "abs", "sqrt", "floor", "ceil", "round", "log", "exp", "pow", "max", "min", "sum",
];

/// Calls that only affect chart presentation.
const DISPLAY_ONLY: &[&str] = &[
    "bgcolor",
    "barcolor",
    "fill",
    "hline",
    "plotshape",
    "plotchar",
    "plotarrow",
    "alertcondition",
];

/// Canonicalize a callee name to its namespaced spelling.
///
/// `sma` becomes `ta.sma`, `max` becomes `math.max`, `security` becomes
/// `request.security`. Names that are already namespaced, or unknown, are
/// returned unchanged.
pub fn canonical_name(name: &str) -> Cow<'_, str> {
    if name.contains('.') {
        return Cow::Borrowed(name);
    }
    if TA_FUNCTIONS.contains(&name) {
        Cow::Owned(format!("ta.{name}"))
    } else if MATH_FUNCTIONS.contains(&name) {
        Cow::Owned(format!("math.{name}"))
    } else if name == "security" {
        Cow::Borrowed("request.security")
    } else {
        Cow::Borrowed(name)
    }
}

/// Which handler family a canonical function name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    /// Inline per-bar indicator with its own backing series.
    Ta,
    /// Pure math, lowered to a host `math.*` call.
    Math,
    /// `na`, `nz`.
    Value,
    /// `input`, `input.*`.
    Input,
    /// `plot`.
    Plot,
    /// `time(...)`.
    Time,
    /// `request.security`.
    Security,
    /// `strategy.entry`, `strategy.close`, `strategy.close_all`.
    StrategyAction,
    /// `strategy(...)`, `indicator(...)`, `study(...)`.
    Declaration,
    /// Presentation-only calls that emit nothing.
    DisplayOnly,
    /// Anything else.
    Unknown,
}

impl FunctionCategory {
    /// Categorize a canonical function name.
    pub fn of(canonical: &str) -> Self {
        match canonical {
            "math.sum" | "fixnan" => return FunctionCategory::Ta,
            "na" | "nz" => return FunctionCategory::Value,
            "input" => return FunctionCategory::Input,
            "plot" => return FunctionCategory::Plot,
            "time" => return FunctionCategory::Time,
            "request.security" => return FunctionCategory::Security,
            "strategy.entry" | "strategy.close" | "strategy.close_all" => {
                return FunctionCategory::StrategyAction;
            }
            "strategy" | "indicator" | "study" => return FunctionCategory::Declaration,
            _ => {}
        }

        if DISPLAY_ONLY.contains(&canonical) {
            return FunctionCategory::DisplayOnly;
        }

        match canonical.split_once('.') {
            Some(("ta", f)) if TA_FUNCTIONS.contains(&f) => FunctionCategory::Ta,
            Some(("math", f)) if MATH_FUNCTIONS.contains(&f) => FunctionCategory::Math,
            Some(("input", _)) => FunctionCategory::Input,
            _ => FunctionCategory::Unknown,
        }
    }
}
