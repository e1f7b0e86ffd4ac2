//! Builtin identifiers and their host spellings.
//!
//! Every builtin the generator resolves without a user declaration lives
//! here: the five OHLCV fields, the `na` sentinel, bar scalars such as
//! `bar_index`, and the strategy runtime values that are sampled into
//! series once per bar.

use pinegen_core::TypeTag;

/// One of the five fixed per-bar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OhlcvField {
    Close,
    High,
    Low,
    Open,
    Volume,
}

impl OhlcvField {
    /// All fields, in series declaration order.
    pub const ALL: [OhlcvField; 5] = [
        OhlcvField::Close,
        OhlcvField::High,
        OhlcvField::Low,
        OhlcvField::Open,
        OhlcvField::Volume,
    ];

    /// Look up a field by its DSL name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "close" => Some(OhlcvField::Close),
            "high" => Some(OhlcvField::High),
            "low" => Some(OhlcvField::Low),
            "open" => Some(OhlcvField::Open),
            "volume" => Some(OhlcvField::Volume),
            _ => None,
        }
    }

    /// The DSL name (`close`).
    pub fn name(&self) -> &'static str {
        match self {
            OhlcvField::Close => "close",
            OhlcvField::High => "high",
            OhlcvField::Low => "low",
            OhlcvField::Open => "open",
            OhlcvField::Volume => "volume",
        }
    }

    /// The host record field (`Close`).
    pub fn host_field(&self) -> &'static str {
        match self {
            OhlcvField::Close => "Close",
            OhlcvField::High => "High",
            OhlcvField::Low => "Low",
            OhlcvField::Open => "Open",
            OhlcvField::Volume => "Volume",
        }
    }

    /// The always-declared backing series (`closeSeries`).
    pub fn series_name(&self) -> &'static str {
        match self {
            OhlcvField::Close => "closeSeries",
            OhlcvField::High => "highSeries",
            OhlcvField::Low => "lowSeries",
            OhlcvField::Open => "openSeries",
            OhlcvField::Volume => "volumeSeries",
        }
    }

    /// Read at the current bar (`bar.Close`).
    pub fn current_bar(&self) -> String {
        format!("bar.{}", self.host_field())
    }

    /// Bounds-checked read `offset` bars back, NaN before the first bar.
    pub fn historical(&self, offset: u32) -> String {
        if offset == 0 {
            return self.current_bar();
        }
        format!(
            "func() float64 {{ if i-{offset} >= 0 {{ return ctx.Data[i-{offset}].{} }}; return math.NaN() }}()",
            self.host_field()
        )
    }
}

/// Builtin scalars that read bar or context metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinScalar {
    /// `bar_index`
    BarIndex,
    /// `time` used as a value rather than called
    Time,
    /// `syminfo.tickerid` / `tickerid`
    TickerId,
    /// `timeframe.period`
    Timeframe,
}

impl BuiltinScalar {
    /// Look up a scalar by its (qualified) DSL name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bar_index" => Some(BuiltinScalar::BarIndex),
            "time" => Some(BuiltinScalar::Time),
            "syminfo.tickerid" | "tickerid" => Some(BuiltinScalar::TickerId),
            "timeframe.period" => Some(BuiltinScalar::Timeframe),
            _ => None,
        }
    }

    /// The host expression.
    pub fn host_expr(&self) -> &'static str {
        match self {
            BuiltinScalar::BarIndex => "float64(i)",
            BuiltinScalar::Time => "float64(bar.Time)",
            BuiltinScalar::TickerId => "ctx.Symbol",
            BuiltinScalar::Timeframe => "ctx.Timeframe",
        }
    }

    /// The inferred DSL type.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            BuiltinScalar::BarIndex | BuiltinScalar::Time => TypeTag::Float,
            BuiltinScalar::TickerId | BuiltinScalar::Timeframe => TypeTag::String,
        }
    }
}

/// Strategy runtime state sampled into a series before user code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuntimeValue {
    PositionAvgPrice,
    PositionSize,
    Equity,
    NetProfit,
    ClosedTrades,
}

impl RuntimeValue {
    /// All runtime values, in sampling order.
    pub const ALL: [RuntimeValue; 5] = [
        RuntimeValue::PositionAvgPrice,
        RuntimeValue::PositionSize,
        RuntimeValue::Equity,
        RuntimeValue::NetProfit,
        RuntimeValue::ClosedTrades,
    ];

    /// Look up a runtime value by its qualified DSL name (`strategy.equity`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_property(name.strip_prefix("strategy.")?)
    }

    /// Look up a runtime value by its property name (`equity`).
    pub fn from_property(property: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.property() == property)
    }

    /// The property name under `strategy.`.
    pub fn property(&self) -> &'static str {
        match self {
            RuntimeValue::PositionAvgPrice => "position_avg_price",
            RuntimeValue::PositionSize => "position_size",
            RuntimeValue::Equity => "equity",
            RuntimeValue::NetProfit => "netprofit",
            RuntimeValue::ClosedTrades => "closedtrades",
        }
    }

    /// The sampling series (`strategy_equitySeries`).
    pub fn series_name(&self) -> String {
        format!("strategy_{}Series", self.property())
    }

    /// Host expression that samples the value for the current bar.
    ///
    /// A flat position reports an average price of zero; it samples as NaN.
    pub fn sampler(&self) -> &'static str {
        match self {
            RuntimeValue::PositionAvgPrice => {
                "func() float64 { if avg := strat.GetPositionAvgPrice(); avg != 0 { return avg } else { return math.NaN() } }()"
            }
            RuntimeValue::PositionSize => "strat.GetPositionSize()",
            RuntimeValue::Equity => "strat.GetEquity(bar.Close)",
            RuntimeValue::NetProfit => "strat.GetNetProfit()",
            RuntimeValue::ClosedTrades => "float64(len(strat.GetTradeHistory().GetClosedTrades()))",
        }
    }

    /// Read at the current bar.
    pub fn current(&self) -> String {
        format!("{}.Get(0)", self.series_name())
    }
}

/// Any builtin identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Ohlcv(OhlcvField),
    /// The `na` sentinel.
    Na,
    Scalar(BuiltinScalar),
    Runtime(RuntimeValue),
}

impl Builtin {
    /// Resolve a bare or qualified name to a builtin.
    pub fn lookup(name: &str) -> Option<Self> {
        if name == "na" {
            return Some(Builtin::Na);
        }
        OhlcvField::from_name(name)
            .map(Builtin::Ohlcv)
            .or_else(|| BuiltinScalar::from_name(name).map(Builtin::Scalar))
            .or_else(|| RuntimeValue::from_name(name).map(Builtin::Runtime))
    }

    /// Whether a user declaration may not shadow this name.
    pub fn is_reserved(name: &str) -> bool {
        Self::lookup(name).is_some()
    }
}
