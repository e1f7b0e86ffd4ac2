//! Offset accessors used inside TA loops.

use pinegen_registry::OhlcvField;

/// Emits reads of a source `k` bars back.
pub trait SeriesAccessor {
    /// Read at a host-side offset expression (`"0"`, `"j"`, `"j+1"`).
    fn at(&self, offset: &str) -> String;

    /// Read at the current bar.
    fn current(&self) -> String;

    /// Read one bar back.
    fn previous(&self) -> String {
        self.at("1")
    }

    /// Whether reads may yield NaN from warmup and need a guard.
    fn needs_nan_check(&self) -> bool;
}

/// Reads a builtin field straight from the bar array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OhlcvAccessor {
    field: OhlcvField,
}

impl OhlcvAccessor {
    pub fn new(field: OhlcvField) -> Self {
        Self { field }
    }
}

impl SeriesAccessor for OhlcvAccessor {
    fn at(&self, offset: &str) -> String {
        let field = self.field.host_field();
        match offset {
            "0" => format!("ctx.Data[i].{field}"),
            o if is_simple_offset(o) => format!("ctx.Data[i-{o}].{field}"),
            o => format!("ctx.Data[i-({o})].{field}"),
        }
    }

    fn current(&self) -> String {
        self.field.current_bar()
    }

    fn needs_nan_check(&self) -> bool {
        false
    }
}

/// Reads a user, runtime or temp series through its ring buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesVarAccessor {
    storage: String,
}

impl SeriesVarAccessor {
    /// `storage` is the full series name (`sma20Series`).
    pub fn new(storage: impl Into<String>) -> Self {
        Self {
            storage: storage.into(),
        }
    }
}

impl SeriesAccessor for SeriesVarAccessor {
    fn at(&self, offset: &str) -> String {
        format!("{}.Get({offset})", self.storage)
    }

    fn current(&self) -> String {
        format!("{}.GetCurrent()", self.storage)
    }

    fn needs_nan_check(&self) -> bool {
        true
    }
}

/// An identifier or integer literal needs no grouping after `i-`.
fn is_simple_offset(offset: &str) -> bool {
    !offset.is_empty() && offset.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohlcv_offsets() {
        let close = OhlcvAccessor::new(OhlcvField::Close);
        assert_eq!(close.at("0"), "ctx.Data[i].Close");
        assert_eq!(close.at("j"), "ctx.Data[i-j].Close");
        assert_eq!(close.at("19"), "ctx.Data[i-19].Close");
        assert_eq!(close.at("j+1"), "ctx.Data[i-(j+1)].Close");
        assert_eq!(close.current(), "bar.Close");
        assert_eq!(close.previous(), "ctx.Data[i-1].Close");
        assert!(!close.needs_nan_check());
    }

    #[test]
    fn series_offsets() {
        let sma = SeriesVarAccessor::new("sma20Series");
        assert_eq!(sma.at("j"), "sma20Series.Get(j)");
        assert_eq!(sma.current(), "sma20Series.GetCurrent()");
        assert_eq!(sma.previous(), "sma20Series.Get(1)");
        assert!(sma.needs_nan_check());
    }
}
