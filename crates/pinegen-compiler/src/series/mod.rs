//! Series-source classification and accessor factory.
//!
//! A TA primitive reads its source at many offsets inside its loop. The
//! [`SourceClassifier`] decides from the AST (never from lowered text)
//! whether a source is a builtin field or a series, and
//! [`SeriesSource::accessor`] returns the matching [`SeriesAccessor`].

mod accessor;
mod classifier;

pub use accessor::{OhlcvAccessor, SeriesAccessor, SeriesVarAccessor};
pub use classifier::{SeriesSource, SourceClassifier};
