//! The three-way DSL type tag.

use std::fmt;

/// Inferred type of a DSL name or expression.
///
/// Storage is uniformly float; the tag only governs coercion where a value
/// is read back (e.g. `!= 0` for booleans in conditions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeTag {
    Bool,
    #[default]
    Float,
    String,
}

impl TypeTag {
    pub fn is_bool(&self) -> bool {
        matches!(self, TypeTag::Bool)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TypeTag::String)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeTag::Bool => "bool",
            TypeTag::Float => "float",
            TypeTag::String => "string",
        })
    }
}
