//! Generator passes.
//!
//! - [`collection`]: Pass 1 - declare every name, lift inputs, find the title
//! - [`materialization`]: Pass 2 - allocate temp series and record program features
//!
//! Emission runs after both passes against a context it only reads.

pub mod collection;
pub mod materialization;

pub use collection::{CollectionOutput, CollectionPass};
pub use materialization::{MaterializationOutput, MaterializationPass};
