//! Release document types.

mod document;
mod rule;

pub use document::DocumentFormat;
pub use rule::{FlagEntry, INDIVIDUAL_TARGETS, RELEASE_BY_PERCENTAGE, ReleaseConfig, Rule, TargetKey};
