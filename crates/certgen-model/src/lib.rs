//! certgen-model - Shared data model
//!
//! This crate provides the types passed between the certgen crates: the
//! tabular recipient dataset, the per-record model fed to the renderer, run
//! metadata, and the outcome types produced by rendering and delivery.

pub mod dataset;
pub mod metadata;
pub mod outcome;
pub mod plugin;
pub mod record;

pub use dataset::TabularDataset;
pub use metadata::{Extras, RunMetadata};
pub use outcome::{
    Artifact, ExtensionOutcome, OutcomeStatus, RenderOutcome, RenderStatus, RunStatus,
};
pub use plugin::{ConfigFields, ExtensionConfig, FieldRequirement, Settings};
pub use record::RecordModel;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }
}
