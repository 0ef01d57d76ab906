//! Output plugin contract
//!
//! Every delivery mechanism, native or scripted, implements [`OutputPlugin`].

use certgen_model::{Artifact, ConfigFields, OutcomeStatus, RunMetadata, Settings, TabularDataset};
use serde::Serialize;

/// Everything a plugin can see about the run it delivers
#[derive(Debug, Clone, Serialize)]
pub struct PluginContext {
    /// Successfully rendered documents
    pub artifacts: Vec<Artifact>,
    /// The full recipient dataset, header included
    pub dataset: TabularDataset,
    pub metadata: RunMetadata,
}

/// What a plugin reports back after running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginReport {
    pub status: OutcomeStatus,
    pub message: String,
}

impl PluginReport {
    pub fn new(status: OutcomeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Warning, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(OutcomeStatus::Failure, message)
    }
}

/// A delivery extension
///
/// `run` is called on a blocking worker thread and may perform I/O freely.
/// Required settings declared by `required_fields` are checked by the
/// manager before `run` is invoked.
pub trait OutputPlugin: Send + Sync {
    /// Settings this plugin understands and whether each one is required
    fn required_fields(&self) -> ConfigFields;

    /// Deliver the run's artifacts
    fn run(&self, settings: &Settings, ctx: &PluginContext) -> PluginReport;
}
