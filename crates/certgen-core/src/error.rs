//! Whole-batch errors
//!
//! These never escape [`crate::Orchestrator::generate`]; they are folded into
//! a failed `RunStatus` carrying the error text.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Template path not set.")]
    MissingTemplatePath,

    #[error("Template file does not exist: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Recipient data is empty: a header row is required.")]
    EmptyDataset,

    #[error("Could not create run directory {}: {source}", .path.display())]
    RunDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
