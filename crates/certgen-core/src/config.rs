//! Orchestrator configuration

use std::path::PathBuf;
use std::time::Duration;

use certgen_model::RecordModel;
use chrono::{DateTime, Utc};

/// Default time allowed for rendering one record
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings for one orchestrator run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Parent of the per-run staging directory
    pub temp_root: PathBuf,
    /// Time allowed for one record to render
    pub render_timeout: Duration,
    /// Upper bound on records rendering at the same time
    pub max_parallel_renders: usize,
    /// Defaults applied to every record; record values win
    pub constants: RecordModel,
    /// Issue time of the batch, `None` for the current time
    pub issued_at: Option<DateTime<Utc>>,
    /// Keep the staging directory after plugins have run
    pub keep_artifacts: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            temp_root: PathBuf::from("tmp"),
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            max_parallel_renders: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            constants: RecordModel::new(),
            issued_at: None,
            keep_artifacts: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn with_constants(mut self, constants: RecordModel) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn with_keep_artifacts(mut self, keep: bool) -> Self {
        self.keep_artifacts = keep;
        self
    }
}
