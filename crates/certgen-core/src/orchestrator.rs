//! Generation orchestrator
//!
//! Turns one dataset into one render job per record, runs the jobs
//! concurrently, then hands the successful documents to the output plugins
//! and folds everything into a single [`RunStatus`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use certgen_model::{
    Artifact, ExtensionConfig, Extras, RecordModel, RenderOutcome, RenderStatus, RunMetadata,
    RunStatus, TabularDataset,
};
use certgen_pdf::DocumentRenderer;
use certgen_plugins::OutputManager;
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;

/// Drives one generation run
///
/// An orchestrator owns the metadata of exactly one run, so
/// [`generate`](Orchestrator::generate) consumes it.
pub struct Orchestrator<R: DocumentRenderer> {
    renderer: R,
    manager: OutputManager,
    config: OrchestratorConfig,
    metadata: RunMetadata,
}

impl<R: DocumentRenderer> Orchestrator<R> {
    pub fn new(renderer: R, manager: OutputManager, config: OrchestratorConfig) -> Self {
        let issued_at = config.issued_at.unwrap_or_else(Utc::now);
        let metadata = RunMetadata::new(issued_at, Uuid::new_v4().to_string());
        Self {
            renderer,
            manager,
            config,
            metadata,
        }
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn manager(&self) -> &OutputManager {
        &self.manager
    }

    /// Staging directory of this run: `<temp_root>/<issue millis>-<run id>`
    pub fn run_dir(&self) -> PathBuf {
        self.config.temp_root.join(format!(
            "{}-{}",
            self.metadata.issue_millis(),
            self.metadata.run_id
        ))
    }

    /// Render every record and dispatch the requested output plugins.
    ///
    /// Whole-batch problems (no template, no header row, a template the
    /// renderer rejects) end the run with a `Failure` status before any
    /// record is rendered or plugin invoked. Everything else is reported per
    /// record and per plugin.
    pub async fn generate(
        self,
        template_path: &Path,
        dataset: TabularDataset,
        requests: &[ExtensionConfig],
        extras: Extras,
    ) -> RunStatus {
        if let Err(e) = check_preconditions(template_path, &dataset) {
            warn!("{}", e);
            return RunStatus::failure(e.to_string());
        }

        let mut renderer = self.renderer.clone();
        renderer.set_template(template_path);
        renderer.set_constants(self.config.constants.clone());
        if let Some(outcome) = renderer.template_error() {
            warn!(status = %outcome.status, "template rejected: {}", outcome.message);
            return RunStatus::failure(outcome.message);
        }

        let run_id = self.metadata.run_id.clone();
        let run_dir = self.run_dir();
        if let Err(source) = fs::create_dir_all(&run_dir) {
            let e = OrchestratorError::RunDirectory {
                path: run_dir,
                source,
            };
            warn!("{}", e);
            return RunStatus::failure(e.to_string());
        }

        info!(
            run_id = %run_id,
            records = dataset.record_count(),
            plugins = requests.len(),
            dir = %run_dir.display(),
            "starting generation run"
        );

        let records = self
            .render_all(Arc::new(renderer), dataset.record_models(), &run_dir)
            .await;

        let artifacts: Vec<Artifact> = records
            .iter()
            .enumerate()
            .filter(|(_, outcome)| outcome.is_success())
            .map(|(record, _)| Artifact {
                record,
                path: staged_path(&run_dir, record),
            })
            .collect();

        let metadata = self.metadata.clone().with_extras(extras);
        let extensions = self
            .manager
            .generate_output(requests, artifacts, dataset, metadata)
            .await;

        if !self.config.keep_artifacts {
            if let Err(e) = fs::remove_dir_all(&run_dir) {
                warn!(dir = %run_dir.display(), "could not remove run directory: {}", e);
            }
        }

        let status = RunStatus::completed(records, extensions).with_run(run_id, run_dir);
        info!(status = %status.status, "{}", status.message);
        status
    }

    /// Render all models concurrently, outcomes in model order
    async fn render_all(
        &self,
        renderer: Arc<R>,
        models: Vec<RecordModel>,
        run_dir: &Path,
    ) -> Vec<RenderOutcome> {
        let count = models.len();
        let permits = Arc::new(Semaphore::new(self.config.max_parallel_renders.max(1)));
        let limit = self.config.render_timeout;
        let mut tasks = JoinSet::new();

        for (index, model) in models.into_iter().enumerate() {
            let renderer = Arc::clone(&renderer);
            let permits = Arc::clone(&permits);
            let output = staged_path(run_dir, index);

            tasks.spawn(async move {
                let Ok(permit) = permits.acquire_owned().await else {
                    return (
                        index,
                        RenderOutcome::with_message(RenderStatus::UnknownError, "Render queue closed."),
                    );
                };

                // The permit is released when the blocking render really ends,
                // not when we stop waiting for it.
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    renderer.render(&model, &output)
                });

                let outcome = match tokio::time::timeout(limit, work).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => RenderOutcome::with_message(
                        RenderStatus::UnknownError,
                        format!("Renderer panicked: {}", e),
                    ),
                    Err(_) => RenderOutcome::from_status(RenderStatus::TimedOut),
                };
                (index, outcome)
            });
        }

        let mut outcomes = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    debug!(record = index, status = %outcome.status, "record finished");
                    outcomes.insert(index, outcome);
                }
                Err(e) => warn!("render task failed to join: {}", e),
            }
        }

        (0..count)
            .map(|index| {
                outcomes.remove(&index).unwrap_or_else(|| {
                    RenderOutcome::with_message(
                        RenderStatus::UnknownError,
                        "Render task did not complete.",
                    )
                })
            })
            .collect()
    }
}

fn staged_path(run_dir: &Path, record: usize) -> PathBuf {
    run_dir.join(format!("{}.pdf", record))
}

fn check_preconditions(
    template_path: &Path,
    dataset: &TabularDataset,
) -> Result<(), OrchestratorError> {
    if template_path.as_os_str().is_empty() {
        return Err(OrchestratorError::MissingTemplatePath);
    }
    if !template_path.is_file() {
        return Err(OrchestratorError::TemplateNotFound(
            template_path.to_path_buf(),
        ));
    }
    if dataset.is_empty() {
        return Err(OrchestratorError::EmptyDataset);
    }
    Ok(())
}
