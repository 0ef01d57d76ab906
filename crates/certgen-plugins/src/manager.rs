//! Output plugin manager
//!
//! Keeps a registry of delivery plugins keyed by id and fans a run's
//! artifacts out to the requested ones.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use certgen_model::{
    Artifact, ExtensionConfig, ExtensionOutcome, RunMetadata, TabularDataset,
};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{PluginError, Result};
use crate::local::LocalPlugin;
use crate::plugin::{OutputPlugin, PluginContext};
use crate::script::{ScriptEngine, ScriptPlugin};

/// Default time allowed for a single plugin run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Message for requests naming an unknown or invalid plugin
pub const NOT_FOUND_MESSAGE: &str = "Plugin not found or invalid.";

/// A registered id: either a usable plugin or the reason it is unusable
#[derive(Clone)]
pub enum PluginSlot {
    Valid(Arc<dyn OutputPlugin>),
    Invalid(String),
}

/// Where a plugin came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOrigin {
    Builtin,
    Script(PathBuf),
}

#[derive(Clone)]
pub struct PluginEntry {
    pub slot: PluginSlot,
    pub origin: PluginOrigin,
}

impl PluginEntry {
    pub fn plugin(&self) -> Option<&Arc<dyn OutputPlugin>> {
        match &self.slot {
            PluginSlot::Valid(plugin) => Some(plugin),
            PluginSlot::Invalid(_) => None,
        }
    }
}

pub struct OutputManager {
    entries: BTreeMap<String, PluginEntry>,
    engine: Arc<ScriptEngine>,
    plugins_dir: Option<PathBuf>,
    timeout: Duration,
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputManager {
    /// Create a manager with the built-in plugins registered
    pub fn new() -> Self {
        let mut manager = Self {
            entries: BTreeMap::new(),
            engine: Arc::new(ScriptEngine::new()),
            plugins_dir: None,
            timeout: DEFAULT_TIMEOUT,
        };
        manager.register("local", Arc::new(LocalPlugin::new()));
        manager
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn plugins_dir(&self) -> Option<&Path> {
        self.plugins_dir.as_deref()
    }

    /// Register a native plugin, replacing any plugin with the same id
    pub fn register(&mut self, id: impl Into<String>, plugin: Arc<dyn OutputPlugin>) {
        self.entries.insert(
            id.into(),
            PluginEntry {
                slot: PluginSlot::Valid(plugin),
                origin: PluginOrigin::Builtin,
            },
        );
    }

    /// Discover `.rhai` scripts directly inside `dir`.
    ///
    /// Each script is registered under its file stem. Scripts that fail
    /// validation still occupy their id as invalid slots. Scripts loaded from
    /// a previous directory are forgotten. Returns the number of candidates.
    pub fn set_plugins_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Err(PluginError::DirNotFound(dir.to_path_buf()));
        }

        let mut scripts: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "rhai"))
            .collect();
        scripts.sort();

        self.entries
            .retain(|_, entry| entry.origin == PluginOrigin::Builtin);

        for path in &scripts {
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let slot = match ScriptPlugin::load(Arc::clone(&self.engine), path) {
                Ok(plugin) => {
                    debug!(id, path = %path.display(), "loaded plugin script");
                    PluginSlot::Valid(Arc::new(plugin))
                }
                Err(e) => {
                    warn!(id, path = %path.display(), "invalid plugin script: {}", e);
                    PluginSlot::Invalid(e.to_string())
                }
            };

            if self.entries.contains_key(id) {
                warn!(id, "plugin script overrides a built-in plugin");
            }
            self.entries.insert(
                id.to_string(),
                PluginEntry {
                    slot,
                    origin: PluginOrigin::Script(path.clone()),
                },
            );
        }

        info!(dir = %dir.display(), count = scripts.len(), "discovered plugin scripts");
        self.plugins_dir = Some(dir.to_path_buf());
        Ok(scripts.len())
    }

    /// Known plugin ids, sorted
    pub fn plugin_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entry(&self, id: &str) -> Option<&PluginEntry> {
        self.entries.get(id)
    }

    pub fn slot(&self, id: &str) -> Option<&PluginSlot> {
        self.entries.get(id).map(|entry| &entry.slot)
    }

    /// Run every requested plugin against the run's artifacts.
    ///
    /// Returns exactly one outcome per request, in request order. A failing,
    /// panicking or slow plugin only affects its own outcome.
    pub async fn generate_output(
        &self,
        requests: &[ExtensionConfig],
        artifacts: Vec<Artifact>,
        dataset: TabularDataset,
        metadata: RunMetadata,
    ) -> Vec<ExtensionOutcome> {
        let ctx = Arc::new(PluginContext {
            artifacts,
            dataset,
            metadata,
        });

        let mut outcomes: BTreeMap<usize, ExtensionOutcome> = BTreeMap::new();
        let mut tasks = JoinSet::new();

        for (index, request) in requests.iter().enumerate() {
            let Some(plugin) = self.entry(&request.id).and_then(PluginEntry::plugin) else {
                warn!(id = %request.id, "requested plugin is not available");
                outcomes.insert(
                    index,
                    ExtensionOutcome::failure(&request.id, NOT_FOUND_MESSAGE),
                );
                continue;
            };

            if let Some(name) = request.first_missing_required(&plugin.required_fields()) {
                outcomes.insert(
                    index,
                    ExtensionOutcome::failure(
                        &request.id,
                        format!("Missing required setting: {}", name),
                    ),
                );
                continue;
            }

            let plugin = Arc::clone(plugin);
            let ctx = Arc::clone(&ctx);
            let request = request.clone();
            let limit = self.timeout;

            tasks.spawn(async move {
                let id = request.id.clone();
                let work =
                    tokio::task::spawn_blocking(move || plugin.run(&request.settings, &ctx));

                let outcome = match tokio::time::timeout(limit, work).await {
                    Ok(Ok(report)) => ExtensionOutcome::new(&id, report.status, report.message),
                    Ok(Err(e)) => ExtensionOutcome::failure(&id, format!("Plugin panicked: {}", e)),
                    Err(_) => ExtensionOutcome::failure(
                        &id,
                        format!("Plugin timed out after {:?}.", limit),
                    ),
                };
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    debug!(id = %outcome.plugin_id, status = %outcome.status, "plugin finished");
                    outcomes.insert(index, outcome);
                }
                Err(e) => warn!("plugin task failed to join: {}", e),
            }
        }

        requests
            .iter()
            .enumerate()
            .map(|(index, request)| {
                outcomes.remove(&index).unwrap_or_else(|| {
                    ExtensionOutcome::failure(&request.id, "Plugin task did not complete.")
                })
            })
            .collect()
    }
}
