//! Configuration file
//!
//! Settings are loaded from `certgen.toml`:
//!
//! ```toml
//! [output]
//! tmp_folder = "tmp"
//! keep_artifacts = true
//!
//! [plugins]
//! dir = "plugins"
//! timeout_secs = 300
//!
//! [render]
//! timeout_secs = 120
//! delimiter_start = "{{"
//! delimiter_end = "}}"
//! strict_extra = true
//! fonts = ["fonts/Inter.ttf"]
//!
//! [constants]
//! issuer = "Rust Foundation"
//! ```
//!
//! Command-line flags take precedence over file values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use certgen_core::OrchestratorConfig;
use certgen_model::RecordModel;
use certgen_pdf::{Delimiters, TemplateConfig};

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "certgen.toml";

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub output: OutputSettings,
    pub plugins: PluginSettings,
    pub render: RenderSettings,
    /// Values available to every record unless the record overrides them
    pub constants: BTreeMap<String, String>,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from `path`, or from `certgen.toml` in the working
    /// directory when present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn template_config(&self) -> TemplateConfig {
        TemplateConfig {
            delimiters: Delimiters::new(&self.render.delimiter_start, &self.render.delimiter_end),
            strict_extra: self.render.strict_extra,
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default()
            .with_temp_root(&self.output.tmp_folder)
            .with_render_timeout(Duration::from_secs(self.render.timeout_secs))
            .with_keep_artifacts(self.output.keep_artifacts)
            .with_constants(self.constants.iter().collect::<RecordModel>());
        if let Some(max) = self.render.max_parallel {
            config.max_parallel_renders = max;
        }
        config
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_secs(self.plugins.timeout_secs)
    }
}

/// Staging area settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Parent folder of per-run staging directories
    pub tmp_folder: PathBuf,
    /// Keep rendered PDFs after plugins ran
    pub keep_artifacts: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            tmp_folder: PathBuf::from("tmp"),
            keep_artifacts: true,
        }
    }
}

/// Output plugin settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Directory scanned for `.rhai` plugins
    pub dir: Option<PathBuf>,
    /// Per-plugin time limit
    pub timeout_secs: u64,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            dir: None,
            timeout_secs: 300,
        }
    }
}

/// Rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Per-record time limit
    pub timeout_secs: u64,
    pub delimiter_start: String,
    pub delimiter_end: String,
    /// Reject records with columns the template does not use
    pub strict_extra: bool,
    /// Extra font files made available to templates
    pub fonts: Vec<PathBuf>,
    /// Records rendered at the same time; defaults to the CPU count
    pub max_parallel: Option<usize>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            delimiter_start: "{{".to_string(),
            delimiter_end: "}}".to_string(),
            strict_extra: true,
            fonts: Vec::new(),
            max_parallel: None,
        }
    }
}
