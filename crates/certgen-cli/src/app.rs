//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use certgen_core::Orchestrator;
use certgen_data::ReadOptions;
use certgen_model::{ExtensionConfig, Extras, FieldRequirement, OutcomeStatus, RunStatus};
use certgen_pdf::{Compiler, TypstRenderer};
use certgen_plugins::{OutputManager, PluginOrigin, PluginSlot};

use crate::config::Settings;

/// Output format for run reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "certgen")]
#[command(author, version, about = "Batch certificate generator", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one certificate per recipient and run the output plugins
    Generate(GenerateArgs),

    /// List the available output plugins and their settings
    Plugins(PluginsArgs),
}

/// Arguments of `certgen generate`
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Recipients file (.csv, .tsv, .xlsx, .xlsm, .xls or .ods)
    #[arg(short, long)]
    pub recipients: PathBuf,

    /// Worksheet to read from a spreadsheet (defaults to the first)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Typst template with {{field}} placeholders
    #[arg(short, long)]
    pub template: PathBuf,

    /// JSON object mapping plugin id to its settings
    #[arg(short, long)]
    pub plugins_config: Option<PathBuf>,

    /// Extra run metadata (.json or .toml)
    #[arg(short, long)]
    pub metadata: Option<PathBuf>,

    /// Folder for intermediate PDFs
    #[arg(long)]
    pub tmp_folder: Option<PathBuf>,

    /// Directory with .rhai output plugins
    #[arg(long)]
    pub plugins_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments of `certgen plugins`
#[derive(Debug, Clone, Args)]
pub struct PluginsArgs {
    /// Directory with .rhai output plugins
    #[arg(long)]
    pub plugins_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(args) => {
            let status = block_on_detached(generate_command(&args))??;
            print_status(&status, args.format)?;
            if status.is_failure() {
                std::process::exit(1);
            }
        }
        Commands::Plugins(args) => {
            let settings = Settings::load(args.config.as_deref())?;
            let manager = build_manager(&settings, args.plugins_dir.as_deref())?;
            print_plugins(&manager, args.format)?;
        }
    }

    Ok(())
}

/// Drive `future` to completion on a fresh runtime.
///
/// Renders and plugins that outlived their timeout still occupy blocking
/// threads; the runtime is shut down without joining them so they cannot
/// hold the process open.
pub fn block_on_detached<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Execute the generate command
///
/// Fatal setup problems (unreadable recipients, bad plugin configuration, a
/// missing plugins directory) are returned as errors. Everything that happens
/// once the run started is reported in the returned status.
pub async fn generate_command(args: &GenerateArgs) -> Result<RunStatus> {
    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(tmp) = &args.tmp_folder {
        settings.output.tmp_folder = tmp.clone();
    }

    let read_options = ReadOptions {
        sheet: args.sheet.clone(),
    };
    let dataset = certgen_data::read_recipients_with(&args.recipients, &read_options)
        .with_context(|| format!("Failed to read recipients: {}", args.recipients.display()))?;

    let requests = match &args.plugins_config {
        Some(path) => load_requests(path)?,
        None => Vec::new(),
    };
    let extras = match &args.metadata {
        Some(path) => load_metadata(path)?,
        None => Extras::new(),
    };

    let manager = build_manager(&settings, args.plugins_dir.as_deref())?;
    let compiler = Compiler::with_fonts(&settings.render.fonts).context("Failed to load fonts")?;
    let renderer = TypstRenderer::with_config(settings.template_config()).with_compiler(compiler);

    info!(
        recipients = %args.recipients.display(),
        template = %args.template.display(),
        records = dataset.record_count(),
        "generating certificates"
    );

    let orchestrator = Orchestrator::new(renderer, manager, settings.orchestrator_config());
    Ok(orchestrator
        .generate(&args.template, dataset, &requests, extras)
        .await)
}

/// Build the plugin manager, discovering scripts when a directory is configured
pub fn build_manager(settings: &Settings, plugins_dir: Option<&Path>) -> Result<OutputManager> {
    let mut manager = OutputManager::new().with_timeout(settings.plugin_timeout());

    if let Some(dir) = plugins_dir.or(settings.plugins.dir.as_deref()) {
        let count = manager
            .set_plugins_dir(dir)
            .with_context(|| format!("Failed to load plugins from {}", dir.display()))?;
        debug!(count, "plugin scripts discovered");
    }

    Ok(manager)
}

/// Read plugin requests from a JSON object of `id → settings`
pub fn load_requests(path: &Path) -> Result<Vec<ExtensionConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plugins config: {}", path.display()))?;
    let map: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("Plugins config must be a JSON object: {}", path.display()))?;
    Ok(ExtensionConfig::from_json_map(map))
}

/// Read extra run metadata from a JSON or TOML file
pub fn load_metadata(path: &Path) -> Result<Extras> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        let table: toml::Table = toml::from_str(&content)
            .with_context(|| format!("Failed to parse metadata file: {}", path.display()))?;
        match serde_json::to_value(table)? {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("Metadata must be a table: {}", path.display()),
        }
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Metadata must be a JSON object: {}", path.display()))
    }
}

/// Print a run report
pub fn print_status(status: &RunStatus, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(status).context("Failed to serialize run status")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", format_status(status)),
    }
    Ok(())
}

/// Human-readable report: overall message, then every unit that did not succeed
pub fn format_status(status: &RunStatus) -> String {
    let mark = match status.status {
        OutcomeStatus::Success => "✓",
        OutcomeStatus::Warning => "!",
        OutcomeStatus::Failure => "✗",
    };
    let mut out = format!("{} {}\n", mark, status.message);

    for (index, record) in status.records.iter().enumerate() {
        if !record.is_success() {
            out.push_str(&format!(
                "  record {}: {} - {}\n",
                index + 1,
                record.status,
                record.message
            ));
        }
    }
    for extension in &status.extensions {
        if !extension.is_success() {
            out.push_str(&format!(
                "  plugin {}: {} - {}\n",
                extension.plugin_id, extension.status, extension.message
            ));
        }
    }
    if let Some(dir) = &status.temp_dir {
        out.push_str(&format!("  documents: {}\n", dir.display()));
    }
    out
}

#[derive(Debug, Serialize)]
struct PluginInfo {
    id: String,
    source: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    required: Vec<String>,
    optional: Vec<String>,
}

fn describe_plugins(manager: &OutputManager) -> Vec<PluginInfo> {
    manager
        .plugin_ids()
        .filter_map(|id| manager.entry(id).map(|entry| (id, entry)))
        .map(|(id, entry)| {
            let source = match &entry.origin {
                PluginOrigin::Builtin => "built-in".to_string(),
                PluginOrigin::Script(path) => path.display().to_string(),
            };
            let (valid, error, fields) = match &entry.slot {
                PluginSlot::Valid(plugin) => (true, None, plugin.required_fields()),
                PluginSlot::Invalid(reason) => (false, Some(reason.clone()), Default::default()),
            };
            let names = |level: FieldRequirement| -> Vec<String> {
                fields
                    .iter()
                    .filter(|(_, req)| **req == level)
                    .map(|(name, _)| name.clone())
                    .collect()
            };
            PluginInfo {
                id: id.to_string(),
                source,
                valid,
                error,
                required: names(FieldRequirement::Required),
                optional: names(FieldRequirement::Optional),
            }
        })
        .collect()
}

/// Print the plugin registry
pub fn print_plugins(manager: &OutputManager, format: OutputFormat) -> Result<()> {
    let plugins = describe_plugins(manager);
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&plugins).context("Failed to serialize plugins")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for plugin in &plugins {
                if plugin.valid {
                    println!("✓ {} ({})", plugin.id, plugin.source);
                    if !plugin.required.is_empty() {
                        println!("    required: {}", plugin.required.join(", "));
                    }
                    if !plugin.optional.is_empty() {
                        println!("    optional: {}", plugin.optional.join(", "));
                    }
                } else {
                    println!(
                        "✗ {} ({}): {}",
                        plugin.id,
                        plugin.source,
                        plugin.error.as_deref().unwrap_or("invalid")
                    );
                }
            }
        }
    }
    Ok(())
}
