//! certgen CLI - Command-line interface library
//!
//! This library provides the CLI functionality for certgen:
//! - Generate: Render one certificate per recipient and deliver them
//! - Plugins: List the output plugins that a run could use
//!
//! # Library Usage
//!
//! ```ignore
//! use certgen_cli::{generate_command, print_status, GenerateArgs, OutputFormat};
//!
//! let status = generate_command(&args).await?;
//! print_status(&status, OutputFormat::Json)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Render certificates and copy them to ./out
//! certgen generate --recipients people.csv --template cert.typ \
//!     --plugins-config plugins.json
//!
//! # Show available plugins, including scripts in ./plugins
//! certgen plugins --plugins-dir plugins
//! ```

pub mod app;
pub mod config;

// Re-export main entry point and types
pub use app::{
    block_on_detached, build_manager, format_status, generate_command, load_metadata,
    load_requests, print_plugins, print_status,
};
pub use app::{run_cli, GenerateArgs, OutputFormat, PluginsArgs};
pub use config::Settings;
