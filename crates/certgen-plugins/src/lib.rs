//! Output plugins for certgen
//!
//! Rendered certificates are handed to delivery plugins through an
//! [`OutputManager`]. Plugins are either native Rust types implementing
//! [`OutputPlugin`] (the built-in `local` plugin) or Rhai scripts discovered
//! in a plugins directory.
//!
//! # Example
//!
//! ```ignore
//! use certgen_plugins::OutputManager;
//!
//! let mut manager = OutputManager::new();
//! manager.set_plugins_dir(Path::new("plugins"))?;
//!
//! let outcomes = manager
//!     .generate_output(&requests, artifacts, dataset, metadata)
//!     .await;
//! ```

mod error;
pub mod local;
mod manager;
mod plugin;
mod script;

pub use error::{PluginError, Result};
pub use local::LocalPlugin;
pub use manager::{
    OutputManager, PluginEntry, PluginOrigin, PluginSlot, DEFAULT_TIMEOUT, NOT_FOUND_MESSAGE,
};
pub use plugin::{OutputPlugin, PluginContext, PluginReport};
pub use script::{ScriptEngine, ScriptPlugin};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
