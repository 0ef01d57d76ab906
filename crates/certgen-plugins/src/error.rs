//! Error types for plugin loading and execution

use std::path::PathBuf;

use thiserror::Error;

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;

/// Errors that can occur while loading or running plugins
#[derive(Debug, Error)]
pub enum PluginError {
    /// The configured plugins directory does not exist
    #[error("Plugins directory not found: {}", .0.display())]
    DirNotFound(PathBuf),

    /// Script compilation failed
    #[error("Script compilation error: {0}")]
    CompileError(String),

    /// The script does not satisfy the plugin contract
    #[error("Invalid plugin contract: {0}")]
    InvalidContract(String),

    /// Script execution failed
    #[error("Script execution error: {0}")]
    ExecutionError(String),

    /// Script `run` did not return a status map
    #[error("Plugin must return a map with a 'status' of success, warning or failure")]
    InvalidReturnType,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
