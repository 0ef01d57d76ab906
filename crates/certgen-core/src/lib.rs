//! certgen-core - Batch certificate generation
//!
//! The [`Orchestrator`] renders one document per recipient record through a
//! [`certgen_pdf::DocumentRenderer`], then passes the rendered documents to
//! the output plugins of a [`certgen_plugins::OutputManager`].
//!
//! # Example
//!
//! ```ignore
//! use certgen_core::{Orchestrator, OrchestratorConfig};
//! use certgen_pdf::TypstRenderer;
//! use certgen_plugins::OutputManager;
//!
//! let orchestrator = Orchestrator::new(
//!     TypstRenderer::new(),
//!     OutputManager::new(),
//!     OrchestratorConfig::default(),
//! );
//! let status = orchestrator
//!     .generate(Path::new("certificate.typ"), dataset, &requests, extras)
//!     .await;
//! println!("{}: {}", status.status, status.message);
//! ```

mod config;
mod error;
mod orchestrator;

pub use config::{OrchestratorConfig, DEFAULT_RENDER_TIMEOUT};
pub use error::OrchestratorError;
pub use orchestrator::Orchestrator;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
