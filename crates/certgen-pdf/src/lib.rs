//! certgen-pdf - Document rendering via Typst
//!
//! This crate renders one PDF per recipient record from a placeholder
//! template.
//!
//! # Architecture
//!
//! Rendering one record goes through three stages:
//!
//! 1. **Template** - Locates `{{field}}` placeholders in Typst markup, once per run
//! 2. **Field check** - Confirms the record covers the placeholders exactly
//! 3. **Compiler** - Compiles the filled-in markup to PDF bytes
//!
//! # Example
//!
//! ```ignore
//! use certgen_pdf::{DocumentRenderer, TypstRenderer};
//!
//! let mut renderer = TypstRenderer::new();
//! renderer.set_template(Path::new("certificate.typ"));
//! let outcome = renderer.render(&model, Path::new("out/0.pdf"));
//! ```

mod compiler;
mod error;
pub mod fields;
mod renderer;
mod template;

pub use compiler::Compiler;
pub use error::{PdfError, Result};
pub use fields::{check_fields, FieldCheck};
pub use renderer::{BatchOutcome, DocumentRenderer, TypstRenderer};
pub use template::{escape_markup, escape_string, Delimiters, Template, TemplateConfig};
