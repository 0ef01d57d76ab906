//! Typst to PDF compiler
//!
//! Compiles filled-in Typst markup to PDF bytes using typst-as-lib.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{PdfError, Result};
use typst_as_lib::TypstEngine;

/// Compiler for converting Typst markup to PDF
///
/// Font files are read once, when the compiler is built, and shared by
/// every clone.
#[derive(Clone, Default)]
pub struct Compiler {
    fonts: Arc<[Vec<u8>]>,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("fonts", &self.fonts.len())
            .finish()
    }
}

impl Compiler {
    /// Compiler that only uses fonts bundled with Typst
    pub fn new() -> Self {
        Self::default()
    }

    /// Include extra font files in every compilation
    pub fn with_fonts(font_paths: &[PathBuf]) -> Result<Self> {
        let fonts = font_paths
            .iter()
            .map(|path| Self::read_font(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            fonts: fonts.into(),
        })
    }

    /// Compile Typst markup to PDF bytes
    pub fn compile(&self, markup: &str) -> Result<Vec<u8>> {
        let engine = TypstEngine::builder()
            .main_file(markup.to_string())
            .fonts(self.fonts.iter().map(Vec::as_slice))
            .build();

        // compiled is Warned<Result<Document, Error>>
        // - compiled.output is the Result
        // - compiled.warnings contains any warnings
        let compiled = engine.compile();
        let document = compiled
            .output
            .map_err(|e| PdfError::Compilation(format!("{:?}", e)))?;

        let options = typst_pdf::PdfOptions::default();
        let pdf_bytes = typst_pdf::pdf(&document, &options)
            .map_err(|e| PdfError::Compilation(format!("PDF generation failed: {:?}", e)))?;

        Ok(pdf_bytes.into())
    }

    fn read_font(path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path)
            .map_err(|e| PdfError::Font(format!("Failed to read font {}: {}", path.display(), e)))
    }
}
