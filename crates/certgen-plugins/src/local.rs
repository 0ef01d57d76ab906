//! Built-in `local` plugin: copies rendered documents into a folder

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use certgen_model::{ConfigFields, FieldRequirement, Settings};
use tracing::debug;

use crate::plugin::{OutputPlugin, PluginContext, PluginReport};

pub const OUTPUT_FOLDER: &str = "output_folder";
pub const OUTPUT_FILENAME_COL: &str = "output_filename_col";

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPlugin;

impl LocalPlugin {
    pub fn new() -> Self {
        Self
    }

    /// Target file name for record `index`
    ///
    /// Uses the value of `column` when the dataset has it and the cell is
    /// not blank, otherwise the 1-based record number.
    fn file_name(ctx: &PluginContext, index: usize, column: Option<&str>) -> String {
        let named = column
            .and_then(|col| ctx.dataset.cell(index, col))
            .map(sanitize_filename::sanitize)
            .filter(|name| !name.trim().is_empty());

        match named {
            Some(name) if name.to_ascii_lowercase().ends_with(".pdf") => name,
            Some(name) => format!("{}.pdf", name),
            None => format!("{}.pdf", index + 1),
        }
    }

    /// Reserve `name` in `taken`, suffixing the record number on collision
    fn claim(taken: &mut HashSet<String>, name: String, index: usize) -> (String, bool) {
        if taken.insert(name.to_lowercase()) {
            return (name, false);
        }

        // file_name always ends in an ASCII ".pdf"
        let stem = &name[..name.len() - 4];
        let mut candidate = format!("{}-{}.pdf", stem, index + 1);
        let mut attempt = 2;
        while !taken.insert(candidate.to_lowercase()) {
            candidate = format!("{}-{}-{}.pdf", stem, index + 1, attempt);
            attempt += 1;
        }
        (candidate, true)
    }

    /// Copy every artifact, returning how many were renamed to stay unique
    fn copy_all(
        ctx: &PluginContext,
        folder: &Path,
        column: Option<&str>,
    ) -> std::io::Result<usize> {
        fs::create_dir_all(folder)?;
        let mut taken = HashSet::new();
        let mut renamed = 0;
        for artifact in &ctx.artifacts {
            let name = Self::file_name(ctx, artifact.record, column);
            let (name, suffixed) = Self::claim(&mut taken, name, artifact.record);
            if suffixed {
                renamed += 1;
            }
            let target = folder.join(name);
            debug!(from = %artifact.path.display(), to = %target.display(), "copying document");
            fs::copy(&artifact.path, target)?;
        }
        Ok(renamed)
    }
}

impl OutputPlugin for LocalPlugin {
    fn required_fields(&self) -> ConfigFields {
        ConfigFields::from([
            (OUTPUT_FOLDER.to_string(), FieldRequirement::Required),
            (OUTPUT_FILENAME_COL.to_string(), FieldRequirement::Optional),
        ])
    }

    fn run(&self, settings: &Settings, ctx: &PluginContext) -> PluginReport {
        let Some(folder) = settings.get(OUTPUT_FOLDER).and_then(|v| v.as_str()) else {
            return PluginReport::failure(format!("Setting '{}' must be a string.", OUTPUT_FOLDER));
        };
        let folder = PathBuf::from(folder);

        let column = settings.get(OUTPUT_FILENAME_COL).and_then(|v| v.as_str());
        let unknown_column = column.filter(|col| ctx.dataset.column_index(col).is_none());

        let renamed = match Self::copy_all(ctx, &folder, column) {
            Ok(renamed) => renamed,
            Err(e) => {
                return PluginReport::failure(format!(
                    "Error copying PDFs to output folder. Error: {}",
                    e
                ))
            }
        };

        let mut message = format!("Copied {} PDF(s) to {}", ctx.artifacts.len(), folder.display());
        if renamed > 0 {
            message.push_str(&format!(
                "; {} renamed with the record number to avoid duplicate names",
                renamed
            ));
        }

        match unknown_column {
            Some(col) => PluginReport::warning(format!(
                "{}, but column '{}' was not found; files are numbered.",
                message, col
            )),
            None => PluginReport::success(format!("{}.", message)),
        }
    }
}
