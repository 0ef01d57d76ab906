//! Document renderer
//!
//! [`DocumentRenderer`] is the seam the orchestrator renders through.
//! [`TypstRenderer`] is the shipped implementation: it fills a placeholder
//! template with one record and compiles the result to a PDF file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use certgen_model::{RecordModel, RenderOutcome, RenderStatus};
use tracing::{debug, warn};

use crate::compiler::Compiler;
use crate::fields::check_fields;
use crate::template::{Template, TemplateConfig};

/// Result of a batch render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The template itself is unusable; no record was attempted
    Rejected(RenderOutcome),
    /// One outcome per record, in input order
    Rendered(Vec<RenderOutcome>),
}

/// Behavioral contract of a document renderer.
///
/// Setters configure a renderer before a run; rendering takes `&self` so one
/// configured renderer can serve many records concurrently.
pub trait DocumentRenderer: Clone + Send + Sync + 'static {
    /// Template file used by subsequent renders
    fn set_template(&mut self, path: &Path);

    /// Run-wide default values, overridden by record values of the same name
    fn set_constants(&mut self, constants: RecordModel);

    /// Whole-batch problem with the configured template, if any
    fn template_error(&self) -> Option<RenderOutcome>;

    /// Render one record to `output`, overwriting any existing file
    fn render(&self, model: &RecordModel, output: &Path) -> RenderOutcome;

    /// Render records in order.
    ///
    /// A template problem yields a single [`BatchOutcome::Rejected`] instead
    /// of one failure per record.
    fn render_many(&self, models: &[RecordModel], outputs: &[PathBuf]) -> BatchOutcome {
        if let Some(outcome) = self.template_error() {
            return BatchOutcome::Rejected(outcome);
        }

        BatchOutcome::Rendered(
            models
                .iter()
                .zip(outputs)
                .map(|(model, output)| self.render(model, output))
                .collect(),
        )
    }
}

/// Template state of a renderer
#[derive(Debug, Clone, Default)]
enum LoadedTemplate {
    #[default]
    Unset,
    Ready(Arc<Template>),
    Broken(RenderOutcome),
}

/// Renderer backed by placeholder substitution and Typst
///
/// The template is read and parsed by `set_template`; renders share the
/// parsed result.
#[derive(Debug, Clone, Default)]
pub struct TypstRenderer {
    template: LoadedTemplate,
    constants: RecordModel,
    config: TemplateConfig,
    compiler: Compiler,
}

impl TypstRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TemplateConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    fn load_template(&self, path: &Path) -> LoadedTemplate {
        if !path.is_file() {
            return LoadedTemplate::Broken(RenderOutcome::from_status(
                RenderStatus::TemplateNotFound,
            ));
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| format!("Error reading template {}: {}", path.display(), e))
            .and_then(|source| {
                Template::parse(source, &self.config.delimiters).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(template) => LoadedTemplate::Ready(Arc::new(template)),
            Err(message) => LoadedTemplate::Broken(RenderOutcome::with_message(
                RenderStatus::UnknownError,
                message,
            )),
        }
    }

    fn try_render(&self, model: &RecordModel, output: &Path) -> Result<(), RenderOutcome> {
        let template = match &self.template {
            LoadedTemplate::Ready(template) => template,
            LoadedTemplate::Unset => {
                return Err(RenderOutcome::from_status(RenderStatus::MissingTemplatePath))
            }
            LoadedTemplate::Broken(outcome) => return Err(outcome.clone()),
        };

        let model = model.merged_over(&self.constants);
        if let Some(outcome) =
            check_fields(&template.placeholders(), &model, self.config.strict_extra).into_outcome()
        {
            return Err(outcome);
        }

        let markup = template.fill(&model);
        let pdf = self.compiler.compile(&markup).map_err(|e| {
            RenderOutcome::with_message(
                RenderStatus::UnknownError,
                format!("Error generating PDF: {}", e),
            )
        })?;

        fs::write(output, pdf).map_err(|e| {
            RenderOutcome::with_message(
                RenderStatus::UnknownError,
                format!("Error writing {}: {}", output.display(), e),
            )
        })
    }
}

impl DocumentRenderer for TypstRenderer {
    fn set_template(&mut self, path: &Path) {
        self.template = if path.as_os_str().is_empty() {
            LoadedTemplate::Unset
        } else {
            self.load_template(path)
        };
    }

    fn set_constants(&mut self, constants: RecordModel) {
        self.constants = constants;
    }

    fn template_error(&self) -> Option<RenderOutcome> {
        match &self.template {
            LoadedTemplate::Unset => Some(RenderOutcome::from_status(
                RenderStatus::MissingTemplatePath,
            )),
            LoadedTemplate::Broken(outcome) => Some(outcome.clone()),
            LoadedTemplate::Ready(_) => None,
        }
    }

    fn render(&self, model: &RecordModel, output: &Path) -> RenderOutcome {
        match self.try_render(model, output) {
            Ok(()) => {
                debug!(output = %output.display(), "rendered document");
                RenderOutcome::success()
            }
            Err(outcome) => {
                warn!(output = %output.display(), status = %outcome.status, "{}", outcome.message);
                outcome
            }
        }
    }
}
