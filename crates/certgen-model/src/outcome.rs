//! Outcome types for rendering, delivery and the run as a whole

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result classification for one rendered record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Success,
    MissingTemplatePath,
    TemplateNotFound,
    MissingFields,
    ExtraFields,
    UnknownError,
    TimedOut,
}

impl RenderStatus {
    /// Canonical message for this status
    pub fn default_message(self) -> &'static str {
        match self {
            RenderStatus::Success => "PDF generated successfully.",
            RenderStatus::MissingTemplatePath => "Template path not set.",
            RenderStatus::TemplateNotFound => "Template file does not exist.",
            RenderStatus::MissingFields => "Missing fields in data.",
            RenderStatus::ExtraFields => "Extra fields in data.",
            RenderStatus::UnknownError => "Unknown error occurred.",
            RenderStatus::TimedOut => "Rendering timed out.",
        }
    }

    pub fn is_success(self) -> bool {
        self == RenderStatus::Success
    }
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderStatus::Success => "success",
            RenderStatus::MissingTemplatePath => "missing template path",
            RenderStatus::TemplateNotFound => "template not found",
            RenderStatus::MissingFields => "missing fields",
            RenderStatus::ExtraFields => "extra fields",
            RenderStatus::UnknownError => "unknown error",
            RenderStatus::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// Outcome of rendering one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub status: RenderStatus,
    pub message: String,
}

impl RenderOutcome {
    /// Outcome carrying the canonical message for `status`
    pub fn from_status(status: RenderStatus) -> Self {
        Self {
            status,
            message: status.default_message().to_string(),
        }
    }

    pub fn with_message(status: RenderStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::from_status(RenderStatus::Success)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Three-level status shared by extensions and the overall run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Warning,
    Failure,
}

impl OutcomeStatus {
    /// Parse the lowercase name used by script plugins
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "success" => Some(OutcomeStatus::Success),
            "warning" => Some(OutcomeStatus::Warning),
            "failure" => Some(OutcomeStatus::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Success => f.write_str("success"),
            OutcomeStatus::Warning => f.write_str("warning"),
            OutcomeStatus::Failure => f.write_str("failure"),
        }
    }
}

/// Outcome of one requested delivery extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOutcome {
    pub plugin_id: String,
    pub status: OutcomeStatus,
    pub message: String,
}

impl ExtensionOutcome {
    pub fn new(plugin_id: impl Into<String>, status: OutcomeStatus, message: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            status,
            message: message.into(),
        }
    }

    pub fn failure(plugin_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(plugin_id, OutcomeStatus::Failure, message)
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// A rendered document on disk
///
/// `record` is the zero-based position of the source record (header
/// excluded), so extensions can find its dataset row even when other
/// records failed to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub record: usize,
    pub path: PathBuf,
}

/// Terminal value of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub status: OutcomeStatus,
    pub message: String,
    /// One outcome per record, in input order
    pub records: Vec<RenderOutcome>,
    /// One outcome per extension request, in request order
    pub extensions: Vec<ExtensionOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

impl RunStatus {
    /// A whole-batch failure: nothing rendered, nothing delivered
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            message: message.into(),
            records: Vec::new(),
            extensions: Vec::new(),
            run_id: None,
            temp_dir: None,
        }
    }

    /// Fold record and extension outcomes into an overall status.
    ///
    /// `Warning` as soon as one unit did not succeed, `Success` otherwise.
    pub fn completed(records: Vec<RenderOutcome>, extensions: Vec<ExtensionOutcome>) -> Self {
        let failed_records = records.iter().filter(|r| !r.is_success()).count();
        let failed_extensions = extensions.iter().filter(|e| !e.is_success()).count();

        let (status, message) = if failed_records == 0 && failed_extensions == 0 {
            (
                OutcomeStatus::Success,
                format!(
                    "Generated {} document(s) and ran {} output plugin(s).",
                    records.len(),
                    extensions.len()
                ),
            )
        } else {
            (
                OutcomeStatus::Warning,
                format!(
                    "{} of {} document(s) and {} of {} output plugin(s) did not succeed.",
                    failed_records,
                    records.len(),
                    failed_extensions,
                    extensions.len()
                ),
            )
        };

        Self {
            status,
            message,
            records,
            extensions,
            run_id: None,
            temp_dir: None,
        }
    }

    pub fn with_run(mut self, run_id: impl Into<String>, temp_dir: impl Into<PathBuf>) -> Self {
        self.run_id = Some(run_id.into());
        self.temp_dir = Some(temp_dir.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages() {
        assert_eq!(
            RenderOutcome::from_status(RenderStatus::TemplateNotFound).message,
            "Template file does not exist."
        );
        assert_eq!(RenderOutcome::success().message, "PDF generated successfully.");
    }

    #[test]
    fn test_outcome_status_parse() {
        assert_eq!(OutcomeStatus::parse("Success"), Some(OutcomeStatus::Success));
        assert_eq!(OutcomeStatus::parse(" warning "), Some(OutcomeStatus::Warning));
        assert_eq!(OutcomeStatus::parse("failure"), Some(OutcomeStatus::Failure));
        assert_eq!(OutcomeStatus::parse("ok"), None);
    }

    #[test]
    fn test_completed_all_success() {
        let run = RunStatus::completed(
            vec![RenderOutcome::success(), RenderOutcome::success()],
            vec![],
        );
        assert_eq!(run.status, OutcomeStatus::Success);
        assert_eq!(run.records.len(), 2);
    }

    #[test]
    fn test_completed_record_failure_is_warning() {
        let run = RunStatus::completed(
            vec![
                RenderOutcome::success(),
                RenderOutcome::from_status(RenderStatus::MissingFields),
            ],
            vec![],
        );
        assert_eq!(run.status, OutcomeStatus::Warning);
    }

    #[test]
    fn test_completed_extension_failure_is_warning() {
        let run = RunStatus::completed(
            vec![RenderOutcome::success()],
            vec![ExtensionOutcome::failure("local", "boom")],
        );
        assert_eq!(run.status, OutcomeStatus::Warning);
        assert!(run.message.contains("1 of 1 output plugin"));
    }

    #[test]
    fn test_extension_warning_demotes_run() {
        let run = RunStatus::completed(
            vec![RenderOutcome::success()],
            vec![ExtensionOutcome::new("mail", OutcomeStatus::Warning, "partial")],
        );
        assert_eq!(run.status, OutcomeStatus::Warning);
    }

    #[test]
    fn test_failure_has_no_outcomes() {
        let run = RunStatus::failure("Template file does not exist.");
        assert!(run.is_failure());
        assert!(run.records.is_empty());
        assert!(run.extensions.is_empty());
    }

    #[test]
    fn test_render_status_serde_names() {
        let json = serde_json::to_string(&RenderStatus::MissingFields).unwrap();
        assert_eq!(json, "\"missing_fields\"");
    }
}
