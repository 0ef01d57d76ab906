//! Field-completeness check
//!
//! Before anything is compiled, the model must cover the template's
//! placeholders exactly. Missing fields take precedence over extra ones.

use std::collections::BTreeSet;

use certgen_model::{RecordModel, RenderOutcome, RenderStatus};

/// Classification of a model against a placeholder set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    Complete,
    Missing(Vec<String>),
    Extra(Vec<String>),
}

impl FieldCheck {
    pub fn is_complete(&self) -> bool {
        matches!(self, FieldCheck::Complete)
    }

    /// Failure outcome naming the offending fields, `None` when complete
    pub fn into_outcome(self) -> Option<RenderOutcome> {
        match self {
            FieldCheck::Complete => None,
            FieldCheck::Missing(fields) => Some(RenderOutcome::with_message(
                RenderStatus::MissingFields,
                format!("Missing fields in data: {}.", fields.join(", ")),
            )),
            FieldCheck::Extra(fields) => Some(RenderOutcome::with_message(
                RenderStatus::ExtraFields,
                format!("Extra fields in data: {}.", fields.join(", ")),
            )),
        }
    }
}

/// Compare a model against the placeholders a template declares.
///
/// With `strict_extra` off, keys the template does not use are accepted.
pub fn check_fields(
    placeholders: &BTreeSet<String>,
    model: &RecordModel,
    strict_extra: bool,
) -> FieldCheck {
    let missing: Vec<String> = placeholders
        .iter()
        .filter(|name| !model.contains_key(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return FieldCheck::Missing(missing);
    }

    if strict_extra {
        let extra: Vec<String> = model
            .keys()
            .filter(|key| !placeholders.contains(*key))
            .map(str::to_string)
            .collect();
        if !extra.is_empty() {
            return FieldCheck::Extra(extra);
        }
    }

    FieldCheck::Complete
}
