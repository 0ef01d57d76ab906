//! Placeholder templates
//!
//! A template is Typst markup containing placeholders such as `{{name}}`.
//! The template is parsed once: every placeholder is located and classified
//! by the Typst syntax around it, so that a value placed inside a string
//! literal such as `#link("mailto:{{email}}")` is escaped as string content
//! while a value in running text is escaped as markup.

use std::collections::BTreeSet;
use std::ops::Range;

use certgen_model::RecordModel;
use regex::Regex;
use serde::{Deserialize, Serialize};
use typst_syntax::{LinkedNode, Side, SyntaxKind};

use crate::error::{PdfError, Result};

/// Placeholder delimiters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub start: String,
    pub end: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            start: "{{".to_string(),
            end: "}}".to_string(),
        }
    }
}

impl Delimiters {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Regex matching one placeholder; group 1 is the trimmed field name
    fn pattern(&self) -> Result<Regex> {
        if self.start.is_empty() || self.end.is_empty() {
            return Err(PdfError::Delimiters(
                "start and end delimiters must not be empty".to_string(),
            ));
        }
        let pattern = format!(
            r"{}\s*(.+?)\s*{}",
            regex::escape(&self.start),
            regex::escape(&self.end)
        );
        Regex::new(&pattern).map_err(|e| PdfError::Delimiters(e.to_string()))
    }
}

/// How templates are processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub delimiters: Delimiters,
    /// Reject models carrying keys the template never uses
    pub strict_extra: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            delimiters: Delimiters::default(),
            strict_extra: true,
        }
    }
}

/// Syntactic position of a placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotContext {
    /// Running text, headings, content blocks
    Markup,
    /// Inside a string literal
    Str,
    /// Inside raw text, where nothing is interpreted
    Raw,
}

impl SlotContext {
    fn locate(root: &LinkedNode<'_>, offset: usize) -> Self {
        let Some(leaf) = root.leaf_at(offset, Side::After) else {
            return SlotContext::Markup;
        };
        if leaf.kind() == SyntaxKind::Str {
            SlotContext::Str
        } else if leaf.parent().is_some_and(|p| p.kind() == SyntaxKind::Raw) {
            SlotContext::Raw
        } else {
            SlotContext::Markup
        }
    }

    /// Escape `value` so it reads literally in this position
    fn escape(self, value: &str) -> String {
        match self {
            SlotContext::Markup => escape_markup(value),
            SlotContext::Str => escape_string(value),
            SlotContext::Raw => value.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    range: Range<usize>,
    name: String,
    context: SlotContext,
}

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    slots: Vec<Slot>,
}

impl Template {
    pub fn parse(source: impl Into<String>, delimiters: &Delimiters) -> Result<Self> {
        let source = source.into();
        let pattern = delimiters.pattern()?;
        let root = typst_syntax::parse(&source);
        let root = LinkedNode::new(&root);

        let slots = pattern
            .captures_iter(&source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(Slot {
                    range: whole.range(),
                    name: caps[1].to_string(),
                    context: SlotContext::locate(&root, whole.start()),
                })
            })
            .collect();

        Ok(Self { source, slots })
    }

    /// The set of field names referenced by the template
    pub fn placeholders(&self) -> BTreeSet<String> {
        self.slots.iter().map(|slot| slot.name.clone()).collect()
    }

    /// Substitute every placeholder with its escaped model value.
    ///
    /// Placeholders without a value are left untouched.
    pub fn fill(&self, model: &RecordModel) -> String {
        let mut filled = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for slot in &self.slots {
            filled.push_str(&self.source[cursor..slot.range.start]);
            match model.get(&slot.name) {
                Some(value) => filled.push_str(&slot.context.escape(value)),
                None => filled.push_str(&self.source[slot.range.clone()]),
            }
            cursor = slot.range.end;
        }
        filled.push_str(&self.source[cursor..]);
        filled
    }
}

/// Escape a value for use inside a Typst string literal
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Escape characters with meaning in Typst markup
pub fn escape_markup(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '#' | '*' | '_' | '`' | '$' | '@' | '<' | '>' | '[' | ']' | '~' | '/' | '='
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
