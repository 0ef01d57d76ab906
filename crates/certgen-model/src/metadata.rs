//! Run-level metadata shared with every delivery extension

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied extra metadata, validated lazily by the extensions that read it
pub type Extras = Map<String, Value>;

/// Metadata describing one run
///
/// Built once when the orchestrator is created and never mutated; every render
/// and extension task sees the same instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// When the batch was issued; serialized as an ISO-8601 string
    #[serde(rename = "issue_timestamp", with = "timestamp")]
    pub issued_at: DateTime<Utc>,
    /// Unique identifier for the run
    pub run_id: String,
    /// Arbitrary caller data
    #[serde(default)]
    pub extras: Extras,
}

impl RunMetadata {
    pub fn new(issued_at: DateTime<Utc>, run_id: impl Into<String>) -> Self {
        Self {
            issued_at,
            run_id: run_id.into(),
            extras: Extras::new(),
        }
    }

    pub fn with_extras(mut self, extras: Extras) -> Self {
        self.extras = extras;
        self
    }

    /// ISO-8601 rendering of the issue time, millisecond precision
    pub fn issue_timestamp(&self) -> String {
        self.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Milliseconds since the Unix epoch
    pub fn issue_millis(&self) -> i64 {
        self.issued_at.timestamp_millis()
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
