//! Extension request and configuration contract types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied settings for one extension
pub type Settings = Map<String, Value>;

/// Requirement level of one extension setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRequirement {
    Required,
    Optional,
}

impl FieldRequirement {
    /// Parse the lowercase name a script plugin declares
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "required" => Some(FieldRequirement::Required),
            "optional" => Some(FieldRequirement::Optional),
            _ => None,
        }
    }
}

/// Declared settings contract: setting name → requirement level
pub type ConfigFields = BTreeMap<String, FieldRequirement>;

/// One requested delivery extension
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtensionConfig {
    pub id: String,
    #[serde(default)]
    pub settings: Settings,
}

impl ExtensionConfig {
    pub fn new(id: impl Into<String>, settings: Settings) -> Self {
        Self {
            id: id.into(),
            settings,
        }
    }

    /// Build requests from a JSON object of `id → settings`.
    ///
    /// Key order is kept, so it defines request order. Non-object values are
    /// treated as empty settings.
    pub fn from_json_map(map: Map<String, Value>) -> Vec<Self> {
        map.into_iter()
            .map(|(id, value)| {
                let settings = match value {
                    Value::Object(settings) => settings,
                    _ => Settings::new(),
                };
                Self { id, settings }
            })
            .collect()
    }

    /// First required setting that is absent or null
    pub fn first_missing_required<'a>(&self, fields: &'a ConfigFields) -> Option<&'a str> {
        fields
            .iter()
            .filter(|(_, req)| **req == FieldRequirement::Required)
            .map(|(name, _)| name.as_str())
            .find(|name| matches!(self.settings.get(*name), None | Some(Value::Null)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requirement_parse() {
        assert_eq!(FieldRequirement::parse("required"), Some(FieldRequirement::Required));
        assert_eq!(FieldRequirement::parse("optional"), Some(FieldRequirement::Optional));
        assert_eq!(FieldRequirement::parse("mandatory"), None);
    }

    #[test]
    fn test_from_json_map_keeps_order() {
        let value = json!({
            "zeta": {"a": 1},
            "alpha": {},
            "local": "ignored"
        });
        let Value::Object(map) = value else { unreachable!() };
        let requests = ExtensionConfig::from_json_map(map);
        let ids: Vec<_> = requests.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "local"]);
        assert!(requests[2].settings.is_empty());
    }

    #[test]
    fn test_first_missing_required() {
        let mut fields = ConfigFields::new();
        fields.insert("output_folder".into(), FieldRequirement::Required);
        fields.insert("output_filename_col".into(), FieldRequirement::Optional);

        let empty = ExtensionConfig::new("local", Settings::new());
        assert_eq!(empty.first_missing_required(&fields), Some("output_folder"));

        let Value::Object(null_settings) = json!({"output_folder": null}) else { unreachable!() };
        let nulled = ExtensionConfig::new("local", null_settings);
        assert_eq!(nulled.first_missing_required(&fields), Some("output_folder"));

        let Value::Object(ok) = json!({"output_folder": "out"}) else { unreachable!() };
        let filled = ExtensionConfig::new("local", ok);
        assert_eq!(filled.first_missing_required(&fields), None);
    }
}
