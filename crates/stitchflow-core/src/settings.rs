//! Process-step settings carried by groups, label edges and locked parts.
//!
//! [`Settings`] is the payload edited in the settings form. When a group is
//! confirmed the payload is frozen into a [`SavedSettings`] snapshot together
//! with the ids of the parts that were members at that moment.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// Settings payload for one routing step.
///
/// # Examples
///
/// ```
/// # use stitchflow_core::{identifier::Id, settings::Settings};
/// let settings = Settings::new("STEP 01", "stitching")
///     .with_detail("machine", "overlock")
///     .with_part_text(Id::new("label-1"), "wash at 30");
///
/// assert_eq!(settings.step(), "STEP 01");
/// assert_eq!(settings.detail("machine"), Some("overlock"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    step: String,
    #[serde(default)]
    process: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    step_value: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    details: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    part_texts: IndexMap<Id, String>,
}

impl Settings {
    /// Creates a payload with the two mandatory fields.
    pub fn new(step: impl Into<String>, process: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            process: process.into(),
            ..Self::default()
        }
    }

    pub fn with_step_value(mut self, value: impl Into<String>) -> Self {
        self.step_value = Some(value.into());
        self
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Sets the free text for a text-only part that belongs to the group.
    pub fn with_part_text(mut self, part_id: Id, text: impl Into<String>) -> Self {
        self.part_texts.insert(part_id, text.into());
        self
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    pub fn step_value(&self) -> Option<&str> {
        self.step_value.as_deref()
    }

    pub fn details(&self) -> &IndexMap<String, String> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    pub fn part_texts(&self) -> &IndexMap<Id, String> {
        &self.part_texts
    }

    pub fn part_text(&self, part_id: Id) -> Option<&str> {
        self.part_texts.get(&part_id).map(String::as_str)
    }

    /// Returns a copy whose step value is `fallback` when none was entered.
    pub fn or_step_value(mut self, fallback: Option<&str>) -> Self {
        if self.step_value.is_none() {
            self.step_value = fallback.map(str::to_owned);
        }
        self
    }
}

/// Settings frozen at confirmation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSettings {
    settings: Settings,
    added_parts_ids: Vec<Id>,
}

impl SavedSettings {
    pub fn new(settings: Settings, added_parts_ids: Vec<Id>) -> Self {
        Self {
            settings,
            added_parts_ids,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Members of the group when it was confirmed.
    pub fn added_parts_ids(&self) -> &[Id] {
        &self.added_parts_ids
    }
}

/// Settings form fields that can block a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingsField {
    Step,
    Process,
    StepValue,
    Text,
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Step => "step",
            Self::Process => "process",
            Self::StepValue => "stepValue",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_step_value_keeps_explicit_value() {
        let settings = Settings::new("STEP 02", "pressing").with_step_value("3");
        let merged = settings.or_step_value(Some("9"));

        assert_eq!(merged.step_value(), Some("3"));
    }

    #[test]
    fn test_or_step_value_uses_fallback() {
        let merged = Settings::new("STEP 02", "pressing").or_step_value(Some("9"));
        assert_eq!(merged.step_value(), Some("9"));

        let none = Settings::new("STEP 02", "pressing").or_step_value(None);
        assert_eq!(none.step_value(), None);
    }

    #[test]
    fn test_details_keep_insertion_order() {
        let settings = Settings::new("STEP 01", "cutting")
            .with_detail("z-last", "1")
            .with_detail("a-first", "2");

        let keys: Vec<&str> = settings.details().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z-last", "a-first"]);
    }

    #[test]
    fn test_saved_settings_serde_shape() {
        let saved = SavedSettings::new(
            Settings::new("STEP 01", "stitching"),
            vec![Id::new("A"), Id::new("B")],
        );
        let json = serde_json::to_value(&saved).unwrap();

        assert_eq!(json["addedPartsIds"], serde_json::json!(["A", "B"]));
        assert_eq!(json["settings"]["step"], "STEP 01");
        assert!(json["settings"].get("stepValue").is_none());
    }

    #[test]
    fn test_settings_field_display() {
        assert_eq!(SettingsField::StepValue.to_string(), "stepValue");
        assert_eq!(SettingsField::Text.to_string(), "text");
    }
}
