//! Configuration applied when a new app is created.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::model::Language;

/// A pattern every new app starts with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialPattern {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Options for new apps.
///
/// The order of `initial_patterns` is the order of the `AppPatternAdded` events in
/// the creation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    pub default_language: Language,
    pub initial_patterns: Vec<InitialPattern>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            default_language: Language::english(),
            initial_patterns: Vec::new(),
        }
    }
}

impl AppOptions {
    /// Load options from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read app options from {}", path.display()))?;
        let options = serde_json::from_str(&raw)
            .with_context(|| format!("invalid app options in {}", path.display()))?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_english_without_patterns() {
        let options = AppOptions::default();
        assert_eq!(options.default_language.as_str(), "en");
        assert!(options.initial_patterns.is_empty());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let options: AppOptions = serde_json::from_str(
            r#"{ "initial_patterns": [ { "name": "Email", "pattern": "^.+@.+$" } ] }"#,
        )
        .unwrap();

        assert_eq!(options.default_language.as_str(), "en");
        assert_eq!(options.initial_patterns.len(), 1);
        assert_eq!(options.initial_patterns[0].message, None);
    }

    #[test]
    fn invalid_language_is_rejected() {
        let result = serde_json::from_str::<AppOptions>(r#"{ "default_language": "English" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AppOptions::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
