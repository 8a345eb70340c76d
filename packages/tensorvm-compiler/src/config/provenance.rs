//! Configuration provenance tracking
//!
//! Track where each option value came from (defaults, builder, env, YAML)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static DEFAULT_SOURCE: ConfigSource = ConfigSource::Default;

/// Option provenance tracking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigProvenance {
    /// Field-level tracking: field path → source
    /// Example: "scheduling.execution_model" → ConfigSource::Env("TENSORVM__SCHEDULING__EXECUTION_MODEL")
    /// Group-wide overrides use a `group.*` path.
    field_sources: HashMap<String, ConfigSource>,
}

/// Configuration source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Built-in default
    Default,

    /// From YAML (file path, or `<inline>` for strings)
    Yaml { path: String },

    /// From environment variable
    Env(String),

    /// From builder API
    Builder,
}

impl ConfigProvenance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record field-level override
    pub fn track_field(&mut self, field_path: &str, source: ConfigSource) {
        self.field_sources.insert(field_path.to_string(), source);
    }

    /// Get source for a specific field
    ///
    /// Falls back to the group-wide `group.*` entry, then to `Default`.
    pub fn get_source(&self, field_path: &str) -> &ConfigSource {
        if let Some(source) = self.field_sources.get(field_path) {
            return source;
        }
        let group_wildcard = field_path
            .split_once('.')
            .map(|(group, _)| format!("{}.*", group));
        group_wildcard
            .and_then(|key| self.field_sources.get(&key))
            .unwrap_or(&DEFAULT_SOURCE)
    }

    /// Get all field sources
    pub fn field_sources(&self) -> &HashMap<String, ConfigSource> {
        &self.field_sources
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        if self.field_sources.is_empty() {
            return "All options at defaults".to_string();
        }

        let mut lines = vec!["Overridden fields:".to_string()];
        let mut sorted_fields: Vec<_> = self.field_sources.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (field, source) in sorted_fields {
            let source_str = match source {
                ConfigSource::Default => "default".to_string(),
                ConfigSource::Yaml { path } => path.clone(),
                ConfigSource::Env(var) => format!("env ${}", var),
                ConfigSource::Builder => "builder API".to_string(),
            };
            lines.push(format!("  {} ← {}", field, source_str));
        }

        lines.join("\n")
    }
}

impl ConfigSource {
    /// Get a short description
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Default => "default".to_string(),
            ConfigSource::Yaml { path } => format!("yaml:{}", path),
            ConfigSource::Env(var) => format!("env:{}", var),
            ConfigSource::Builder => "builder".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_tracking() {
        let mut prov = ConfigProvenance::new();
        assert!(prov.field_sources().is_empty());

        prov.track_field("scheduling.*", ConfigSource::Builder);
        assert_eq!(prov.field_sources().len(), 1);
        assert_eq!(
            prov.get_source("scheduling.execution_model"),
            &ConfigSource::Builder
        );
    }

    #[test]
    fn test_field_beats_group_wildcard() {
        let mut prov = ConfigProvenance::new();
        prov.track_field("scheduling.*", ConfigSource::Builder);
        prov.track_field(
            "scheduling.execution_model",
            ConfigSource::Env("TENSORVM__SCHEDULING__EXECUTION_MODEL".to_string()),
        );

        assert!(matches!(
            prov.get_source("scheduling.execution_model"),
            ConfigSource::Env(_)
        ));
        assert_eq!(
            prov.get_source("scheduling.dump_statistics_format"),
            &ConfigSource::Builder
        );
    }

    #[test]
    fn test_untracked_field_is_default() {
        let prov = ConfigProvenance::new();
        assert_eq!(prov.get_source("binding.native"), &ConfigSource::Default);
        assert_eq!(prov.get_source("strict_mode"), &ConfigSource::Default);
    }

    #[test]
    fn test_provenance_summary() {
        let mut prov = ConfigProvenance::new();
        assert!(prov.summary().contains("defaults"));

        prov.track_field("binding.*", ConfigSource::Builder);
        prov.track_field(
            "target_backend.*",
            ConfigSource::Yaml {
                path: "team.yaml".to_string(),
            },
        );

        let summary = prov.summary();
        assert!(summary.contains("binding.*"));
        assert!(summary.contains("builder API"));
        assert!(summary.contains("target_backend.*"));
        assert!(summary.contains("team.yaml"));
        // sorted by field path
        assert!(summary.find("binding").unwrap() < summary.find("target_backend").unwrap());
    }

    #[test]
    fn test_source_describe() {
        assert_eq!(ConfigSource::Default.describe(), "default");
        assert_eq!(ConfigSource::Builder.describe(), "builder");
        assert_eq!(
            ConfigSource::Env("TENSORVM__STRICT_MODE".to_string()).describe(),
            "env:TENSORVM__STRICT_MODE"
        );
        assert_eq!(
            ConfigSource::Yaml {
                path: "a.yaml".to_string()
            }
            .describe(),
            "yaml:a.yaml"
        );
    }
}
