//! Configuration error types
//!
//! Every variant here is a ConfigurationError in the pipeline taxonomy: it is
//! raised while resolving options, before any stage runs.

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Value not accepted for a field (unknown enum spelling, bad number, ...)
    #[error("Invalid value '{value}' for field '{field}'. {suggestion}")]
    InvalidValue {
        field: String,
        value: String,
        suggestion: String,
    },

    /// Unknown field in an environment override
    #[error("Unknown field '{field}' in option group '{group}'. {suggestion}")]
    UnknownField {
        field: String,
        group: String,
        suggestion: String,
        valid_fields: Vec<String>,
    },

    /// A feature was requested without the thing it depends on (strict mode)
    #[error("'{feature}' requires {prerequisite}. {hint}")]
    MissingPrerequisite {
        feature: String,
        prerequisite: String,
        hint: String,
    },

    /// Input dialect requested but no converter was registered for it
    #[error("Input dialect '{dialect}' has no registered converter. Available: [{}]", available.join(", "))]
    UnavailableInputDialect {
        dialect: String,
        available: Vec<String>,
    },

    /// Option groups contradict each other
    #[error("Cross-group configuration conflict: {issue}. Fix: {fix}")]
    CrossGroupConflict { issue: String, fix: String },

    /// Pipeline name not present in the registry
    #[error("Unknown pipeline '{name}'. {suggestion}")]
    UnknownPipeline { name: String, suggestion: String },

    /// Unsupported version
    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a range error with a hint
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Create an invalid value error, suggesting the closest accepted spelling
    pub fn invalid_value_with_suggestion(
        field: impl Into<String>,
        value: impl Into<String>,
        accepted: &[&str],
    ) -> Self {
        let value = value.into();
        let candidates: Vec<String> = accepted.iter().map(|s| s.to_string()).collect();
        Self::InvalidValue {
            field: field.into(),
            suggestion: find_closest_match(&value, &candidates),
            value,
        }
    }

    /// Create an unknown field error with suggestion
    pub fn unknown_field_with_suggestion(
        field: impl Into<String>,
        group: impl Into<String>,
        valid_fields: Vec<String>,
    ) -> Self {
        let field = field.into();
        let suggestion = find_closest_match(&field, &valid_fields);

        Self::UnknownField {
            field,
            group: group.into(),
            suggestion,
            valid_fields,
        }
    }

    /// Create an unknown pipeline error with suggestion
    pub fn unknown_pipeline(name: impl Into<String>, registered: Vec<String>) -> Self {
        let name = name.into();
        let suggestion = find_closest_match(&name, &registered);
        Self::UnknownPipeline { name, suggestion }
    }
}

/// Find closest match using simple edit distance
pub(crate) fn find_closest_match(target: &str, candidates: &[String]) -> String {
    match candidates
        .iter()
        .min_by_key(|candidate| levenshtein_distance(target, candidate))
    {
        Some(closest) => format!("Did you mean '{}'?", closest),
        None => "No valid values available".to_string(),
    }
}

/// Simple Levenshtein distance implementation
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let mut matrix = vec![vec![0; b.len() + 1]; a.len() + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        matrix[0][j] = j;
    }

    for (i, c1) in a.iter().enumerate() {
        for (j, c2) in b.iter().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };
            matrix[i + 1][j + 1] = (matrix[i][j + 1] + 1)
                .min(matrix[i + 1][j] + 1)
                .min(matrix[i][j] + cost);
        }
    }

    matrix[a.len()][b.len()]
}
