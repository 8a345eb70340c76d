//! Configuration I/O schema (YAML)
//!
//! Defines YAML schema types. Loading and export live on `PipelineOptions`
//! to keep its fields crate-private.

use super::option_groups::*;
use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Resolution mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_mode: Option<bool>,

    /// Option group overrides; omitted groups keep their defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionGroupsV1>,
}

/// Option group overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionGroupsV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<BindingOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_dialect: Option<InputDialectOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_level_optimization: Option<HighLevelOptimizationOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<SchedulingOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_backend: Option<TargetBackendOptions>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode_target: Option<BytecodeTargetOptions>,
}
