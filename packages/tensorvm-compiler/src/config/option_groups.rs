//! Option group types
//!
//! Each group is an independent, self-validating configuration struct. The
//! orchestrator reads them only after `PipelineOptions::resolve` has checked
//! them individually and against each other.

use super::error::{ConfigError, ConfigResult};
use super::validation::Validatable;
use crate::shared::constants::{DEFAULT_LEGALITY_MARKER, DEFAULT_LEGALITY_OP_KIND};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Implements `as_str`, `ALL`, `Display` and `FromStr` for a kebab-case enum
macro_rules! option_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> ConfigResult<Self> {
                let lowered = s.trim().to_lowercase().replace('_', "-");
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == lowered)
                    .ok_or_else(|| {
                        let accepted: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        ConfigError::invalid_value_with_suggestion($field, s, &accepted)
                    })
            }
        }
    };
}

// ============================================================================
// Binding Options
// ============================================================================

/// Which entry-point binding wrappers to generate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingOptions {
    /// Native ABI bindings
    pub native: bool,

    /// TFLite-compatible bindings
    pub tflite: bool,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            native: true,
            tflite: false,
        }
    }
}

impl BindingOptions {
    /// Builder: Set native
    pub fn native(mut self, v: bool) -> Self {
        self.native = v;
        self
    }

    /// Builder: Set tflite
    pub fn tflite(mut self, v: bool) -> Self {
        self.tflite = v;
        self
    }
}

// ============================================================================
// Input Dialect Options
// ============================================================================

/// Source dialect the program arrives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputDialect {
    /// Already in the compiler's own input form
    None,
    Mhlo,
    /// XLA-flavoured MHLO (needs a cleanup step first)
    Xla,
    TmTensor,
    Tosa,
}

option_enum!(InputDialect, "input_dialect.dialect", {
    None => "none",
    Mhlo => "mhlo",
    Xla => "xla",
    TmTensor => "tm-tensor",
    Tosa => "tosa",
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDialectOptions {
    pub dialect: InputDialect,
}

impl Default for InputDialectOptions {
    fn default() -> Self {
        Self {
            dialect: InputDialect::None,
        }
    }
}

impl InputDialectOptions {
    /// Builder: Set dialect
    pub fn dialect(mut self, v: InputDialect) -> Self {
        self.dialect = v;
        self
    }
}

// ============================================================================
// High-Level Optimization Options
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct HighLevelOptimizationOptions {
    /// Hoist constant expressions into globals
    pub const_expr_hoisting: bool,

    /// Allow lowering numeric precision (e.g. f32 → f16) where safe
    pub numeric_precision_reduction: bool,

    /// Evaluate constant expressions at compile time (needs a const-eval hook)
    pub const_eval: bool,

    /// Strip assertion ops once optimization analysis has seen them
    pub strip_assertions: bool,
}

impl HighLevelOptimizationOptions {
    /// Builder: Set const_expr_hoisting
    pub fn const_expr_hoisting(mut self, v: bool) -> Self {
        self.const_expr_hoisting = v;
        self
    }

    /// Builder: Set numeric_precision_reduction
    pub fn numeric_precision_reduction(mut self, v: bool) -> Self {
        self.numeric_precision_reduction = v;
        self
    }

    /// Builder: Set const_eval
    pub fn const_eval(mut self, v: bool) -> Self {
        self.const_eval = v;
        self
    }

    /// Builder: Set strip_assertions
    pub fn strip_assertions(mut self, v: bool) -> Self {
        self.strip_assertions = v;
        self
    }
}

// ============================================================================
// Scheduling Options
// ============================================================================

/// How (and whether) work is scheduled onto devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionModel {
    /// Host code only; no scheduling or hardware abstraction
    HostOnly,
    /// Asynchronous, scheduling owned by the module
    AsyncInternal,
    /// Asynchronous, scheduling owned by the caller
    AsyncExternal,
    /// Synchronous with statically linked executables
    InlineStatic,
    /// Synchronous with dynamically loaded executables
    InlineDynamic,
}

option_enum!(ExecutionModel, "scheduling.execution_model", {
    HostOnly => "host-only",
    AsyncInternal => "async-internal",
    AsyncExternal => "async-external",
    InlineStatic => "inline-static",
    InlineDynamic => "inline-dynamic",
});

/// Hardware-abstraction pipeline flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HalVariant {
    Async,
    InlineStatic,
    InlineDynamic,
}

impl HalVariant {
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::Async => "hal-async",
            Self::InlineStatic => "hal-inline-static",
            Self::InlineDynamic => "hal-inline-dynamic",
        }
    }
}

impl ExecutionModel {
    /// Hardware-abstraction variant for this model (`None` for host-only)
    ///
    /// Every model is listed explicitly; a new model must pick its variant
    /// here rather than inherit one.
    pub fn hal_variant(&self) -> Option<HalVariant> {
        match self {
            Self::HostOnly => None,
            Self::AsyncInternal => Some(HalVariant::Async),
            Self::AsyncExternal => Some(HalVariant::Async),
            Self::InlineStatic => Some(HalVariant::InlineStatic),
            Self::InlineDynamic => Some(HalVariant::InlineDynamic),
        }
    }

    /// Whether scheduling and hardware-abstraction stages apply
    pub fn needs_device_lowering(&self) -> bool {
        self.hal_variant().is_some()
    }
}

/// Output format for scheduling statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DumpStatisticsFormat {
    None,
    Pretty,
    Verbose,
    Csv,
    Json,
}

option_enum!(DumpStatisticsFormat, "scheduling.dump_statistics_format", {
    None => "none",
    Pretty => "pretty",
    Verbose => "verbose",
    Csv => "csv",
    Json => "json",
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingOptions {
    pub execution_model: ExecutionModel,

    pub dump_statistics_format: DumpStatisticsFormat,

    /// Statistics destination; the log when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump_statistics_file: Option<PathBuf>,
}

impl Default for SchedulingOptions {
    fn default() -> Self {
        Self {
            execution_model: ExecutionModel::AsyncInternal,
            dump_statistics_format: DumpStatisticsFormat::None,
            dump_statistics_file: None,
        }
    }
}

impl SchedulingOptions {
    /// Builder: Set execution_model
    pub fn execution_model(mut self, v: ExecutionModel) -> Self {
        self.execution_model = v;
        self
    }

    /// Builder: Set dump_statistics_format
    pub fn dump_statistics_format(mut self, v: DumpStatisticsFormat) -> Self {
        self.dump_statistics_format = v;
        self
    }

    /// Builder: Set dump_statistics_file
    pub fn dump_statistics_file(mut self, v: impl Into<PathBuf>) -> Self {
        self.dump_statistics_file = Some(v.into());
        self
    }
}

// ============================================================================
// Target Backend Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetBackendOptions {
    /// Executable target backends (e.g. `llvm-cpu`, `vulkan-spirv`)
    pub targets: Vec<String>,

    /// Run the transform-legality gate after hardware abstraction
    pub verify_transform_legality: bool,

    /// Op kind the gate inspects
    pub legality_op_kind: String,

    /// Marker attribute that must be gone by the gate
    pub legality_marker: String,
}

impl Default for TargetBackendOptions {
    fn default() -> Self {
        Self {
            targets: vec!["llvm-cpu".to_string()],
            verify_transform_legality: true,
            legality_op_kind: DEFAULT_LEGALITY_OP_KIND.to_string(),
            legality_marker: DEFAULT_LEGALITY_MARKER.to_string(),
        }
    }
}

impl TargetBackendOptions {
    /// Builder: Replace the target list
    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Set verify_transform_legality
    pub fn verify_transform_legality(mut self, v: bool) -> Self {
        self.verify_transform_legality = v;
        self
    }

    /// Builder: Set the gate's op kind and marker
    pub fn legality_rule(mut self, op_kind: impl Into<String>, marker: impl Into<String>) -> Self {
        self.legality_op_kind = op_kind.into();
        self.legality_marker = marker.into();
        self
    }
}

// ============================================================================
// Bytecode Target Options
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BytecodeTargetOptions {
    /// Width of VM index values (32 or 64)
    pub index_bits: u32,

    /// Allow f32 ops in the bytecode
    pub f32_extension: bool,

    /// Allow f64 ops in the bytecode
    pub f64_extension: bool,

    /// Truncate floats wider than the enabled extensions
    pub truncate_unsupported_floats: bool,

    /// Prefer smaller register frames over speed
    pub optimize_for_stack_size: bool,
}

impl Default for BytecodeTargetOptions {
    fn default() -> Self {
        Self {
            index_bits: 32,
            f32_extension: true,
            f64_extension: false,
            truncate_unsupported_floats: true,
            optimize_for_stack_size: true,
        }
    }
}

impl BytecodeTargetOptions {
    /// Builder: Set index_bits
    pub fn index_bits(mut self, v: u32) -> Self {
        self.index_bits = v;
        self
    }

    /// Builder: Set f32_extension
    pub fn f32_extension(mut self, v: bool) -> Self {
        self.f32_extension = v;
        self
    }

    /// Builder: Set f64_extension
    pub fn f64_extension(mut self, v: bool) -> Self {
        self.f64_extension = v;
        self
    }

    /// Builder: Set truncate_unsupported_floats
    pub fn truncate_unsupported_floats(mut self, v: bool) -> Self {
        self.truncate_unsupported_floats = v;
        self
    }

    /// Builder: Set optimize_for_stack_size
    pub fn optimize_for_stack_size(mut self, v: bool) -> Self {
        self.optimize_for_stack_size = v;
        self
    }
}

// ============================================================================
// Validatable impls
// ============================================================================

impl Validatable for BindingOptions {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "BindingOptions"
    }
}

impl Validatable for InputDialectOptions {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "InputDialectOptions"
    }
}

impl Validatable for HighLevelOptimizationOptions {
    fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "HighLevelOptimizationOptions"
    }
}

impl Validatable for SchedulingOptions {
    fn validate(&self) -> ConfigResult<()> {
        match &self.dump_statistics_file {
            Some(path) if path.as_os_str().is_empty() => Err(ConfigError::Validation(
                "scheduling.dump_statistics_file must not be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn config_name(&self) -> &'static str {
        "SchedulingOptions"
    }
}

impl Validatable for TargetBackendOptions {
    fn validate(&self) -> ConfigResult<()> {
        for (i, target) in self.targets.iter().enumerate() {
            if target.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "target_backend.targets[{}] is empty",
                    i
                )));
            }
            if self.targets[..i].contains(target) {
                return Err(ConfigError::Validation(format!(
                    "target_backend.targets lists '{}' more than once",
                    target
                )));
            }
        }
        if self.legality_op_kind.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target_backend.legality_op_kind must not be empty".to_string(),
            ));
        }
        if self.legality_marker.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target_backend.legality_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "TargetBackendOptions"
    }
}

impl Validatable for BytecodeTargetOptions {
    fn validate(&self) -> ConfigResult<()> {
        if self.index_bits != 32 && self.index_bits != 64 {
            return Err(ConfigError::range_with_hint(
                "bytecode_target.index_bits",
                self.index_bits,
                32,
                64,
                "Only 32 and 64 bit indices are supported",
            ));
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "BytecodeTargetOptions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(BindingOptions::default().native);
        assert!(!BindingOptions::default().tflite);
        assert_eq!(InputDialectOptions::default().dialect, InputDialect::None);
        assert_eq!(
            SchedulingOptions::default().execution_model,
            ExecutionModel::AsyncInternal
        );
        assert_eq!(BytecodeTargetOptions::default().index_bits, 32);
        assert_eq!(TargetBackendOptions::default().targets, vec!["llvm-cpu"]);
    }

    #[test]
    fn test_hal_variant_host_only() {
        assert_eq!(ExecutionModel::HostOnly.hal_variant(), None);
    }

    #[test]
    fn test_hal_variant_async_internal() {
        assert_eq!(
            ExecutionModel::AsyncInternal.hal_variant(),
            Some(HalVariant::Async)
        );
    }

    #[test]
    fn test_hal_variant_async_external() {
        assert_eq!(
            ExecutionModel::AsyncExternal.hal_variant(),
            Some(HalVariant::Async)
        );
    }

    #[test]
    fn test_hal_variant_inline_static() {
        assert_eq!(
            ExecutionModel::InlineStatic.hal_variant(),
            Some(HalVariant::InlineStatic)
        );
    }

    #[test]
    fn test_hal_variant_inline_dynamic() {
        assert_eq!(
            ExecutionModel::InlineDynamic.hal_variant(),
            Some(HalVariant::InlineDynamic)
        );
    }

    #[test]
    fn test_hal_variant_covers_every_model() {
        // Only host-only skips device lowering
        for model in ExecutionModel::ALL {
            assert_eq!(
                model.needs_device_lowering(),
                *model != ExecutionModel::HostOnly,
                "{}",
                model
            );
        }
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(
            "inline-static".parse::<ExecutionModel>().unwrap(),
            ExecutionModel::InlineStatic
        );
        assert_eq!(
            "HOST_ONLY".parse::<ExecutionModel>().unwrap(),
            ExecutionModel::HostOnly
        );
        assert_eq!("tm_tensor".parse::<InputDialect>().unwrap(), InputDialect::TmTensor);
        assert_eq!(
            "json".parse::<DumpStatisticsFormat>().unwrap(),
            DumpStatisticsFormat::Json
        );

        let err = "tosaa".parse::<InputDialect>().unwrap_err();
        assert!(err.to_string().contains("Did you mean 'tosa'?"));
    }

    #[test]
    fn test_enum_display_matches_serde() {
        for model in ExecutionModel::ALL {
            let yaml = serde_yaml::to_string(model).unwrap();
            assert_eq!(yaml.trim(), model.as_str());
        }
    }

    #[test]
    fn test_index_bits_validation() {
        assert!(BytecodeTargetOptions::default().index_bits(64).validate().is_ok());
        let err = BytecodeTargetOptions::default()
            .index_bits(16)
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Range { .. }));
    }

    #[test]
    fn test_target_validation() {
        assert!(TargetBackendOptions::default()
            .targets(["llvm-cpu", "vulkan-spirv"])
            .validate()
            .is_ok());
        assert!(TargetBackendOptions::default()
            .targets(["llvm-cpu", "llvm-cpu"])
            .validate()
            .is_err());
        assert!(TargetBackendOptions::default()
            .targets([" "])
            .validate()
            .is_err());
        assert!(TargetBackendOptions::default()
            .legality_rule("", "marker")
            .validate()
            .is_err());
    }

    #[test]
    fn test_validation_through_trait_object() {
        let bytecode = BytecodeTargetOptions::default().index_bits(48);
        let target = TargetBackendOptions::default().targets(["llvm-cpu", "llvm-cpu"]);
        let groups: [&dyn Validatable; 2] = [&bytecode, &target];

        assert_eq!(groups[0].config_name(), "BytecodeTargetOptions");
        assert!(matches!(groups[0].validate(), Err(ConfigError::Range { .. })));
        assert!(matches!(groups[1].validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_scheduling_validation() {
        assert!(SchedulingOptions::default().validate().is_ok());
        let bad = SchedulingOptions {
            dump_statistics_file: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(Validatable::validate(&bad).is_err());
    }
}
