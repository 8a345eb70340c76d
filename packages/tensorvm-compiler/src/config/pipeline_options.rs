//! Pipeline options (builder) and resolution
//!
//! `PipelineOptions` collects the option groups; `resolve` validates them
//! individually and against each other, then freezes them into
//! `ResolvedOptions`, the only form the orchestrator accepts.

use super::error::{ConfigError, ConfigResult};
use super::io::{OptionGroupsV1, OptionsExportV1};
use super::option_groups::*;
use super::provenance::{ConfigProvenance, ConfigSource};
use super::validation::{Validatable, ValidatableCollection};
use crate::pipeline::{ConverterRegistry, PipelineHooks};
use std::path::Path;

/// Pipeline options (builder)
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub(crate) binding: BindingOptions,
    pub(crate) input_dialect: InputDialectOptions,
    pub(crate) high_level_optimization: HighLevelOptimizationOptions,
    pub(crate) scheduling: SchedulingOptions,
    pub(crate) target_backend: TargetBackendOptions,
    pub(crate) bytecode_target: BytecodeTargetOptions,

    /// Strict mode: a missing prerequisite fails resolution (default: false)
    /// - true: resolve() fails with ConfigError::MissingPrerequisite
    /// - false: resolve() silently disables the dependent feature (debug log only)
    pub(crate) strict_mode: bool,

    /// Provenance tracking (field-level)
    pub(crate) provenance: ConfigProvenance,
}

impl PipelineOptions {
    /// All groups at their defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable strict mode (errors on missing prerequisites)
    pub fn strict_mode(mut self, enabled: bool) -> Self {
        self.strict_mode = enabled;
        self.provenance.track_field("strict_mode", ConfigSource::Builder);
        self
    }

    /// Override binding options (closure)
    pub fn binding<F>(mut self, f: F) -> Self
    where
        F: FnOnce(BindingOptions) -> BindingOptions,
    {
        self.binding = f(self.binding);
        self.provenance.track_field("binding.*", ConfigSource::Builder);
        self
    }

    /// Override input dialect options (closure)
    pub fn input_dialect<F>(mut self, f: F) -> Self
    where
        F: FnOnce(InputDialectOptions) -> InputDialectOptions,
    {
        self.input_dialect = f(self.input_dialect);
        self.provenance
            .track_field("input_dialect.*", ConfigSource::Builder);
        self
    }

    /// Override high-level optimization options (closure)
    pub fn high_level_optimization<F>(mut self, f: F) -> Self
    where
        F: FnOnce(HighLevelOptimizationOptions) -> HighLevelOptimizationOptions,
    {
        self.high_level_optimization = f(self.high_level_optimization);
        self.provenance
            .track_field("high_level_optimization.*", ConfigSource::Builder);
        self
    }

    /// Override scheduling options (closure)
    pub fn scheduling<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SchedulingOptions) -> SchedulingOptions,
    {
        self.scheduling = f(self.scheduling);
        self.provenance
            .track_field("scheduling.*", ConfigSource::Builder);
        self
    }

    /// Override target backend options (closure)
    pub fn target_backend<F>(mut self, f: F) -> Self
    where
        F: FnOnce(TargetBackendOptions) -> TargetBackendOptions,
    {
        self.target_backend = f(self.target_backend);
        self.provenance
            .track_field("target_backend.*", ConfigSource::Builder);
        self
    }

    /// Override bytecode target options (closure)
    pub fn bytecode_target<F>(mut self, f: F) -> Self
    where
        F: FnOnce(BytecodeTargetOptions) -> BytecodeTargetOptions,
    {
        self.bytecode_target = f(self.bytecode_target);
        self.provenance
            .track_field("bytecode_target.*", ConfigSource::Builder);
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_mode
    }

    /// Get provenance
    pub fn provenance(&self) -> &ConfigProvenance {
        &self.provenance
    }

    /// Validate and freeze
    ///
    /// Missing prerequisites are fatal in strict mode and silently downgraded
    /// otherwise; the downgrade is only visible at debug level. An
    /// unregistered input dialect, or device lowering without targets, is
    /// fatal in both modes.
    pub fn resolve(
        mut self,
        hooks: &PipelineHooks,
        converters: &ConverterRegistry,
    ) -> ConfigResult<ResolvedOptions> {
        // Step 1: Validate individual groups
        let groups: [&dyn Validatable; 6] = [
            &self.binding,
            &self.input_dialect,
            &self.high_level_optimization,
            &self.scheduling,
            &self.target_backend,
            &self.bytecode_target,
        ];
        for group in groups {
            group.validate()?;
            tracing::trace!(group = group.config_name(), "option group valid");
        }

        // Step 2: Dependent pairs
        self.resolve_prerequisites(hooks)?;

        // Step 3: Cross-group consistency
        self.cross_validate(converters)?;

        Ok(ResolvedOptions(self))
    }

    /// Features that only make sense with something else present
    fn resolve_prerequisites(&mut self, hooks: &PipelineHooks) -> ConfigResult<()> {
        if self.high_level_optimization.const_eval && !hooks.has_const_eval() {
            if self.strict_mode {
                return Err(ConfigError::MissingPrerequisite {
                    feature: "high_level_optimization.const_eval".to_string(),
                    prerequisite: "a const-eval hook".to_string(),
                    hint: "Install one with PipelineHooks::with_const_eval(..) or set const_eval=false"
                        .to_string(),
                });
            }
            tracing::debug!(
                "const_eval requested without a const-eval hook; using the plain high-level optimization stage"
            );
            self.high_level_optimization.const_eval = false;
        }

        if self.scheduling.dump_statistics_file.is_some()
            && self.scheduling.dump_statistics_format == DumpStatisticsFormat::None
        {
            if self.strict_mode {
                return Err(ConfigError::MissingPrerequisite {
                    feature: "scheduling.dump_statistics_file".to_string(),
                    prerequisite: "a dump_statistics_format other than 'none'".to_string(),
                    hint: "Set scheduling.dump_statistics_format or drop the file".to_string(),
                });
            }
            tracing::debug!(
                "dump_statistics_file ignored because dump_statistics_format is 'none'"
            );
            self.scheduling.dump_statistics_file = None;
        }

        Ok(())
    }

    /// Cross-group validation
    fn cross_validate(&self, converters: &ConverterRegistry) -> ConfigResult<()> {
        let dialect = self.input_dialect.dialect;
        if !converters.is_available(dialect) {
            return Err(ConfigError::UnavailableInputDialect {
                dialect: dialect.to_string(),
                available: converters.available(),
            });
        }

        let model = self.scheduling.execution_model;
        if model.needs_device_lowering() && self.target_backend.targets.is_empty() {
            return Err(ConfigError::CrossGroupConflict {
                issue: format!(
                    "execution model '{}' lowers to devices but no target backends are configured",
                    model
                ),
                fix: "Add a target with .target_backend(|t| t.targets([\"llvm-cpu\"])) or use execution model 'host-only'"
                    .to_string(),
            });
        }

        Ok(())
    }

    /// Load from a YAML string (v1 schema); `origin` labels provenance
    pub fn from_yaml_str(content: &str, origin: &str) -> ConfigResult<Self> {
        let export: OptionsExportV1 = serde_yaml::from_str(content)?;

        // Version check
        if export.version != 1 {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: vec![1],
            });
        }

        let mut options = Self::new();
        let source = || ConfigSource::Yaml {
            path: origin.to_string(),
        };

        if let Some(strict) = export.strict_mode {
            options.strict_mode = strict;
            options.provenance.track_field("strict_mode", source());
        }

        if let Some(groups) = export.options {
            // Reject bad values at load time so the error names the file
            groups.binding.validate_all()?;
            groups.input_dialect.validate_all()?;
            groups.high_level_optimization.validate_all()?;
            groups.scheduling.validate_all()?;
            groups.target_backend.validate_all()?;
            groups.bytecode_target.validate_all()?;

            if let Some(binding) = groups.binding {
                options.binding = binding;
                options.provenance.track_field("binding.*", source());
            }
            if let Some(input_dialect) = groups.input_dialect {
                options.input_dialect = input_dialect;
                options.provenance.track_field("input_dialect.*", source());
            }
            if let Some(hlo) = groups.high_level_optimization {
                options.high_level_optimization = hlo;
                options
                    .provenance
                    .track_field("high_level_optimization.*", source());
            }
            if let Some(scheduling) = groups.scheduling {
                options.scheduling = scheduling;
                options.provenance.track_field("scheduling.*", source());
            }
            if let Some(target_backend) = groups.target_backend {
                options.target_backend = target_backend;
                options.provenance.track_field("target_backend.*", source());
            }
            if let Some(bytecode_target) = groups.bytecode_target {
                options.bytecode_target = bytecode_target;
                options.provenance.track_field("bytecode_target.*", source());
            }
        }

        Ok(options)
    }

    /// Load from YAML file (v1 schema)
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content, &path.display().to_string())
    }

    /// Export to YAML (v1 schema, every group written out)
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = OptionsExportV1 {
            version: 1,
            strict_mode: Some(self.strict_mode),
            options: Some(OptionGroupsV1 {
                binding: Some(self.binding.clone()),
                input_dialect: Some(self.input_dialect.clone()),
                high_level_optimization: Some(self.high_level_optimization.clone()),
                scheduling: Some(self.scheduling.clone()),
                target_backend: Some(self.target_backend.clone()),
                bytecode_target: Some(self.bytecode_target.clone()),
            }),
        };

        Ok(serde_yaml::to_string(&export)?)
    }

    /// One-line human-readable description
    pub fn describe(&self) -> String {
        let mut bindings = Vec::new();
        if self.binding.native {
            bindings.push("native");
        }
        if self.binding.tflite {
            bindings.push("tflite");
        }

        format!(
            "input={} bindings=[{}] model={} targets=[{}] index_bits={}{}",
            self.input_dialect.dialect,
            bindings.join(", "),
            self.scheduling.execution_model,
            self.target_backend.targets.join(", "),
            self.bytecode_target.index_bits,
            if self.strict_mode { " (strict)" } else { "" }
        )
    }
}

/// Validated, immutable options
///
/// Only `PipelineOptions::resolve` constructs one.
#[derive(Debug, Clone)]
pub struct ResolvedOptions(PipelineOptions);

impl ResolvedOptions {
    /// Get inner options (consumes self)
    pub fn into_inner(self) -> PipelineOptions {
        self.0
    }

    /// Get reference to inner options
    pub fn as_inner(&self) -> &PipelineOptions {
        &self.0
    }

    pub fn binding(&self) -> &BindingOptions {
        &self.0.binding
    }

    pub fn input_dialect(&self) -> InputDialect {
        self.0.input_dialect.dialect
    }

    pub fn high_level_optimization(&self) -> &HighLevelOptimizationOptions {
        &self.0.high_level_optimization
    }

    pub fn scheduling(&self) -> &SchedulingOptions {
        &self.0.scheduling
    }

    pub fn execution_model(&self) -> ExecutionModel {
        self.0.scheduling.execution_model
    }

    pub fn target_backend(&self) -> &TargetBackendOptions {
        &self.0.target_backend
    }

    pub fn bytecode_target(&self) -> &BytecodeTargetOptions {
        &self.0.bytecode_target
    }

    pub fn is_strict(&self) -> bool {
        self.0.strict_mode
    }

    /// Get human-readable description
    pub fn describe(&self) -> String {
        self.0.describe()
    }

    /// Provenance summary
    pub fn provenance_summary(&self) -> String {
        self.0.provenance.summary()
    }

    /// Multi-line summary of every group
    pub fn summary(&self) -> String {
        let o = &self.0;
        let mut lines = vec![
            "Pipeline options:".to_string(),
            format!("  mode: {}", if o.strict_mode { "strict" } else { "permissive" }),
            format!("  input dialect: {}", o.input_dialect.dialect),
            format!(
                "  bindings: native={} tflite={}",
                o.binding.native, o.binding.tflite
            ),
            format!(
                "  high-level optimization: const_eval={} hoisting={} precision_reduction={} strip_assertions={}",
                o.high_level_optimization.const_eval,
                o.high_level_optimization.const_expr_hoisting,
                o.high_level_optimization.numeric_precision_reduction,
                o.high_level_optimization.strip_assertions
            ),
            format!(
                "  scheduling: model={} statistics={}",
                o.scheduling.execution_model, o.scheduling.dump_statistics_format
            ),
            format!(
                "  targets: [{}] (legality gate: {})",
                o.target_backend.targets.join(", "),
                if o.target_backend.verify_transform_legality {
                    "on"
                } else {
                    "off"
                }
            ),
            format!(
                "  bytecode: index_bits={} f32={} f64={}",
                o.bytecode_target.index_bits,
                o.bytecode_target.f32_extension,
                o.bytecode_target.f64_extension
            ),
        ];
        if let Some(path) = &o.scheduling.dump_statistics_file {
            lines.push(format!("  statistics file: {}", path.display()));
        }
        lines.join("\n")
    }

    /// Export to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        self.0.to_yaml()
    }
}
