//! Pipeline configuration
//!
//! Options come in independent groups, set through three layers:
//! - Builder: closure overrides per group
//! - Environment: `TENSORVM__<GROUP>__<FIELD>` variables
//! - YAML: versioned schema (v1)
//!
//! # Examples
//!
//! ```rust,ignore
//! use tensorvm_compiler::config::{ExecutionModel, PipelineOptions};
//! use tensorvm_compiler::pipeline::{ConverterRegistry, PipelineHooks};
//!
//! let resolved = PipelineOptions::new()
//!     .binding(|b| b.tflite(true))
//!     .scheduling(|s| s.execution_model(ExecutionModel::InlineStatic))
//!     .resolve(&PipelineHooks::empty(), &ConverterRegistry::builtin())?;
//! ```
//!
//! Resolution is the only way to obtain `ResolvedOptions`. In strict mode a
//! feature requested without its prerequisite fails; in permissive mode
//! (the default) the feature is silently disabled.

pub mod env;
pub mod error;
pub mod io;
pub mod option_groups;
pub mod pipeline_options;
pub mod provenance;
pub mod validation;

// Re-exports
pub use env::ENV_PREFIX;
pub use error::{ConfigError, ConfigResult};
pub use io::{OptionGroupsV1, OptionsExportV1};
pub use option_groups::{
    BindingOptions, BytecodeTargetOptions, DumpStatisticsFormat, ExecutionModel, HalVariant,
    HighLevelOptimizationOptions, InputDialect, InputDialectOptions, SchedulingOptions,
    TargetBackendOptions,
};
pub use pipeline_options::{PipelineOptions, ResolvedOptions};
pub use provenance::{ConfigProvenance, ConfigSource};
pub use validation::{Validatable, ValidatableCollection};
