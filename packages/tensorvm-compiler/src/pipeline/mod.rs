//! Staged lowering pipeline
//!
//! ```text
//! PipelineOptions ──resolve(hooks, converters)──▶ ResolvedOptions
//!                                                      │
//!                                      build_stage_list(options, hooks)
//!                                                      ▼
//!                  ProgramTree ──PipelineExecutor::run──▶ lowered ProgramTree
//! ```
//!
//! Building is pure; execution is strictly sequential per tree and stops at
//! the first failing stage.

pub mod builder;
pub mod converters;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod passes;
pub mod registry;
pub mod stage;

pub use builder::build_stage_list;
pub use converters::ConverterRegistry;
pub use error::{PipelineError, PipelineResult, StageFailure};
pub use executor::{ExecutionReport, PipelineExecutor, StageMetrics};
pub use hooks::{ConstEvalHook, PipelineHooks};
pub use passes::{BuiltinPassProvider, OpStatistics, OverridePassProvider, Pass, PassProvider};
pub use registry::{
    PipelineRegistration, PipelineRegistry, TRANSFORMATION_PIPELINE, VERIFY_LEGALITY_PIPELINE,
};
pub use stage::{PipelineStage, StageKind, StageList};
