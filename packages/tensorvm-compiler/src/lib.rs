/*
 * tensorvm-compiler - staged lowering pipeline
 *
 * Feature-First Architecture:
 * - shared/      : Program tree, locations, diagnostics
 * - config/      : Option groups, resolution, YAML/env layers
 * - features/    : Vertical slices (transform legality gate)
 * - pipeline/    : Stage list construction and execution
 *
 * Parallelism:
 * - One sequential pipeline per program tree
 * - Rayon across independent trees (PipelineExecutor::run_batch)
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::module_inception)] // Module naming intentional

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports
// ═══════════════════════════════════════════════════════════════════════════

/// Pipeline configuration
pub mod config;

/// Error types
pub mod errors;

/// Feature modules
pub mod features;

/// Orchestration
pub mod pipeline;

/// Shared models
pub mod shared;

pub use config::{PipelineOptions, ResolvedOptions};
pub use errors::{CompilerError, Result};
pub use pipeline::{
    build_stage_list, ConverterRegistry, ExecutionReport, PipelineExecutor, PipelineHooks,
    StageList,
};
pub use shared::models::{Diagnostic, Operation, ProgramTree};

/// Resolve `options`, build the stage list and lower `tree` in place
///
/// Uses the builtin converters and passes. Configuration errors are returned
/// before the tree is touched.
pub fn lower_program(
    options: PipelineOptions,
    hooks: &PipelineHooks,
    tree: &mut ProgramTree,
) -> Result<ExecutionReport> {
    let resolved = options.resolve(hooks, &ConverterRegistry::builtin())?;
    let stages = build_stage_list(&resolved, hooks);
    let report = PipelineExecutor::new(hooks.clone()).run(&stages, tree)?;
    Ok(report)
}
