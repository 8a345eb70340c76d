//! Pipeline executor
//!
//! Drives one program tree through a stage list, strictly in order. A stage
//! starts only after the previous one returned `Ok`; the first failure ends
//! the run and the tree keeps whatever the failing stage already applied.

use super::error::PipelineResult;
use super::hooks::PipelineHooks;
use super::passes::{BuiltinPassProvider, PassProvider};
use super::stage::{PipelineStage, StageList};
use crate::shared::models::{OpPath, Operation, ProgramTree};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ═══════════════════════════════════════════════════════════════════════════
// Metrics
// ═══════════════════════════════════════════════════════════════════════════

/// Timing of one top-level stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageMetrics {
    /// Stage label (`anchor(...)` for sub-pipelines)
    pub stage: String,

    /// Stage execution time
    pub duration: Duration,

    /// Number of scopes the stage ran on (1, or the anchor op count)
    pub scopes: usize,

    /// Op count after the stage
    pub ops_after: usize,
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub stages: Vec<StageMetrics>,
    pub total_duration: Duration,
}

impl ExecutionReport {
    pub fn stage_labels(&self) -> Vec<&str> {
        self.stages.iter().map(|m| m.stage.as_str()).collect()
    }

    /// Human-readable per-stage timing table
    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} stages in {:.3}ms",
            self.stages.len(),
            self.total_duration.as_secs_f64() * 1000.0
        )];
        for m in &self.stages {
            lines.push(format!(
                "  {:<40} {:>9.3}ms  scopes={} ops={}",
                m.stage,
                m.duration.as_secs_f64() * 1000.0,
                m.scopes,
                m.ops_after
            ));
        }
        lines.join("\n")
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Executor
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PipelineExecutor {
    hooks: PipelineHooks,
    provider: Arc<dyn PassProvider>,
}

impl PipelineExecutor {
    /// Executor running builtin passes with the given hooks
    pub fn new(hooks: PipelineHooks) -> Self {
        Self {
            hooks,
            provider: Arc::new(BuiltinPassProvider),
        }
    }

    /// Builder: Use a custom pass provider
    pub fn with_provider(mut self, provider: impl PassProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    pub fn hooks(&self) -> &PipelineHooks {
        &self.hooks
    }

    /// Run every stage on `tree`, in order
    pub fn run(&self, stages: &StageList, tree: &mut ProgramTree) -> PipelineResult<ExecutionReport> {
        let start = Instant::now();
        tracing::info!(stages = stages.len(), ops = tree.op_count(), "running pipeline");

        let mut report = ExecutionReport::default();
        for stage in stages {
            let stage_start = Instant::now();
            let result = self.run_stage(stage, tree);
            let duration = stage_start.elapsed();

            let scopes = match result {
                Ok(scopes) => scopes,
                Err(err) => {
                    tracing::debug!(
                        stage = %stage.label(),
                        category = err.category(),
                        "stage failed; halting pipeline"
                    );
                    return Err(err);
                }
            };

            let metrics = StageMetrics {
                stage: stage.label(),
                duration,
                scopes,
                ops_after: tree.op_count(),
            };
            tracing::debug!(
                stage = %metrics.stage,
                elapsed_us = duration.as_micros() as u64,
                ops = metrics.ops_after,
                "stage finished"
            );
            report.stages.push(metrics);
        }

        report.total_duration = start.elapsed();
        Ok(report)
    }

    /// Lower independent trees in parallel, one sequential run per tree
    ///
    /// Results are in input order.
    pub fn run_batch(
        &self,
        stages: &StageList,
        trees: &mut [ProgramTree],
    ) -> Vec<PipelineResult<ExecutionReport>> {
        trees
            .par_iter_mut()
            .map(|tree| self.run(stages, tree))
            .collect()
    }

    /// Returns the number of scopes the stage ran on
    fn run_stage(&self, stage: &PipelineStage, tree: &mut ProgramTree) -> PipelineResult<usize> {
        match stage {
            PipelineStage::Pass(kind) => {
                self.provider.create(kind, &self.hooks).run(tree)?;
                Ok(1)
            }
            PipelineStage::Nested { anchor, stages } => {
                self.run_nested(anchor, stages, &mut tree.operations, &[])
            }
        }
    }

    /// Run `stages` on every `anchor` op under `ops`, pre-order
    ///
    /// Each anchor op is lifted into its own tree for the sub-pipeline and
    /// spliced back afterwards (the sub-pipeline may replace or remove it).
    /// Anchors are not searched for inside other anchors. On failure every
    /// op, processed or not, is put back before returning, and diagnostic
    /// paths are translated to the enclosing tree. `prefix` is the path of
    /// the block holding `ops` (empty at the root).
    fn run_nested(
        &self,
        anchor: &str,
        stages: &[PipelineStage],
        ops: &mut Vec<Operation>,
        prefix: &[usize],
    ) -> PipelineResult<usize> {
        let original = std::mem::take(ops);
        let mut rebuilt = Vec::with_capacity(original.len());
        let mut remaining = original.into_iter();
        let mut scopes = 0;

        while let Some(mut op) = remaining.next() {
            let position = rebuilt.len();
            let result = if op.is(anchor) {
                let anchor_path = OpPath::from_indices([prefix, &[position]].concat());
                let mut scoped = ProgramTree::from_operations(vec![op]);
                let result = stages
                    .iter()
                    .try_for_each(|stage| self.run_stage(stage, &mut scoped).map(|_| ()))
                    .map_err(|err| err.rebased(&anchor_path));
                rebuilt.extend(scoped.operations);
                scopes += 1;
                result
            } else {
                let mut result = Ok(());
                'regions: for (r, region) in op.regions.iter_mut().enumerate() {
                    for (b, block) in region.blocks.iter_mut().enumerate() {
                        let block_prefix = [prefix, &[position, r, b]].concat();
                        match self.run_nested(anchor, stages, &mut block.operations, &block_prefix) {
                            Ok(count) => scopes += count,
                            Err(err) => {
                                result = Err(err);
                                break 'regions;
                            }
                        }
                    }
                }
                rebuilt.push(op);
                result
            };

            if let Err(err) = result {
                rebuilt.extend(remaining);
                *ops = rebuilt;
                return Err(err);
            }
        }

        *ops = rebuilt;
        Ok(scopes)
    }
}
