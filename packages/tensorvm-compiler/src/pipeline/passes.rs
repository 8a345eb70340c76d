//! Stage implementations
//!
//! The executor asks a `PassProvider` for the pass behind every atomic stage.
//! `BuiltinPassProvider` ships the passes this crate owns; stages whose
//! semantics belong to external collaborators default to no-op passes.
//! Embedders replace any stage by name with `OverridePassProvider`.

use super::error::{PipelineError, PipelineResult, StageFailure};
use super::hooks::{ConstEvalHook, PipelineHooks};
use super::stage::StageKind;
use crate::config::DumpStatisticsFormat;
use crate::features::legality::{self, LegalityRule};
use crate::shared::constants::{ASSERTION_OP_KINDS, COMPILER_HINT_PREFIX, CONST_EXPR_ATTR};
use crate::shared::models::{Diagnostic, ProgramTree, WalkControl};
use ahash::AHashMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// One atomic transformation over the whole tree
pub trait Pass: Send + Sync {
    fn run(&self, tree: &mut ProgramTree) -> PipelineResult<()>;
}

/// Supplies the pass for each stage
pub trait PassProvider: Send + Sync {
    fn create(&self, stage: &StageKind, hooks: &PipelineHooks) -> Arc<dyn Pass>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Builtin provider
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPassProvider;

impl PassProvider for BuiltinPassProvider {
    fn create(&self, stage: &StageKind, hooks: &PipelineHooks) -> Arc<dyn Pass> {
        match stage {
            StageKind::HighLevelOptimization { const_eval, .. } => {
                Arc::new(HighLevelOptimizationPass {
                    hook: if *const_eval {
                        hooks.const_eval.clone()
                    } else {
                        None
                    },
                })
            }
            StageKind::StripAssertions => Arc::new(StripAssertionsPass),
            StageKind::SchedulingLowering {
                dump_statistics_format,
                dump_statistics_file,
            } => Arc::new(SchedulingStatisticsPass {
                format: *dump_statistics_format,
                file: dump_statistics_file.clone(),
            }),
            StageKind::VerifyTransformLegality { op_kind, marker } => {
                Arc::new(LegalityGatePass {
                    rule: LegalityRule::new(op_kind.clone(), marker.clone()),
                })
            }
            StageKind::DropCompilerHints => Arc::new(DropCompilerHintsPass),
            other => Arc::new(NoopPass { stage: other.name() }),
        }
    }
}

/// Builtin passes with some stages replaced by name
#[derive(Clone, Default)]
pub struct OverridePassProvider {
    overrides: HashMap<String, Arc<dyn Pass>>,
}

impl OverridePassProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Run `pass` for every stage named `stage`
    pub fn with_override(mut self, stage: impl Into<String>, pass: impl Pass + 'static) -> Self {
        self.overrides.insert(stage.into(), Arc::new(pass));
        self
    }
}

impl PassProvider for OverridePassProvider {
    fn create(&self, stage: &StageKind, hooks: &PipelineHooks) -> Arc<dyn Pass> {
        match self.overrides.get(stage.name()) {
            Some(pass) => Arc::clone(pass),
            None => BuiltinPassProvider.create(stage, hooks),
        }
    }
}

/// Closures are passes
impl<F> Pass for F
where
    F: Fn(&mut ProgramTree) -> PipelineResult<()> + Send + Sync,
{
    fn run(&self, tree: &mut ProgramTree) -> PipelineResult<()> {
        self(tree)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Passes
// ═══════════════════════════════════════════════════════════════════════════

/// Stage owned by an external collaborator
struct NoopPass {
    stage: &'static str,
}

impl Pass for NoopPass {
    fn run(&self, _tree: &mut ProgramTree) -> PipelineResult<()> {
        tracing::trace!(stage = self.stage, "no builtin implementation; tree unchanged");
        Ok(())
    }
}

/// Replaces `const_expr`-tagged ops with the hook's evaluation
struct HighLevelOptimizationPass {
    hook: Option<Arc<dyn ConstEvalHook>>,
}

impl Pass for HighLevelOptimizationPass {
    fn run(&self, tree: &mut ProgramTree) -> PipelineResult<()> {
        let Some(hook) = &self.hook else {
            return Ok(());
        };

        let mut folded = 0usize;
        tree.walk_mut(|op| {
            if op.has_attr(CONST_EXPR_ATTR) {
                if let Some(replacement) = hook.evaluate(op) {
                    *op = replacement;
                    folded += 1;
                }
            }
        });
        tracing::debug!(folded, "const-eval folded constant expressions");
        Ok(())
    }
}

struct StripAssertionsPass;

impl Pass for StripAssertionsPass {
    fn run(&self, tree: &mut ProgramTree) -> PipelineResult<()> {
        let removed = tree.retain_ops(|op| !ASSERTION_OP_KINDS.contains(&op.kind.as_str()));
        tracing::debug!(removed, "stripped assertions");
        Ok(())
    }
}

struct DropCompilerHintsPass;

impl Pass for DropCompilerHintsPass {
    fn run(&self, tree: &mut ProgramTree) -> PipelineResult<()> {
        tree.walk_mut(|op| {
            op.attributes
                .retain(|key, _| !key.starts_with(COMPILER_HINT_PREFIX));
        });
        Ok(())
    }
}

struct LegalityGatePass {
    rule: LegalityRule,
}

impl Pass for LegalityGatePass {
    fn run(&self, tree: &mut ProgramTree) -> PipelineResult<()> {
        legality::verify_rule(tree, &self.rule)
            .map_err(|violation| PipelineError::legality("verify-transform-legality", violation))
    }
}

/// Op-kind histogram written by the scheduling stage
struct SchedulingStatisticsPass {
    format: DumpStatisticsFormat,
    file: Option<PathBuf>,
}

const SCHEDULING_STAGE: &str = "scheduling-lowering";

impl Pass for SchedulingStatisticsPass {
    fn run(&self, tree: &mut ProgramTree) -> PipelineResult<()> {
        if self.format == DumpStatisticsFormat::None {
            return Ok(());
        }

        let statistics = OpStatistics::collect(tree);
        let rendered = statistics
            .render(self.format)
            .map_err(|e| PipelineError::stage(SCHEDULING_STAGE, e.to_string()))?;

        match &self.file {
            Some(path) => std::fs::write(path, rendered).map_err(|e| {
                PipelineError::Stage(StageFailure::new(
                    SCHEDULING_STAGE,
                    vec![Diagnostic::error(format!(
                        "failed to write statistics to {}: {}",
                        path.display(),
                        e
                    ))],
                ))
            }),
            None => {
                tracing::info!(target: "tensorvm::statistics", "\n{}", rendered);
                Ok(())
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Statistics
// ═══════════════════════════════════════════════════════════════════════════

/// Per-kind op counts and nesting depth
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpStatistics {
    /// (kind, count), sorted by descending count then kind
    pub counts: Vec<(String, usize)>,
    pub total: usize,
    pub max_depth: usize,
}

impl OpStatistics {
    pub fn collect(tree: &ProgramTree) -> Self {
        let mut counts: AHashMap<String, usize> = AHashMap::new();
        let mut total = 0;
        let mut max_depth = 0;
        tree.walk(|op, path| {
            *counts.entry(op.kind.clone()).or_insert(0) += 1;
            total += 1;
            max_depth = max_depth.max(path.depth());
            WalkControl::Continue
        });

        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self {
            counts,
            total,
            max_depth,
        }
    }

    pub fn render(&self, format: DumpStatisticsFormat) -> serde_json::Result<String> {
        Ok(match format {
            DumpStatisticsFormat::None => String::new(),
            DumpStatisticsFormat::Pretty => {
                let width = self.counts.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                let mut out = format!("Op statistics ({} ops)\n", self.total);
                for (kind, count) in &self.counts {
                    out.push_str(&format!("  {:<width$}  {}\n", kind, count, width = width));
                }
                out
            }
            DumpStatisticsFormat::Verbose => {
                let mut out = format!(
                    "Op statistics: {} ops, {} kinds, max nesting depth {}\n",
                    self.total,
                    self.counts.len(),
                    self.max_depth
                );
                for (kind, count) in &self.counts {
                    let share = if self.total == 0 {
                        0.0
                    } else {
                        *count as f64 * 100.0 / self.total as f64
                    };
                    out.push_str(&format!("  {}: {} ({:.1}%)\n", kind, count, share));
                }
                out
            }
            DumpStatisticsFormat::Csv => {
                let mut out = String::from("kind,count\n");
                for (kind, count) in &self.counts {
                    out.push_str(&format!("{},{}\n", kind, count));
                }
                out
            }
            DumpStatisticsFormat::Json => {
                let by_kind: Vec<serde_json::Value> = self
                    .counts
                    .iter()
                    .map(|(kind, count)| serde_json::json!({ "kind": kind, "count": count }))
                    .collect();
                serde_json::to_string_pretty(&serde_json::json!({
                    "total": self.total,
                    "max_depth": self.max_depth,
                    "ops": by_kind,
                }))?
            }
        })
    }
}
