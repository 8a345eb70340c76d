//! Pipeline stages
//!
//! A `StageList` is plain data: every stage carries the options it was
//! resolved with, so two lists built from equal inputs compare equal and
//! render to the same pipeline string.

use crate::config::{BytecodeTargetOptions, DumpStatisticsFormat, HalVariant};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════
// Stage kinds
// ═══════════════════════════════════════════════════════════════════════════

/// An atomic transformation stage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "kebab-case")]
pub enum StageKind {
    XlaCleanup,
    MhloInputConversion,
    TmTensorToLinalgExt,
    TosaInputConversion,
    CommonInputConversion,
    NativeBindings,
    TfliteBindings,
    HighLevelOptimization {
        /// Const-eval variant (only when a hook is installed)
        const_eval: bool,
        const_expr_hoisting: bool,
        numeric_precision_reduction: bool,
    },
    StripAssertions,
    SchedulingLowering {
        dump_statistics_format: DumpStatisticsFormat,
        dump_statistics_file: Option<PathBuf>,
    },
    HardwareAbstraction {
        variant: HalVariant,
        targets: Vec<String>,
    },
    VerifyTransformLegality {
        op_kind: String,
        marker: String,
    },
    VmLowering(BytecodeTargetOptions),
    DropCompilerHints,
}

impl StageKind {
    /// Registered stage name
    pub fn name(&self) -> &'static str {
        match self {
            Self::XlaCleanup => "xla-cleanup",
            Self::MhloInputConversion => "mhlo-input-conversion",
            Self::TmTensorToLinalgExt => "tm-tensor-to-linalg-ext",
            Self::TosaInputConversion => "tosa-input-conversion",
            Self::CommonInputConversion => "common-input-conversion",
            Self::NativeBindings => "native-bindings",
            Self::TfliteBindings => "tflite-bindings",
            Self::HighLevelOptimization { .. } => "high-level-optimization",
            Self::StripAssertions => "strip-assertions",
            Self::SchedulingLowering { .. } => "scheduling-lowering",
            Self::HardwareAbstraction { variant, .. } => variant.stage_name(),
            Self::VerifyTransformLegality { .. } => "verify-transform-legality",
            Self::VmLowering(_) => "vm-lowering",
            Self::DropCompilerHints => "drop-compiler-hints",
        }
    }

    /// `key=value` options rendered inside `{}` in the pipeline string
    fn option_text(&self) -> Option<String> {
        match self {
            Self::HighLevelOptimization {
                const_eval,
                const_expr_hoisting,
                numeric_precision_reduction,
            } => Some(format!(
                "const-eval={} const-expr-hoisting={} numeric-precision-reduction={}",
                const_eval, const_expr_hoisting, numeric_precision_reduction
            )),
            Self::SchedulingLowering {
                dump_statistics_format,
                dump_statistics_file,
            } => match (dump_statistics_format, dump_statistics_file) {
                (DumpStatisticsFormat::None, _) => None,
                (format, None) => Some(format!("dump-statistics-format={}", format)),
                (format, Some(file)) => Some(format!(
                    "dump-statistics-format={} dump-statistics-file={}",
                    format,
                    file.display()
                )),
            },
            Self::HardwareAbstraction { targets, .. } => {
                Some(format!("targets={}", targets.join(",")))
            }
            Self::VerifyTransformLegality { op_kind, marker } => {
                Some(format!("op-kind={} marker={}", op_kind, marker))
            }
            Self::VmLowering(bytecode) => Some(format!(
                "index-bits={} f32-extension={} f64-extension={} truncate-unsupported-floats={} optimize-for-stack-size={}",
                bytecode.index_bits,
                bytecode.f32_extension,
                bytecode.f64_extension,
                bytecode.truncate_unsupported_floats,
                bytecode.optimize_for_stack_size
            )),
            _ => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if let Some(options) = self.option_text() {
            write!(f, "{{{}}}", options)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Pipeline stages
// ═══════════════════════════════════════════════════════════════════════════

/// A stage in a pipeline: atomic, or a sub-pipeline scoped to an op kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Pass(StageKind),
    Nested {
        /// Op kind each run of the sub-pipeline is scoped to
        anchor: String,
        stages: Vec<PipelineStage>,
    },
}

impl PipelineStage {
    pub fn nested(anchor: impl Into<String>, stages: Vec<PipelineStage>) -> Self {
        Self::Nested {
            anchor: anchor.into(),
            stages,
        }
    }

    /// Stage name, or `anchor(...)` for a sub-pipeline
    pub fn label(&self) -> String {
        match self {
            Self::Pass(kind) => kind.name().to_string(),
            Self::Nested { anchor, stages } => format!(
                "{}({})",
                anchor,
                stages.iter().map(|s| s.label()).collect::<Vec<_>>().join(",")
            ),
        }
    }

    fn collect_names(&self, out: &mut Vec<&'static str>) {
        match self {
            Self::Pass(kind) => out.push(kind.name()),
            Self::Nested { stages, .. } => {
                for stage in stages {
                    stage.collect_names(out);
                }
            }
        }
    }
}

impl From<StageKind> for PipelineStage {
    fn from(kind: StageKind) -> Self {
        Self::Pass(kind)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass(kind) => write!(f, "{}", kind),
            Self::Nested { anchor, stages } => {
                write!(f, "{}(", anchor)?;
                for (i, stage) in stages.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", stage)?;
                }
                f.write_str(")")
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Stage list
// ═══════════════════════════════════════════════════════════════════════════

/// Ordered, immutable-once-built list of stages
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageList(Vec<PipelineStage>);

impl StageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: impl Into<PipelineStage>) {
        self.0.push(stage.into());
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PipelineStage> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every atomic stage name in execution order, sub-pipelines flattened
    pub fn stage_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for stage in &self.0 {
            stage.collect_names(&mut names);
        }
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stage_names().contains(&name)
    }

    /// Position of `name` in `stage_names()`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.stage_names().iter().position(|n| *n == name)
    }

    /// Textual pipeline, e.g. `common-input-conversion,func.func(tm-tensor-to-linalg-ext)`
    pub fn to_pipeline_string(&self) -> String {
        self.0
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl<'a> IntoIterator for &'a StageList {
    type Item = &'a PipelineStage;
    type IntoIter = std::slice::Iter<'a, PipelineStage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<PipelineStage> for StageList {
    fn from_iter<T: IntoIterator<Item = PipelineStage>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_flatten_nested() {
        let list: StageList = vec![
            PipelineStage::nested(
                "func.func",
                vec![StageKind::TmTensorToLinalgExt.into()],
            ),
            StageKind::CommonInputConversion.into(),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            list.stage_names(),
            vec!["tm-tensor-to-linalg-ext", "common-input-conversion"]
        );
        assert_eq!(list.position("common-input-conversion"), Some(1));
        assert!(!list.contains("vm-lowering"));
    }

    #[test]
    fn test_pipeline_string() {
        let mut list = StageList::new();
        list.push(PipelineStage::nested(
            "func.func",
            vec![StageKind::TmTensorToLinalgExt.into()],
        ));
        list.push(StageKind::CommonInputConversion);
        list.push(StageKind::HardwareAbstraction {
            variant: HalVariant::InlineStatic,
            targets: vec!["llvm-cpu".to_string()],
        });
        list.push(StageKind::DropCompilerHints);

        assert_eq!(
            list.to_pipeline_string(),
            "func.func(tm-tensor-to-linalg-ext),common-input-conversion,\
             hal-inline-static{targets=llvm-cpu},drop-compiler-hints"
        );
    }

    #[test]
    fn test_scheduling_options_only_rendered_when_dumping() {
        let quiet = StageKind::SchedulingLowering {
            dump_statistics_format: DumpStatisticsFormat::None,
            dump_statistics_file: None,
        };
        assert_eq!(quiet.to_string(), "scheduling-lowering");

        let dumping = StageKind::SchedulingLowering {
            dump_statistics_format: DumpStatisticsFormat::Csv,
            dump_statistics_file: Some(PathBuf::from("stats.csv")),
        };
        assert_eq!(
            dumping.to_string(),
            "scheduling-lowering{dump-statistics-format=csv dump-statistics-file=stats.csv}"
        );
    }

    #[test]
    fn test_label() {
        let nested = PipelineStage::nested("func.func", vec![StageKind::TmTensorToLinalgExt.into()]);
        assert_eq!(nested.label(), "func.func(tm-tensor-to-linalg-ext)");
        assert_eq!(
            PipelineStage::Pass(StageKind::VmLowering(BytecodeTargetOptions::default())).label(),
            "vm-lowering"
        );
    }
}
