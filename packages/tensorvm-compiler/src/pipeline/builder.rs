//! Stage list construction
//!
//! Pure function of resolved options and hooks. The order below is fixed:
//!
//! ```text
//! input conversion (by dialect)
//!   → common-input-conversion
//!   → native-bindings? → tflite-bindings?
//!   → high-level-optimization → strip-assertions?
//!   → [scheduling-lowering → hal-* → verify-transform-legality?]   (unless host-only)
//!   → vm-lowering → drop-compiler-hints
//! ```

use super::hooks::PipelineHooks;
use super::stage::{PipelineStage, StageKind, StageList};
use crate::config::{InputDialect, ResolvedOptions};
use crate::shared::constants::FUNC_OP_KIND;

/// Build the ordered stage list for one invocation
///
/// Never touches a program tree; equal inputs give equal lists.
pub fn build_stage_list(options: &ResolvedOptions, hooks: &PipelineHooks) -> StageList {
    let mut stages = StageList::new();

    // 1. Input conversion, exactly one branch
    match options.input_dialect() {
        InputDialect::None => {}
        InputDialect::Mhlo => stages.push(StageKind::MhloInputConversion),
        InputDialect::Xla => {
            stages.push(StageKind::XlaCleanup);
            stages.push(StageKind::MhloInputConversion);
        }
        InputDialect::TmTensor => stages.push(PipelineStage::nested(
            FUNC_OP_KIND,
            vec![StageKind::TmTensorToLinalgExt.into()],
        )),
        InputDialect::Tosa => stages.push(StageKind::TosaInputConversion),
    }

    // 2.
    stages.push(StageKind::CommonInputConversion);

    // 3. Bindings, native first
    let binding = options.binding();
    if binding.native {
        stages.push(StageKind::NativeBindings);
    }
    if binding.tflite {
        stages.push(StageKind::TfliteBindings);
    }

    // 4. High-level optimization (const-eval variant only with a hook)
    let hlo = options.high_level_optimization();
    stages.push(StageKind::HighLevelOptimization {
        const_eval: hlo.const_eval && hooks.has_const_eval(),
        const_expr_hoisting: hlo.const_expr_hoisting,
        numeric_precision_reduction: hlo.numeric_precision_reduction,
    });

    // 5.
    if hlo.strip_assertions {
        stages.push(StageKind::StripAssertions);
    }

    // 6. Scheduling and hardware abstraction
    if let Some(variant) = options.execution_model().hal_variant() {
        let scheduling = options.scheduling();
        stages.push(StageKind::SchedulingLowering {
            dump_statistics_format: scheduling.dump_statistics_format,
            dump_statistics_file: scheduling.dump_statistics_file.clone(),
        });

        let target_backend = options.target_backend();
        stages.push(StageKind::HardwareAbstraction {
            variant,
            targets: target_backend.targets.clone(),
        });

        if target_backend.verify_transform_legality {
            stages.push(StageKind::VerifyTransformLegality {
                op_kind: target_backend.legality_op_kind.clone(),
                marker: target_backend.legality_marker.clone(),
            });
        }
    }

    // 7.
    stages.push(StageKind::VmLowering(options.bytecode_target().clone()));
    stages.push(StageKind::DropCompilerHints);

    tracing::debug!(
        stages = stages.len(),
        pipeline = %stages.to_pipeline_string(),
        "built stage list"
    );
    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExecutionModel, PipelineOptions};
    use crate::pipeline::ConverterRegistry;
    use crate::shared::models::Operation;
    use pretty_assertions::assert_eq;

    fn build(options: PipelineOptions) -> StageList {
        let hooks = PipelineHooks::empty();
        let resolved = options
            .resolve(&hooks, &ConverterRegistry::builtin())
            .unwrap();
        build_stage_list(&resolved, &hooks)
    }

    #[test]
    fn test_default_pipeline() {
        let list = build(PipelineOptions::new());
        assert_eq!(
            list.stage_names(),
            vec![
                "common-input-conversion",
                "native-bindings",
                "high-level-optimization",
                "scheduling-lowering",
                "hal-async",
                "verify-transform-legality",
                "vm-lowering",
                "drop-compiler-hints",
            ]
        );
    }

    #[test]
    fn test_xla_adds_cleanup_before_mhlo() {
        let list = build(PipelineOptions::new().input_dialect(|d| d.dialect(InputDialect::Xla)));
        assert_eq!(
            &list.stage_names()[..3],
            &["xla-cleanup", "mhlo-input-conversion", "common-input-conversion"]
        );
    }

    #[test]
    fn test_tm_tensor_is_nested_on_functions() {
        let list = build(PipelineOptions::new().input_dialect(|d| d.dialect(InputDialect::TmTensor)));
        assert_eq!(
            list.stages()[0],
            PipelineStage::nested("func.func", vec![StageKind::TmTensorToLinalgExt.into()])
        );
        assert!(list
            .to_pipeline_string()
            .starts_with("func.func(tm-tensor-to-linalg-ext),common-input-conversion"));
    }

    #[test]
    fn test_host_only_skips_device_stages() {
        let list = build(
            PipelineOptions::new()
                .scheduling(|s| s.execution_model(ExecutionModel::HostOnly)),
        );
        assert_eq!(
            list.stage_names(),
            vec![
                "common-input-conversion",
                "native-bindings",
                "high-level-optimization",
                "vm-lowering",
                "drop-compiler-hints",
            ]
        );
    }

    #[test]
    fn test_strip_assertions_follows_optimization() {
        let list = build(PipelineOptions::new().high_level_optimization(|h| h.strip_assertions(true)));
        let hlo = list.position("high-level-optimization").unwrap();
        assert_eq!(list.position("strip-assertions"), Some(hlo + 1));
    }

    #[test]
    fn test_legality_gate_can_be_disabled() {
        let list = build(PipelineOptions::new().target_backend(|t| t.verify_transform_legality(false)));
        assert!(!list.contains("verify-transform-legality"));
        assert_eq!(
            list.position("vm-lowering"),
            list.position("hal-async").map(|p| p + 1)
        );
    }

    #[test]
    fn test_const_eval_variant_needs_hook() {
        let hooks = PipelineHooks::empty().with_const_eval(|_: &Operation| None);
        let resolved = PipelineOptions::new()
            .high_level_optimization(|h| h.const_eval(true))
            .resolve(&hooks, &ConverterRegistry::builtin())
            .unwrap();

        let with_hook = build_stage_list(&resolved, &hooks);
        assert!(with_hook
            .to_pipeline_string()
            .contains("high-level-optimization{const-eval=true"));

        // Same options, hook dropped between resolution and build
        let without_hook = build_stage_list(&resolved, &PipelineHooks::empty());
        assert!(without_hook
            .to_pipeline_string()
            .contains("high-level-optimization{const-eval=false"));
    }

    #[test]
    fn test_vm_lowering_carries_bytecode_options() {
        let list = build(PipelineOptions::new().bytecode_target(|b| b.index_bits(64)));
        let last_two: Vec<_> = list.stages()[list.len() - 2..].to_vec();
        let PipelineStage::Pass(StageKind::VmLowering(bytecode)) = &last_two[0] else {
            panic!("expected vm-lowering, got {:?}", last_two[0]);
        };
        assert_eq!(bytecode.index_bits, 64);
        assert_eq!(last_two[1], PipelineStage::Pass(StageKind::DropCompilerHints));
    }
}
