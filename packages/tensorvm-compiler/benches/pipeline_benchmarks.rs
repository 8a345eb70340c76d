//! Performance benchmarks for the lowering pipeline
//!
//! Targets:
//! - Option resolution + stage list construction: < 10μs
//! - Legality walk: linear in op count
//! - Full run with builtin passes on a 10k-op tree: < 5ms

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tensorvm_compiler::config::*;
use tensorvm_compiler::features::legality;
use tensorvm_compiler::pipeline::*;
use tensorvm_compiler::shared::constants::{DEFAULT_LEGALITY_MARKER, DEFAULT_LEGALITY_OP_KIND};
use tensorvm_compiler::shared::models::{Operation, ProgramTree, Region};

/// `functions` functions, each holding `body` ops (every fourth one a
/// `linalg.generic` nested under an `scf.for`)
fn synthetic_tree(functions: usize, body: usize) -> ProgramTree {
    let funcs = (0..functions)
        .map(|f| {
            let ops = (0..body)
                .map(|i| {
                    if i % 4 == 0 {
                        Operation::new("scf.for").with_region(Region::single_block(vec![
                            Operation::new(DEFAULT_LEGALITY_OP_KIND).with_attr("hint.vectorize", true),
                        ]))
                    } else {
                        Operation::new("arith.addi")
                    }
                })
                .collect();
            Operation::new("func.func")
                .with_attr("sym_name", format!("f{}", f))
                .with_region(Region::single_block(ops))
        })
        .collect();
    ProgramTree::from_operations(vec![
        Operation::new("builtin.module").with_region(Region::single_block(funcs))
    ])
}

// ============================================================================
// Construction
// ============================================================================

fn bench_stage_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_list");
    let hooks = PipelineHooks::empty();
    let converters = ConverterRegistry::builtin();

    for model in ExecutionModel::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(model), model, |b, &model| {
            b.iter(|| {
                let resolved = PipelineOptions::new()
                    .input_dialect(|d| d.dialect(InputDialect::TmTensor))
                    .scheduling(|s| s.execution_model(model))
                    .resolve(&hooks, &converters)
                    .unwrap();
                black_box(build_stage_list(&resolved, &hooks))
            });
        });
    }

    group.finish();
}

fn bench_yaml_options(c: &mut Criterion) {
    let yaml = PipelineOptions::new()
        .input_dialect(|d| d.dialect(InputDialect::Mhlo))
        .scheduling(|s| s.execution_model(ExecutionModel::InlineDynamic))
        .to_yaml()
        .unwrap();

    c.bench_function("yaml_options", |b| {
        b.iter(|| black_box(PipelineOptions::from_yaml_str(black_box(&yaml), "<bench>").unwrap()))
    });
}

// ============================================================================
// Execution
// ============================================================================

fn bench_legality_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("legality_walk");

    for functions in [10, 100, 1000] {
        let tree = synthetic_tree(functions, 16);
        group.throughput(Throughput::Elements(tree.op_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(functions), &tree, |b, tree| {
            b.iter(|| {
                black_box(legality::verify(
                    tree,
                    DEFAULT_LEGALITY_OP_KIND,
                    DEFAULT_LEGALITY_MARKER,
                ))
            });
        });
    }

    group.finish();
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    let hooks = PipelineHooks::empty();

    for dialect in [InputDialect::None, InputDialect::TmTensor] {
        let resolved = PipelineOptions::new()
            .input_dialect(|d| d.dialect(dialect))
            .high_level_optimization(|h| h.strip_assertions(true))
            .resolve(&hooks, &ConverterRegistry::builtin())
            .unwrap();
        let stages = build_stage_list(&resolved, &hooks);
        let executor = PipelineExecutor::new(hooks.clone());
        let tree = synthetic_tree(100, 100);

        group.throughput(Throughput::Elements(tree.op_count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(dialect), &tree, |b, tree| {
            b.iter_batched(
                || tree.clone(),
                |mut tree| black_box(executor.run(&stages, &mut tree).unwrap()),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_stage_list,
    bench_yaml_options,
    bench_legality_walk,
    bench_full_run
);
criterion_main!(benches);
