//! Distance-based grouping benchmarks.
//!
//! `min_distance_groups` isolates one clustering step over a hierarchical
//! matrix. `load_pass` measures a full load of a stored matrix, from index
//! resolution through every grouping level to normalization.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use topodist_benches::{
    error::BenchSetupError,
    params::GroupingBenchParams,
    source::{HierarchicalConfig, HierarchicalMatrix},
};
use topodist_core::{Distances, ObjType, Topology, grouping::compute_min_distance_groups};

/// Seed used for every row shuffle in this benchmark.
const SEED: u64 = 42;

/// Block shapes to benchmark, outermost level first.
const SHAPES: &[&[usize]] = &[&[4, 4], &[4, 8], &[2, 4, 8], &[4, 4, 4, 4]];

fn generate(
    arities: &[usize],
) -> Result<(GroupingBenchParams, HierarchicalMatrix), BenchSetupError> {
    let matrix = HierarchicalMatrix::generate(&HierarchicalConfig {
        arities: arities.to_vec(),
        seed: SEED,
    })?;
    let params = GroupingBenchParams {
        arities: arities.to_vec(),
    };
    Ok((params, matrix))
}

fn min_distance_groups_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("min_distance_groups");

    for &shape in SHAPES {
        let (params, matrix) = generate(shape)?;
        group.bench_with_input(
            BenchmarkId::from_parameter(&params),
            &matrix,
            |b, matrix| {
                b.iter(|| compute_min_distance_groups(matrix.nbobjs(), matrix.values()));
            },
        );
    }

    group.finish();
    Ok(())
}

fn load_pass_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("load_pass");
    group.sample_size(30);

    for &shape in SHAPES {
        let (params, matrix) = generate(shape)?;
        let topology = Topology::synthetic(&matrix.synthetic())?;
        let mut distances = Distances::init();
        distances.set_matrix(ObjType::NumaNode, matrix.indexes(), matrix.values())?;

        group.bench_with_input(
            BenchmarkId::from_parameter(&params),
            &(topology, distances),
            |b, (topology, distances)| {
                b.iter_batched(
                    || (topology.clone(), distances.clone()),
                    |(mut topology, mut distances)| distances.load(&mut topology),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
    Ok(())
}

fn min_distance_groups(c: &mut Criterion) {
    if let Err(err) = min_distance_groups_impl(c) {
        panic!("min_distance_groups benchmark setup failed: {err}");
    }
}

fn load_pass(c: &mut Criterion) {
    if let Err(err) = load_pass_impl(c) {
        panic!("load_pass benchmark setup failed: {err}");
    }
}

criterion_group!(benches, min_distance_groups, load_pass);
criterion_main!(benches);
