//! Property-based tests for distance-based grouping.
//!
//! Generates symmetric matrices with a zero diagonal over NUMA nodes of a
//! synthetic tree and checks that every level shrinks the object count, that
//! synthesized groups cover exactly their members, and that a second pass
//! over the enriched tree creates nothing new.

use proptest::prelude::*;
use test_strategy::Arbitrary;

use super::*;
use crate::test_utils::{numa_topology, suite_proptest_config, symmetric_matrix};

/// How off-diagonal distances are drawn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Arbitrary)]
enum MatrixShape {
    /// Independent values from a small range, so ties are frequent.
    #[weight(3)]
    Noisy,
    /// Blocks of consecutive nodes closer to each other than to the rest.
    #[weight(3)]
    Blocks,
    /// Every pair at the same distance.
    #[weight(1)]
    Uniform,
}

#[derive(Clone, Debug)]
struct GroupingFixture {
    nbobjs: usize,
    distances: Vec<f32>,
}

fn build_matrix(shape: MatrixShape, nbobjs: usize, block: usize, noise: &[u8]) -> Vec<f32> {
    symmetric_matrix(nbobjs, |i, j| {
        if i == j {
            return 0.0;
        }
        match shape {
            MatrixShape::Noisy => f32::from(noise[i * nbobjs + j]),
            MatrixShape::Blocks if i / block == j / block => 1.0,
            MatrixShape::Blocks => f32::from(2 + noise[i * nbobjs + j] % 2),
            MatrixShape::Uniform => 5.0,
        }
    })
}

fn fixture_strategy() -> impl Strategy<Value = GroupingFixture> {
    (3_usize..=12, any::<MatrixShape>(), 2_usize..=4).prop_flat_map(|(nbobjs, shape, block)| {
        prop::collection::vec(1_u8..=4, nbobjs * nbobjs).prop_map(move |noise| GroupingFixture {
            nbobjs,
            distances: build_matrix(shape, nbobjs, block, &noise),
        })
    })
}

fn run_grouping_invariants(fixture: &GroupingFixture) -> Result<(), TestCaseError> {
    let mut topology = numa_topology(fixture.nbobjs);
    let objs = topology.objects_of_type(ObjType::NumaNode);
    let pus = topology.objects_of_type(ObjType::Pu).len();
    let before = topology.len();
    prop_assert!(validate_matrix(fixture.nbobjs, &fixture.distances).is_ok());

    let mut levels = Vec::new();
    group_objects(&mut topology, &objs, &fixture.distances, &mut levels)
        .map_err(|err| TestCaseError::fail(format!("grouping failed: {err}")))?;

    let mut expected_nbobjs = fixture.nbobjs;
    for (rank, level) in levels.iter().enumerate() {
        prop_assert_eq!(level.level as usize, rank);
        prop_assert_eq!(level.nbobjs, expected_nbobjs);
        prop_assert!(level.groups >= 2);
        prop_assert!(level.groups * 2 <= level.nbobjs);
        for &group in &level.created {
            let object = topology.object(group);
            prop_assert_eq!(object.obj_type(), ObjType::Group);
            prop_assert_eq!(object.group_depth(), Some(level.level));
            let mut union = CpuSet::new();
            for &child in object.children() {
                union.union_with(topology.object(child).cpuset());
            }
            prop_assert_eq!(&union, object.cpuset());
        }
        expected_nbobjs = level.groups;
    }
    let created: usize = levels.iter().map(|level| level.created.len()).sum();
    prop_assert_eq!(topology.len(), before + created);
    prop_assert_eq!(topology.objects_of_type(ObjType::Pu).len(), pus);

    let mut again = Vec::new();
    group_objects(&mut topology, &objs, &fixture.distances, &mut again)
        .map_err(|err| TestCaseError::fail(format!("regrouping failed: {err}")))?;
    prop_assert_eq!(again.len(), levels.len());
    prop_assert!(again.iter().all(|level| level.created.is_empty()));
    prop_assert_eq!(topology.len(), before + created);
    Ok(())
}

proptest! {
    #![proptest_config(suite_proptest_config(128))]

    #[test]
    fn grouping_shrinks_levels_and_is_stable(fixture in fixture_strategy()) {
        run_grouping_invariants(&fixture)?;
    }
}
