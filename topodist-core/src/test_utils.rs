//! Shared test utilities for `topodist-core`.

use proptest::test_runner::Config as ProptestConfig;
use topodist_test_support::proptest_profile::ProptestRunProfile;

use crate::{ObjId, ObjType, Topology};

/// Builds a standard proptest configuration from the shared run profile.
///
/// This keeps property suites aligned on the same `TOPODIST_PBT_CASES` and
/// `TOPODIST_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Machine with `nodes` NUMA nodes of two single-PU cores each, so node `k`
/// covers PUs `2k` and `2k + 1`.
#[must_use]
pub(crate) fn numa_topology(nodes: usize) -> Topology {
    Topology::synthetic(&format!("numanode:{nodes} core:2 pu:1"))
        .expect("synthetic description is valid")
}

/// NUMA nodes of `topology` with the given OS indexes, in order.
#[must_use]
pub(crate) fn resolve_numa_nodes(topology: &Topology, indexes: &[u32]) -> Vec<ObjId> {
    indexes
        .iter()
        .map(|&index| {
            topology
                .find_by_type_and_os_index(ObjType::NumaNode, index)
                .expect("node exists")
        })
        .collect()
}

/// Row-major `nbobjs × nbobjs` matrix whose cell `(i, j)` is
/// `value(min(i, j), max(i, j))`, symmetric by construction.
#[must_use]
pub(crate) fn symmetric_matrix(nbobjs: usize, value: impl Fn(usize, usize) -> f32) -> Vec<f32> {
    (0..nbobjs)
        .flat_map(|i| (0..nbobjs).map(move |j| (i, j)))
        .map(|(i, j)| value(i.min(j), i.max(j)))
        .collect()
}
