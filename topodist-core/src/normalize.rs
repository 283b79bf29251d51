//! Conversion of raw matrices into logically-ordered latency matrices.
//!
//! A normalized matrix is attached to the object whose cpuset is exactly
//! the union of the matrix objects, divided by the smallest raw value and
//! reindexed by logical index so callers can address it with the tree's
//! canonical ordering.

use tracing::{debug, instrument, warn};

use crate::{
    CpuSet, DistanceError, DistanceStore, ObjId, ObjType, Topology,
    error::Diagnostic, topology::TypeDepth,
};

/// Latency matrix between objects of one level, owned by the object covering
/// them.
///
/// Entry `(i, j)` is the latency from the object at logical offset `i` to
/// the object at logical offset `j`, where offsets count from the smallest
/// logical index among the matrix objects.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedDistances {
    relative_depth: u32,
    nbobjs: usize,
    latency: Vec<f32>,
    latency_base: f32,
    latency_max: f32,
}

impl NormalizedDistances {
    /// Levels between the owner and the matrix objects.
    #[must_use]
    pub fn relative_depth(&self) -> u32 {
        self.relative_depth
    }

    /// Number of objects covered by the matrix.
    #[must_use]
    pub fn nbobjs(&self) -> usize {
        self.nbobjs
    }

    /// Row-major normalized latencies.
    #[must_use]
    pub fn latencies(&self) -> &[f32] {
        &self.latency
    }

    /// Normalized latency between logical offsets `i` and `j`.
    #[must_use]
    pub fn latency(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.nbobjs || j >= self.nbobjs {
            return None;
        }
        self.latency.get(i * self.nbobjs + j).copied()
    }

    /// Raw value every latency was divided by.
    #[must_use]
    pub fn latency_base(&self) -> f32 {
        self.latency_base
    }

    /// Largest normalized latency.
    #[must_use]
    pub fn latency_max(&self) -> f32 {
        self.latency_max
    }
}

/// Normalizes `raw`, whose rows follow `objs`, and attaches the result to
/// the object covering exactly the union of `objs`.
///
/// Returns `Ok(None)` without touching the tree when no object covers
/// exactly that union; no intermediate object is created for partial
/// matrices.
///
/// # Errors
/// Returns [`DistanceError::ZeroLatency`] when the smallest raw value is
/// zero. A zero is taken as a sign the values are hop counts rather than
/// latencies; this is a heuristic, not a proof.
///
/// # Panics
/// Panics when `raw` has fewer than `objs.len()²` values or `objs` holds
/// handles foreign to `topology`.
pub fn normalize(
    topology: &mut Topology,
    objs: &[ObjId],
    raw: &[f32],
) -> Result<Option<ObjId>, DistanceError> {
    let Some(&first) = objs.first() else {
        return Ok(None);
    };
    let mut union = CpuSet::new();
    for &id in objs {
        union.union_with(topology.object(id).cpuset());
    }
    let Some(root) = topology.covering_object(&union) else {
        debug!(cpuset = %union, "no object covers the matrix objects");
        return Ok(None);
    };
    if *topology.object(root).cpuset() != union {
        debug!(
            cpuset = %union,
            covering = %topology.object(root).cpuset(),
            "matrix does not cover all children of a single object"
        );
        return Ok(None);
    }
    let relative_depth = topology
        .object(first)
        .depth()
        .saturating_sub(topology.object(root).depth());

    let nbobjs = objs.len();
    let raw = &raw[..nbobjs * nbobjs];
    let (min, max) = raw
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &value| {
            (min.min(value), max.max(value))
        });
    if min == 0.0 {
        return Err(DistanceError::ZeroLatency);
    }

    let min_logical = objs
        .iter()
        .map(|&id| topology.object(id).logical_index())
        .min()
        .unwrap_or(0);
    let offsets: Vec<usize> = objs
        .iter()
        .map(|&id| (topology.object(id).logical_index() - min_logical) as usize)
        .collect();

    let mut latency = vec![0.0; nbobjs * nbobjs];
    for (i, &li) in offsets.iter().enumerate() {
        for (j, &lj) in offsets.iter().enumerate() {
            latency[li * nbobjs + lj] = raw[i * nbobjs + j] / min;
        }
    }

    topology.attach_distances(
        root,
        NormalizedDistances {
            relative_depth,
            nbobjs,
            latency,
            latency_base: min,
            latency_max: max / min,
        },
    );
    Ok(Some(root))
}

/// Normalizes every resolved matrix of `store` into `topology`.
///
/// Types that do not sit at a single depth are skipped. Returns the owners
/// that received a matrix and the diagnostics of rejected matrices.
#[instrument(name = "distances.finalize_logical", skip_all)]
pub fn finalize_logical_distances(
    store: &DistanceStore,
    topology: &mut Topology,
) -> (Vec<(ObjType, ObjId)>, Vec<Diagnostic>) {
    let mut attached = Vec::new();
    let mut diagnostics = Vec::new();
    for (obj_type, matrix) in store.iter() {
        match topology.type_depth(obj_type) {
            TypeDepth::Depth(_) => {}
            depth => {
                debug!(obj_type = %obj_type, ?depth, "skipping normalization");
                continue;
            }
        }
        let Some(objs) = matrix.objs() else {
            continue;
        };
        match normalize(topology, objs, matrix.distances()) {
            Ok(Some(owner)) => attached.push((obj_type, owner)),
            Ok(None) => {}
            Err(error) => {
                warn!(obj_type = %obj_type, code = %error.code(), %error, "ignoring distances for normalization");
                diagnostics.push(Diagnostic::new(obj_type, error));
            }
        }
    }
    (attached, diagnostics)
}
