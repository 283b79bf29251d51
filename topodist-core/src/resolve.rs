//! Binding of raw matrix indexes to tree objects.

use tracing::{debug, instrument, warn};

use crate::{DistanceError, DistanceStore, ObjId, ObjType, Topology, error::Diagnostic};

/// Looks up the object of `obj_type` for every raw index, in matrix order.
///
/// # Errors
/// Returns [`DistanceError::UnresolvedIndex`] naming the first index with no
/// matching object.
pub fn resolve_indexes(
    topology: &Topology,
    obj_type: ObjType,
    indexes: &[u32],
) -> Result<Vec<ObjId>, DistanceError> {
    indexes
        .iter()
        .map(|&index| {
            topology
                .find_by_type_and_os_index(obj_type, index)
                .ok_or(DistanceError::UnresolvedIndex { index })
        })
        .collect()
}

/// Resolves every stored matrix against `topology`.
///
/// A matrix with an unknown index is left unresolved, which excludes it from
/// grouping and normalization for this load, and reported as a
/// [`Diagnostic`]. Its raw data stays in the store.
#[instrument(name = "distances.resolve", skip_all, fields(objects = topology.len()))]
pub fn resolve_all(store: &mut DistanceStore, topology: &Topology) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for obj_type in ObjType::ALL {
        let Some(matrix) = store.get_mut(obj_type) else {
            continue;
        };
        match resolve_indexes(topology, obj_type, matrix.indexes()) {
            Ok(objs) => {
                debug!(obj_type = %obj_type, nbobjs = objs.len(), "resolved distance matrix");
                matrix.set_objs(Some(objs));
            }
            Err(error) => {
                warn!(obj_type = %obj_type, code = %error.code(), %error, "ignoring distances");
                matrix.set_objs(None);
                diagnostics.push(Diagnostic::new(obj_type, error));
            }
        }
    }
    diagnostics
}
