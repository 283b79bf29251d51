//! Distance-based grouping of topology objects.
//!
//! Objects connected through a transitive chain of minimal distances form a
//! group. Each group becomes a `Group` object inserted by cpuset, so it
//! adopts its members, and the distances between groups are factorized into
//! a smaller matrix that is grouped again one level up. The procedure stops
//! when a level yields fewer than two groups.

use std::cmp::Ordering;

use tracing::{Level, debug, enabled, instrument, trace, warn};

use crate::{
    CpuSet, DistanceError, DistanceStore, Insertion, NewObject, ObjId, ObjType, Topology,
    error::Diagnostic, store::write_table,
};

/// Group membership computed for one level.
///
/// `ids[i]` is the 1-based group of position `i`, or 0 when the position
/// joined no group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupAssignment {
    count: usize,
    ids: Vec<u32>,
}

impl GroupAssignment {
    fn ungrouped(nbobjs: usize) -> Self {
        Self {
            count: 0,
            ids: vec![0; nbobjs],
        }
    }

    /// Number of groups found.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Per-position group ids.
    #[must_use]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Positions belonging to the 1-based group `id`.
    pub fn members(&self, id: u32) -> impl Iterator<Item = usize> + '_ {
        self.ids
            .iter()
            .enumerate()
            .filter(move |&(_, &group)| group == id)
            .map(|(position, _)| position)
    }
}

/// Outcome of one grouping level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupingLevel {
    /// Recursion level, starting at 0 for the objects of the matrix.
    pub level: u32,
    /// Number of objects grouped at this level.
    pub nbobjs: usize,
    /// Number of groups found.
    pub groups: usize,
    /// Group objects added to the tree. Groups absorbed by an existing object
    /// with the same cpuset do not appear here.
    pub created: Vec<ObjId>,
}

/// Checks that `distances` is symmetric and that every diagonal entry is
/// strictly smaller than the rest of its row.
///
/// # Errors
/// Returns [`DistanceError::Asymmetric`] or
/// [`DistanceError::DiagonalNotMinimal`] for the first offending cell.
///
/// # Examples
/// ```
/// use topodist_core::grouping::validate_matrix;
///
/// assert!(validate_matrix(2, &[1.0, 2.0, 2.0, 1.0]).is_ok());
/// assert!(validate_matrix(2, &[1.0, 2.0, 3.0, 1.0]).is_err());
/// ```
pub fn validate_matrix(nbobjs: usize, distances: &[f32]) -> Result<(), DistanceError> {
    let at = |i: usize, j: usize| distances[i * nbobjs + j];
    for row in 0..nbobjs {
        let diagonal = at(row, row);
        for col in (0..nbobjs).filter(|&col| col != row) {
            if col > row && at(row, col) != at(col, row) {
                return Err(DistanceError::Asymmetric {
                    row,
                    col,
                    forward: at(row, col),
                    backward: at(col, row),
                });
            }
            // Unordered values, NaN included, fail the check.
            let value = at(row, col);
            if diagonal.partial_cmp(&value) != Some(Ordering::Less) {
                return Err(DistanceError::DiagonalNotMinimal {
                    row,
                    col,
                    diagonal,
                    value,
                });
            }
        }
    }
    Ok(())
}

/// Splits positions into groups connected by chains of the minimal
/// off-diagonal distance.
///
/// Matrices with at most two objects are never grouped. A position with no
/// minimal link stays ungrouped without consuming a group id.
///
/// # Examples
/// ```
/// use topodist_core::grouping::compute_min_distance_groups;
///
/// let matrix = [
///     0.0, 10.0, 20.0, 20.0,
///     10.0, 0.0, 20.0, 20.0,
///     20.0, 20.0, 0.0, 10.0,
///     20.0, 20.0, 10.0, 0.0,
/// ];
/// let groups = compute_min_distance_groups(4, &matrix);
/// assert_eq!(groups.count(), 2);
/// assert_eq!(groups.ids(), &[1, 1, 2, 2]);
/// ```
#[must_use]
pub fn compute_min_distance_groups(nbobjs: usize, distances: &[f32]) -> GroupAssignment {
    let mut assignment = GroupAssignment::ungrouped(nbobjs);
    if nbobjs <= 2 {
        return assignment;
    }
    let at = |i: usize, j: usize| distances[i * nbobjs + j];
    let Some(min_distance) = (0..nbobjs)
        .flat_map(|i| (i + 1..nbobjs).map(move |j| (i, j)))
        .map(|(i, j)| at(i, j))
        .reduce(f32::min)
    else {
        return assignment;
    };
    debug!(min_distance, "found minimal distance between objects");

    let ids = &mut assignment.ids;
    let mut next_id = 1_u32;
    for seed in 0..nbobjs {
        if ids[seed] != 0 {
            continue;
        }
        ids[seed] = next_id;
        let mut size = 1_usize;
        let mut frontier = vec![seed];
        while let Some(member) = frontier.pop() {
            for other in 0..nbobjs {
                if ids[other] == 0 && at(member, other) == min_distance {
                    trace!(object = other, through = member, seed, "minimally connected");
                    ids[other] = next_id;
                    size += 1;
                    frontier.push(other);
                }
            }
        }
        if size == 1 {
            ids[seed] = 0;
            continue;
        }
        debug!(size, min_distance, "found transitive group");
        next_id += 1;
    }
    assignment.count = (next_id - 1) as usize;
    assignment
}

/// Averages `distances` over every pair of groups of `assignment`.
///
/// Ungrouped positions contribute to no cell.
fn factorize(nbobjs: usize, distances: &[f32], assignment: &GroupAssignment) -> Vec<f32> {
    let count = assignment.count;
    let mut sums = vec![0.0_f32; count * count];
    let mut sizes = vec![0_u32; count];
    let members = move || {
        assignment
            .ids
            .iter()
            .enumerate()
            .filter(|&(_, &group)| group != 0)
            .map(|(position, &group)| (position, group as usize - 1))
    };
    for (i, gi) in members() {
        sizes[gi] += 1;
        for (j, gj) in members() {
            sums[gi * count + gj] += distances[i * nbobjs + j];
        }
    }
    for (cell, sum) in sums.iter_mut().enumerate() {
        *sum /= (sizes[cell / count] * sizes[cell % count]) as f32;
    }
    sums
}

fn matrix_table(labels: &[u32], distances: &[f32]) -> String {
    let mut table = String::new();
    // Writing into a String cannot fail.
    let _ = write_table(&mut table, labels, distances);
    table
}

/// Groups `objs` level by level until a level yields fewer than two groups.
///
/// Levels are appended to `levels` as they complete; a level interrupted by
/// an insertion failure is appended with the groups created before it.
///
/// # Errors
/// Returns [`DistanceError::GroupInsertion`] when the tree refuses a group.
/// Groups inserted before the failure stay in the tree.
pub fn group_objects(
    topology: &mut Topology,
    objs: &[ObjId],
    distances: &[f32],
    levels: &mut Vec<GroupingLevel>,
) -> Result<(), DistanceError> {
    let mut objs = objs.to_vec();
    let mut distances = distances.to_vec();
    let mut level = 0_u32;
    // Every productive level at least halves the object count.
    while objs.len() > 2 {
        let nbobjs = objs.len();
        let assignment = compute_min_distance_groups(nbobjs, &distances);
        if assignment.count < 2 {
            debug!(level, groups = assignment.count, "no further grouping");
            return Ok(());
        }
        let mut record = GroupingLevel {
            level,
            nbobjs,
            groups: assignment.count,
            created: Vec::new(),
        };

        let mut next_objs = Vec::with_capacity(assignment.count);
        for id in 1..=assignment.count as u32 {
            let mut cpuset = CpuSet::new();
            for member in assignment.members(id) {
                cpuset.union_with(topology.object(objs[member]).cpuset());
            }
            debug!(level, group = id, cpuset = %cpuset, "adding group object");
            match topology.insert_by_cpuset(NewObject::group(cpuset, level)) {
                Ok(Insertion::Created(group)) => {
                    record.created.push(group);
                    next_objs.push(group);
                }
                Ok(Insertion::Merged(existing)) => {
                    debug!(level, object = %existing, "group absorbed by existing object");
                    next_objs.push(existing);
                }
                Err(source) => {
                    levels.push(record);
                    return Err(DistanceError::GroupInsertion { level, source });
                }
            }
        }
        levels.push(record);

        distances = factorize(nbobjs, &distances, &assignment);
        if enabled!(Level::TRACE) {
            let labels: Vec<u32> = (0..assignment.count as u32).collect();
            trace!(
                level,
                "distances between groups:\n{}",
                matrix_table(&labels, &distances)
            );
        }
        objs = next_objs;
        level += 1;
    }
    Ok(())
}

/// Groups the objects of every resolved matrix in `store`.
///
/// Does nothing when `enabled` is false. Matrices failing validation are
/// skipped with a warning and reported as diagnostics.
#[instrument(name = "distances.group", skip_all, fields(enabled = enabled))]
pub fn group_by_distances(
    store: &DistanceStore,
    topology: &mut Topology,
    enabled: bool,
) -> (Vec<GroupingLevel>, Vec<Diagnostic>) {
    let mut levels = Vec::new();
    let mut diagnostics = Vec::new();
    if !enabled {
        debug!("grouping by distances is disabled");
        return (levels, diagnostics);
    }
    for (obj_type, matrix) in store.iter() {
        let Some(objs) = matrix.objs() else {
            continue;
        };
        if enabled!(Level::TRACE) {
            trace!(
                obj_type = %obj_type,
                "trying to group objects using distance matrix:\n{}",
                matrix_table(matrix.indexes(), matrix.distances())
            );
        }
        let outcome = validate_matrix(matrix.nbobjs(), matrix.distances())
            .and_then(|()| group_objects(topology, objs, matrix.distances(), &mut levels));
        if let Err(error) = outcome {
            report(&mut diagnostics, obj_type, error);
        }
    }
    (levels, diagnostics)
}

fn report(diagnostics: &mut Vec<Diagnostic>, obj_type: ObjType, error: DistanceError) {
    warn!(obj_type = %obj_type, code = %error.code(), %error, "ignoring distances for grouping");
    diagnostics.push(Diagnostic::new(obj_type, error));
}

#[cfg(test)]
mod properties;
