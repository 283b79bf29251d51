//! Per-type storage of raw distance matrices.
//!
//! The store keeps at most one matrix per [`ObjType`]. Raw indexes and
//! distances survive topology reloads; only the resolved objects are
//! dropped by [`DistanceStore::clear_resolved`].

use std::fmt;

use tracing::debug;

use crate::{DistanceError, ObjId, ObjType};

/// Raw distance matrix between objects of one type.
///
/// # Examples
/// ```
/// use topodist_core::DistanceMatrix;
///
/// let matrix = DistanceMatrix::new(vec![0, 1], vec![10.0, 20.0, 20.0, 10.0])?;
/// assert_eq!(matrix.nbobjs(), 2);
/// assert_eq!(matrix.get(0, 1), 20.0);
/// assert!(matrix.objs().is_none());
/// # Ok::<(), topodist_core::DistanceError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    indexes: Vec<u32>,
    distances: Vec<f32>,
    objs: Option<Vec<ObjId>>,
}

impl DistanceMatrix {
    /// Validates and wraps an index list and its row-major matrix.
    ///
    /// # Errors
    /// Returns [`DistanceError::EmptyMatrix`] when `indexes` is empty,
    /// [`DistanceError::LengthMismatch`] when `distances` does not hold
    /// `indexes.len()²` values, [`DistanceError::DuplicateIndex`] when an
    /// index repeats, and [`DistanceError::InvalidDistance`] for a negative
    /// or non-finite value.
    pub fn new(indexes: Vec<u32>, distances: Vec<f32>) -> Result<Self, DistanceError> {
        let nbobjs = indexes.len();
        if nbobjs == 0 {
            return Err(DistanceError::EmptyMatrix);
        }
        let expected = nbobjs * nbobjs;
        if distances.len() != expected {
            return Err(DistanceError::LengthMismatch {
                expected,
                got: distances.len(),
            });
        }
        for (position, index) in indexes.iter().enumerate() {
            if indexes[position + 1..].contains(index) {
                return Err(DistanceError::DuplicateIndex { index: *index });
            }
        }
        if let Some((position, &value)) = distances
            .iter()
            .enumerate()
            .find(|&(_, &value)| !value.is_finite() || value < 0.0)
        {
            return Err(DistanceError::InvalidDistance { position, value });
        }
        Ok(Self {
            indexes,
            distances,
            objs: None,
        })
    }

    /// Number of objects covered by the matrix.
    #[must_use]
    pub fn nbobjs(&self) -> usize {
        self.indexes.len()
    }

    /// Raw indexes, in matrix order.
    #[must_use]
    pub fn indexes(&self) -> &[u32] {
        &self.indexes
    }

    /// Row-major distance values.
    #[must_use]
    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    /// Distance from object `i` to object `j`.
    ///
    /// # Panics
    /// Panics when `i` or `j` is not below [`Self::nbobjs`].
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.distances[i * self.nbobjs() + j]
    }

    /// Tree objects matching [`Self::indexes`], once resolved.
    #[must_use]
    pub fn objs(&self) -> Option<&[ObjId]> {
        self.objs.as_deref()
    }

    pub(crate) fn set_objs(&mut self, objs: Option<Vec<ObjId>>) {
        debug_assert!(objs.as_ref().is_none_or(|o| o.len() == self.nbobjs()));
        self.objs = objs;
    }
}

/// Renders the matrix as an aligned table for trace logs.
impl fmt::Display for DistanceMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_table(f, &self.indexes, &self.distances)
    }
}

pub(crate) fn write_table(
    f: &mut impl fmt::Write,
    labels: &[u32],
    values: &[f32],
) -> fmt::Result {
    write!(f, "  index")?;
    for label in labels {
        write!(f, " {label:>5}")?;
    }
    for (row, label) in labels.iter().enumerate() {
        write!(f, "\n  {label:>5}")?;
        for value in &values[row * labels.len()..(row + 1) * labels.len()] {
            write!(f, " {value:>5.3}")?;
        }
    }
    Ok(())
}

/// Per-type distance matrices, owned across the topology's lifetime.
///
/// # Examples
/// ```
/// use topodist_core::{DistanceError, DistanceStore, ObjType};
///
/// let mut store = DistanceStore::new();
/// store.set_matrix(ObjType::NumaNode, &[0, 1], &[10.0, 20.0, 20.0, 10.0])?;
/// let err = store
///     .set_matrix(ObjType::NumaNode, &[3, 3], &[1.0; 4])
///     .expect_err("duplicates are rejected");
/// assert!(matches!(err, DistanceError::DuplicateIndex { index: 3 }));
/// assert_eq!(store.get(ObjType::NumaNode).map(|m| m.indexes()), Some(&[0, 1][..]));
/// # Ok::<(), DistanceError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct DistanceStore {
    slots: [Option<DistanceMatrix>; ObjType::COUNT],
}

impl DistanceStore {
    /// Creates a store with every per-type slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a copy of `indexes` and `distances` for `obj_type`.
    ///
    /// The caller keeps ownership of its buffers.
    ///
    /// # Errors
    /// See [`Self::set_matrix_owned`].
    pub fn set_matrix(
        &mut self,
        obj_type: ObjType,
        indexes: &[u32],
        distances: &[f32],
    ) -> Result<(), DistanceError> {
        self.set_matrix_owned(obj_type, indexes.to_vec(), distances.to_vec())
    }

    /// Takes ownership of `indexes` and `distances` and stores them for
    /// `obj_type`, replacing any previous matrix as a whole.
    ///
    /// On failure the buffers are dropped and the previous matrix is kept.
    ///
    /// # Errors
    /// Returns the [`DistanceError`] produced by [`DistanceMatrix::new`].
    pub fn set_matrix_owned(
        &mut self,
        obj_type: ObjType,
        indexes: Vec<u32>,
        distances: Vec<f32>,
    ) -> Result<(), DistanceError> {
        let matrix = DistanceMatrix::new(indexes, distances)?;
        debug!(obj_type = %obj_type, nbobjs = matrix.nbobjs(), "stored distance matrix");
        self.slots[obj_type.slot()] = Some(matrix);
        Ok(())
    }

    /// Matrix stored for `obj_type`.
    #[must_use]
    pub fn get(&self, obj_type: ObjType) -> Option<&DistanceMatrix> {
        self.slots[obj_type.slot()].as_ref()
    }

    pub(crate) fn get_mut(&mut self, obj_type: ObjType) -> Option<&mut DistanceMatrix> {
        self.slots[obj_type.slot()].as_mut()
    }

    /// Stored matrices in type order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjType, &DistanceMatrix)> {
        ObjType::ALL
            .into_iter()
            .zip(&self.slots)
            .filter_map(|(obj_type, slot)| slot.as_ref().map(|matrix| (obj_type, matrix)))
    }

    /// Returns whether no matrix is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Drops the resolved objects of every matrix, keeping raw indexes and
    /// distances so the next load resolves them again.
    pub fn clear_resolved(&mut self) {
        for matrix in self.slots.iter_mut().flatten() {
            matrix.set_objs(None);
        }
    }

    /// Drops every stored matrix.
    pub fn destroy_all(&mut self) {
        self.slots = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> DistanceStore {
        let mut store = DistanceStore::new();
        store
            .set_matrix(ObjType::NumaNode, &[0, 1], &[10.0, 20.0, 20.0, 10.0])
            .expect("valid matrix");
        store
    }

    #[rstest]
    fn new_store_is_empty() {
        let store = DistanceStore::new();
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
    }

    #[rstest]
    #[case::duplicate(vec![4, 5, 4], vec![1.0; 9], DistanceError::DuplicateIndex { index: 4 })]
    #[case::short(vec![4, 5], vec![1.0; 3], DistanceError::LengthMismatch { expected: 4, got: 3 })]
    #[case::empty(vec![], vec![], DistanceError::EmptyMatrix)]
    #[case::negative(
        vec![4, 5],
        vec![1.0, -2.0, 2.0, 1.0],
        DistanceError::InvalidDistance { position: 1, value: -2.0 }
    )]
    #[case::infinite(
        vec![4, 5],
        vec![1.0, 2.0, f32::INFINITY, 1.0],
        DistanceError::InvalidDistance { position: 2, value: f32::INFINITY }
    )]
    fn rejected_input_keeps_previous_matrix(
        mut store: DistanceStore,
        #[case] indexes: Vec<u32>,
        #[case] distances: Vec<f32>,
        #[case] expected: DistanceError,
    ) {
        let before = store.get(ObjType::NumaNode).cloned();
        let err = store
            .set_matrix_owned(ObjType::NumaNode, indexes, distances)
            .expect_err("input must be rejected");
        assert_eq!(err, expected);
        assert_eq!(store.get(ObjType::NumaNode).cloned(), before);
    }

    #[rstest]
    fn nan_distance_keeps_previous_matrix(mut store: DistanceStore) {
        let before = store.get(ObjType::NumaNode).cloned();
        let err = store
            .set_matrix(ObjType::NumaNode, &[0, 1, 2], &[
                f32::NAN, 5.0, 5.0, //
                5.0, 1.0, 5.0, //
                5.0, 5.0, 1.0,
            ])
            .expect_err("NaN must be rejected");
        assert!(
            matches!(err, DistanceError::InvalidDistance { position: 0, value } if value.is_nan())
        );
        assert_eq!(err.kind(), crate::DistanceErrorKind::InvalidInput);
        assert_eq!(store.get(ObjType::NumaNode).cloned(), before);
    }

    #[rstest]
    fn set_matrix_replaces_both_buffers(mut store: DistanceStore) {
        store
            .set_matrix(ObjType::NumaNode, &[7, 8, 9], &[1.0; 9])
            .expect("valid matrix");
        let matrix = store.get(ObjType::NumaNode).expect("stored");
        assert_eq!(matrix.indexes(), &[7, 8, 9]);
        assert_eq!(matrix.distances().len(), 9);
    }

    #[rstest]
    fn clear_resolved_keeps_raw_data(mut store: DistanceStore) {
        store
            .get_mut(ObjType::NumaNode)
            .expect("stored")
            .set_objs(Some(vec![ObjId(1), ObjId(2)]));
        store.clear_resolved();
        let matrix = store.get(ObjType::NumaNode).expect("still stored");
        assert!(matrix.objs().is_none());
        assert_eq!(matrix.indexes(), &[0, 1]);
    }

    #[rstest]
    fn destroy_all_empties_every_slot(mut store: DistanceStore) {
        store
            .set_matrix(ObjType::Package, &[0], &[1.0])
            .expect("valid matrix");
        assert_eq!(
            store.iter().map(|(ty, _)| ty).collect::<Vec<_>>(),
            vec![ObjType::NumaNode, ObjType::Package]
        );
        store.destroy_all();
        assert!(store.is_empty());
    }

    #[rstest]
    fn display_renders_table(store: DistanceStore) {
        let rendered = store.get(ObjType::NumaNode).expect("stored").to_string();
        assert_eq!(
            rendered,
            "  index     0     1\n      0 10.000 20.000\n      1 20.000 10.000"
        );
    }
}
