//! Distance pipeline orchestration.
//!
//! Provides the [`Distances`] entry point tying the store to the topology
//! lifecycle (init, load, reload-clear, destroy) and the [`LoadReport`]
//! describing what one load pass did.

use tracing::{info, instrument};

use crate::{
    DistanceError, DistanceStore, DistancesConfig, ObjId, ObjType, Topology,
    error::Diagnostic,
    grouping::{GroupingLevel, group_by_distances},
    normalize::finalize_logical_distances,
    parse::store_from_config,
    resolve::resolve_all,
};

/// Outcome of [`Distances::load`].
///
/// Diagnostics never abort a load; they describe which matrices were set
/// aside and why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    diagnostics: Vec<Diagnostic>,
    levels: Vec<GroupingLevel>,
    normalized: Vec<(ObjType, ObjId)>,
}

impl LoadReport {
    /// Matrices dropped during the pass, in stage order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Grouping levels, in the order they were processed.
    #[must_use]
    pub fn grouping_levels(&self) -> &[GroupingLevel] {
        &self.levels
    }

    /// Objects that received a normalized matrix, with the matrix type.
    #[must_use]
    pub fn normalized(&self) -> &[(ObjType, ObjId)] {
        &self.normalized
    }

    /// Group objects added to the tree by the pass.
    pub fn groups_created(&self) -> impl Iterator<Item = ObjId> + '_ {
        self.levels
            .iter()
            .flat_map(|level| level.created.iter().copied())
    }

    /// Returns whether no matrix was dropped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Entry point for attaching distances to a topology.
///
/// # Examples
/// ```
/// use topodist_core::{DistancesBuilder, ObjType, Topology};
///
/// let mut topology = Topology::synthetic("numanode:4 core:2 pu:1")?;
/// let mut distances = DistancesBuilder::new()
///     .with_description(ObjType::NumaNode, "0,1,2,3:2*2")
///     .build();
/// let report = distances.load(&mut topology);
/// assert!(report.is_clean());
/// assert_eq!(report.groups_created().count(), 2);
/// assert_eq!(topology.object(topology.root()).distances().len(), 1);
/// # Ok::<(), topodist_core::TopologyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Distances {
    config: DistancesConfig,
    store: DistanceStore,
}

impl Default for Distances {
    fn default() -> Self {
        Self::init()
    }
}

impl Distances {
    pub(crate) fn new(config: DistancesConfig) -> Self {
        Self {
            config,
            store: DistanceStore::new(),
        }
    }

    /// Creates a pipeline with an empty store and the default configuration.
    #[must_use]
    pub fn init() -> Self {
        Self::new(DistancesConfig::default())
    }

    /// Configuration applied on every load pass.
    #[must_use]
    pub fn config(&self) -> &DistancesConfig {
        &self.config
    }

    /// Stored matrices.
    #[must_use]
    pub fn store(&self) -> &DistanceStore {
        &self.store
    }

    /// Stores a copy of a matrix for `obj_type`; the caller keeps its
    /// buffers.
    ///
    /// # Errors
    /// See [`DistanceStore::set_matrix_owned`].
    pub fn set_matrix(
        &mut self,
        obj_type: ObjType,
        indexes: &[u32],
        distances: &[f32],
    ) -> Result<(), DistanceError> {
        self.store.set_matrix(obj_type, indexes, distances)
    }

    /// Stores `indexes` and `distances` for `obj_type`, taking ownership.
    ///
    /// # Errors
    /// See [`DistanceStore::set_matrix_owned`].
    pub fn set_matrix_owned(
        &mut self,
        obj_type: ObjType,
        indexes: Vec<u32>,
        distances: Vec<f32>,
    ) -> Result<(), DistanceError> {
        self.store.set_matrix_owned(obj_type, indexes, distances)
    }

    /// Stores every description of the configuration.
    ///
    /// Descriptions replace matrices set earlier for the same type.
    pub fn store_from_config(&mut self) -> Vec<Diagnostic> {
        store_from_config(&mut self.store, &self.config)
    }

    /// Runs one load pass against `topology`: store configured descriptions,
    /// resolve indexes, group, then normalize.
    ///
    /// Grouping runs first so normalized matrices are attached with the
    /// final depths.
    #[instrument(
        name = "distances.load",
        skip(self, topology),
        fields(objects = topology.len(), grouping = self.config.group_by_distances()),
    )]
    pub fn load(&mut self, topology: &mut Topology) -> LoadReport {
        let mut report = LoadReport::default();
        report.diagnostics.extend(self.store_from_config());
        report
            .diagnostics
            .extend(resolve_all(&mut self.store, topology));

        let (levels, diagnostics) =
            group_by_distances(&self.store, topology, self.config.group_by_distances());
        report.levels = levels;
        report.diagnostics.extend(diagnostics);

        let (normalized, diagnostics) = finalize_logical_distances(&self.store, topology);
        report.normalized = normalized;
        report.diagnostics.extend(diagnostics);

        info!(
            groups = report.groups_created().count(),
            normalized = report.normalized.len(),
            dropped = report.diagnostics.len(),
            "distances loaded"
        );
        report
    }

    /// Forgets resolved objects so the next [`Self::load`] resolves the raw
    /// indexes against a fresh tree.
    pub fn reload_clear(&mut self) {
        self.store.clear_resolved();
    }

    /// Drops every stored matrix.
    pub fn destroy(&mut self) {
        self.store.destroy_all();
    }
}
