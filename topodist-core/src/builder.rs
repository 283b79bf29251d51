//! Builder utilities for configuring distance handling.
//!
//! Collects per-type descriptions and the grouping switch before
//! constructing a [`Distances`] pipeline.

use crate::{DistancesConfig, ObjType, pipeline::Distances};

/// Configures and constructs [`Distances`] instances.
///
/// # Examples
/// ```
/// use topodist_core::{DistancesBuilder, ObjType};
///
/// let distances = DistancesBuilder::new()
///     .with_description(ObjType::NumaNode, "0,1,2,3:2*2")
///     .with_grouping(false)
///     .build();
/// assert_eq!(
///     distances.config().description(ObjType::NumaNode),
///     Some("0,1,2,3:2*2")
/// );
/// assert!(!distances.config().group_by_distances());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DistancesBuilder {
    config: DistancesConfig,
}

impl DistancesBuilder {
    /// Creates a builder with no descriptions and grouping enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded from the process environment.
    ///
    /// See [`DistancesConfig::from_env`] for the variables consulted.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new().with_config(DistancesConfig::from_env())
    }

    /// Overlays `config` on the current configuration.
    ///
    /// # Examples
    /// ```
    /// use topodist_core::{DistancesBuilder, DistancesConfig, ObjType};
    ///
    /// let mut overlay = DistancesConfig::default();
    /// overlay.set_description(ObjType::Package, "0,1:1,2,2,1");
    /// let builder = DistancesBuilder::new()
    ///     .with_description(ObjType::Package, "0,1:2*1")
    ///     .with_config(overlay);
    /// assert_eq!(builder.config().description(ObjType::Package), Some("0,1:1,2,2,1"));
    /// ```
    #[must_use]
    pub fn with_config(mut self, config: DistancesConfig) -> Self {
        self.config.merge(config);
        self
    }

    /// Sets the description for `obj_type`.
    #[must_use]
    pub fn with_description(mut self, obj_type: ObjType, description: impl Into<String>) -> Self {
        self.config.set_description(obj_type, description);
        self
    }

    /// Enables or disables distance-based grouping.
    #[must_use]
    pub fn with_grouping(mut self, enabled: bool) -> Self {
        self.config.set_group_by_distances(enabled);
        self
    }

    /// Returns the configuration collected so far.
    #[must_use]
    pub fn config(&self) -> &DistancesConfig {
        &self.config
    }

    /// Constructs a [`Distances`] pipeline with an empty store.
    #[must_use]
    pub fn build(self) -> Distances {
        Distances::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_enable_grouping_without_descriptions() {
        let builder = DistancesBuilder::new();
        assert!(builder.config().group_by_distances());
        assert_eq!(builder.config().descriptions().count(), 0);
    }

    #[rstest]
    fn config_overlay_can_disable_grouping() {
        let mut overlay = DistancesConfig::default();
        overlay.set_group_by_distances(false);
        let builder = DistancesBuilder::new()
            .with_description(ObjType::NumaNode, "0:1")
            .with_config(overlay);
        assert!(!builder.config().group_by_distances());
        assert_eq!(builder.config().description(ObjType::NumaNode), Some("0:1"));
    }

    #[rstest]
    fn build_starts_with_empty_store() {
        let distances = DistancesBuilder::new()
            .with_description(ObjType::NumaNode, "0,1:2*1")
            .build();
        assert!(distances.store().is_empty());
    }
}
