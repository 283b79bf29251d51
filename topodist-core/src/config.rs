//! Distance configuration read from the environment.
//!
//! Each object type may carry one description in
//! `TOPODIST_<TYPE>_DISTANCES` (for instance `TOPODIST_NUMANODE_DISTANCES`),
//! and the presence of `TOPODIST_IGNORE_DISTANCES` disables grouping. The
//! environment is read once into a [`DistancesConfig`] value; nothing
//! downstream consults it again.

use std::{collections::BTreeMap, env};

use tracing::warn;

use crate::ObjType;

/// Environment variable disabling distance-based grouping when set.
pub const IGNORE_DISTANCES_ENV: &str = "TOPODIST_IGNORE_DISTANCES";

/// Name of the environment variable carrying the description of `obj_type`.
///
/// # Examples
/// ```
/// use topodist_core::{ObjType, distances_env_key};
///
/// assert_eq!(distances_env_key(ObjType::NumaNode), "TOPODIST_NUMANODE_DISTANCES");
/// ```
#[must_use]
pub fn distances_env_key(obj_type: ObjType) -> String {
    format!(
        "TOPODIST_{}_DISTANCES",
        obj_type.name().to_ascii_uppercase()
    )
}

/// Distance descriptions and switches consumed by one load pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistancesConfig {
    descriptions: BTreeMap<ObjType, String>,
    group_by_distances: bool,
}

impl Default for DistancesConfig {
    fn default() -> Self {
        Self {
            descriptions: BTreeMap::new(),
            group_by_distances: true,
        }
    }
}

impl DistancesConfig {
    /// Reads the configuration from the process environment.
    ///
    /// Variables holding invalid UTF-8 are skipped with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| match env::var(key) {
            Ok(value) => Some(value),
            Err(env::VarError::NotPresent) => None,
            Err(err @ env::VarError::NotUnicode(_)) => {
                warn!(env = key, error = %err, "ignoring environment variable");
                None
            }
        })
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Examples
    /// ```
    /// use topodist_core::{DistancesConfig, ObjType};
    ///
    /// let config = DistancesConfig::from_lookup(|key| {
    ///     (key == "TOPODIST_PACKAGE_DISTANCES").then(|| "0,1:1,2,2,1".to_owned())
    /// });
    /// assert_eq!(config.description(ObjType::Package), Some("0,1:1,2,2,1"));
    /// assert!(config.group_by_distances());
    /// ```
    #[must_use]
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<String>) -> Self {
        let descriptions = ObjType::ALL
            .into_iter()
            .filter_map(|obj_type| {
                lookup(&distances_env_key(obj_type)).map(|description| (obj_type, description))
            })
            .collect();
        Self {
            descriptions,
            group_by_distances: lookup(IGNORE_DISTANCES_ENV).is_none(),
        }
    }

    /// Sets the description for `obj_type`, replacing any previous one.
    pub fn set_description(&mut self, obj_type: ObjType, description: impl Into<String>) {
        self.descriptions.insert(obj_type, description.into());
    }

    /// Description configured for `obj_type`.
    #[must_use]
    pub fn description(&self, obj_type: ObjType) -> Option<&str> {
        self.descriptions.get(&obj_type).map(String::as_str)
    }

    /// Every configured description, in type order.
    pub fn descriptions(&self) -> impl Iterator<Item = (ObjType, &str)> {
        self.descriptions
            .iter()
            .map(|(obj_type, description)| (*obj_type, description.as_str()))
    }

    /// Enables or disables distance-based grouping.
    pub fn set_group_by_distances(&mut self, enabled: bool) {
        self.group_by_distances = enabled;
    }

    /// Whether distance-based grouping runs during a load pass.
    #[must_use]
    pub fn group_by_distances(&self) -> bool {
        self.group_by_distances
    }

    /// Overlays `other` on `self`: its descriptions win, and grouping stays
    /// enabled only when both enable it.
    pub fn merge(&mut self, other: Self) {
        self.descriptions.extend(other.descriptions);
        self.group_by_distances &= other.group_by_distances;
    }
}
