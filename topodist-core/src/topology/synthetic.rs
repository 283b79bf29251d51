//! Synthetic trees described by a list of `type:count` levels.
//!
//! `"numanode:2 core:4 pu:2"` describes a Machine with two NUMA nodes, each
//! holding four cores of two processing units. Raw indexes are assigned per
//! type in depth-first order, so they match logical indexes. A trailing
//! `pu:1` level is implied when the description does not end with PUs.

use super::{ObjId, ObjType, Topology};
use crate::{CpuSet, error::TopologyError};

impl Topology {
    /// Builds a symmetric tree from a synthetic description.
    ///
    /// # Errors
    /// Returns [`TopologyError::InvalidSynthetic`] for malformed levels,
    /// zero counts, or PU levels that are not last, and
    /// [`TopologyError::UnknownType`] for unknown type names.
    ///
    /// # Examples
    /// ```
    /// use topodist_core::{ObjType, Topology};
    ///
    /// let topology = Topology::synthetic("package:2 core:2")?;
    /// assert_eq!(topology.objects_of_type(ObjType::Pu).len(), 4);
    /// # Ok::<(), topodist_core::TopologyError>(())
    /// ```
    pub fn synthetic(description: &str) -> Result<Self, TopologyError> {
        let mut levels = parse_levels(description)?;
        if levels.last().is_none_or(|(ty, _)| *ty != ObjType::Pu) {
            levels.push((ObjType::Pu, 1));
        }

        let mut topology = Self::new(ObjType::Machine, CpuSet::new());
        let mut counters = [0_u32; ObjType::COUNT];
        let root = topology.root();
        topology.populate(root, &levels, &mut counters);
        Ok(topology)
    }

    fn populate(&mut self, parent: ObjId, levels: &[(ObjType, u32)], counters: &mut [u32]) {
        let Some((&(obj_type, count), rest)) = levels.split_first() else {
            return;
        };
        for _ in 0..count {
            let os_index = counters[obj_type.slot()];
            counters[obj_type.slot()] += 1;
            let cpuset = if obj_type == ObjType::Pu {
                std::iter::once(os_index).collect()
            } else {
                CpuSet::new()
            };
            let child = self.add_child(parent, obj_type, Some(os_index), cpuset);
            self.populate(child, rest, counters);
        }
    }
}

fn parse_levels(description: &str) -> Result<Vec<(ObjType, u32)>, TopologyError> {
    let tokens: Vec<&str> = description.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(TopologyError::InvalidSynthetic {
            token: description.to_owned(),
            reason: "description is empty",
        });
    }
    let mut levels = Vec::with_capacity(tokens.len());
    for (position, token) in tokens.iter().enumerate() {
        let invalid = |reason| TopologyError::InvalidSynthetic {
            token: (*token).to_owned(),
            reason,
        };
        let (name, count) = token
            .split_once(':')
            .ok_or_else(|| invalid("expected `type:count`"))?;
        let obj_type: ObjType = name.parse()?;
        let count: u32 = count
            .parse()
            .map_err(|_| invalid("count is not an unsigned integer"))?;
        if count == 0 {
            return Err(invalid("count must be at least 1"));
        }
        if matches!(obj_type, ObjType::Machine | ObjType::System) {
            return Err(invalid("the root level is implicit"));
        }
        if obj_type == ObjType::Pu && position + 1 != tokens.len() {
            return Err(invalid("PU must be the last level"));
        }
        levels.push((obj_type, count));
    }
    Ok(levels)
}
