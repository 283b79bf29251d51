//! Insertion of new objects by cpuset.
//!
//! A new object lands below the deepest existing object that strictly
//! includes its cpuset and adopts every sibling whose cpuset it includes.

use tracing::trace;

use super::{ObjId, ObjType, Topology, TopologyObject};
use crate::{CpuSet, error::TopologyError};

/// Description of an object to insert with [`Topology::insert_by_cpuset`].
#[derive(Clone, Debug)]
pub struct NewObject {
    /// Type of the new object.
    pub obj_type: ObjType,
    /// Raw index, `None` for synthetic objects.
    pub os_index: Option<u32>,
    /// Processing units covered by the new object.
    pub cpuset: CpuSet,
    /// Grouping level for Group objects.
    pub group_depth: Option<u32>,
}

impl NewObject {
    /// Describes a Group object synthesized at grouping `level`.
    #[must_use]
    pub fn group(cpuset: CpuSet, level: u32) -> Self {
        Self {
            obj_type: ObjType::Group,
            os_index: None,
            cpuset,
            group_depth: Some(level),
        }
    }
}

/// Outcome of [`Topology::insert_by_cpuset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insertion {
    /// A new object was created.
    Created(ObjId),
    /// An existing object already has exactly this cpuset and stands in for
    /// the new one, which is discarded.
    Merged(ObjId),
}

impl Insertion {
    /// Object representing the inserted cpuset.
    #[must_use]
    pub fn id(self) -> ObjId {
        match self {
            Self::Created(id) | Self::Merged(id) => id,
        }
    }
}

impl Topology {
    /// Inserts `new` into the tree according to its cpuset.
    ///
    /// # Errors
    /// Returns [`TopologyError::EmptyCpuset`] for an empty cpuset,
    /// [`TopologyError::OutsideRoot`] when the root does not include it, and
    /// [`TopologyError::Conflict`] when it partially overlaps an existing
    /// object.
    ///
    /// # Examples
    /// ```
    /// use topodist_core::{CpuSet, Insertion, NewObject, ObjType, Topology};
    ///
    /// let mut topology = Topology::synthetic("numanode:4 pu:1")?;
    /// let inserted = topology.insert_by_cpuset(NewObject::group(CpuSet::from_range(0..2), 0))?;
    /// let Insertion::Created(group) = inserted else { panic!("expected a new object") };
    /// assert_eq!(topology.object(group).children().len(), 2);
    /// assert_eq!(topology.object(group).obj_type(), ObjType::Group);
    /// # Ok::<(), topodist_core::TopologyError>(())
    /// ```
    pub fn insert_by_cpuset(&mut self, new: NewObject) -> Result<Insertion, TopologyError> {
        if new.cpuset.is_empty() {
            return Err(TopologyError::EmptyCpuset);
        }
        let root = self.root();
        if !self.object(root).cpuset.includes(&new.cpuset) {
            return Err(TopologyError::OutsideRoot { cpuset: new.cpuset });
        }
        if self.object(root).cpuset == new.cpuset {
            return Ok(Insertion::Merged(root));
        }

        let mut parent = root;
        'descend: loop {
            let mut adopted = Vec::new();
            for &child in &self.object(parent).children {
                let existing = &self.object(child).cpuset;
                if *existing == new.cpuset {
                    trace!(existing = %child, cpuset = %new.cpuset, "merged into existing object");
                    return Ok(Insertion::Merged(child));
                }
                if existing.includes(&new.cpuset) {
                    parent = child;
                    continue 'descend;
                }
                if !existing.is_empty() && new.cpuset.includes(existing) {
                    adopted.push(child);
                } else if existing.intersects(&new.cpuset) {
                    return Err(TopologyError::Conflict {
                        cpuset: new.cpuset,
                        existing: child,
                    });
                }
            }
            return Ok(Insertion::Created(self.attach(parent, new, &adopted)));
        }
    }

    fn attach(&mut self, parent: ObjId, new: NewObject, adopted: &[ObjId]) -> ObjId {
        let id = ObjId(self.objects.len());
        let first_cpu = new.cpuset.first();
        let mut object = TopologyObject::new(new.obj_type, new.os_index, new.cpuset);
        object.group_depth = new.group_depth;
        object.parent = Some(parent);
        object.children = adopted.to_vec();
        self.objects.push(object);

        for &child in adopted {
            self.objects[child.0].parent = Some(id);
        }

        let siblings = &self.objects[parent.0].children;
        let position = match adopted.first() {
            Some(first) => siblings.iter().position(|sibling| sibling == first),
            None => siblings
                .iter()
                .position(|&sibling| self.objects[sibling.0].cpuset.first() > first_cpu),
        }
        .unwrap_or(siblings.len());

        let siblings = &mut self.objects[parent.0].children;
        siblings.insert(position, id);
        siblings.retain(|sibling| !adopted.contains(sibling));
        self.connect();
        id
    }
}
