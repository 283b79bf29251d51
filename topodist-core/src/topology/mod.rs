//! Arena-backed hardware topology tree.
//!
//! The distance pipeline needs a small set of tree primitives: a full
//! depth-first search by type and raw index, the covering object of a
//! cpuset, insertion of a new object by cpuset, and depth plus logical-index
//! bookkeeping. Objects live in a flat arena and refer to each other by
//! [`ObjId`], so the distance code never holds references into the tree
//! across mutations.

mod insert;
mod object;
mod synthetic;

use std::collections::HashMap;

use crate::{CpuSet, NormalizedDistances};

pub use self::{
    insert::{Insertion, NewObject},
    object::{ObjId, ObjType, TopologyObject},
};

/// Where objects of one type sit in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeDepth {
    /// No object of the type exists.
    Unknown,
    /// Objects of the type appear at several depths.
    Multiple,
    /// All objects of the type share this depth.
    Depth(u32),
}

/// Hardware topology tree.
///
/// # Examples
/// ```
/// use topodist_core::{ObjType, Topology};
///
/// let topology = Topology::synthetic("numanode:2 core:2 pu:1")?;
/// let node = topology
///     .find_by_type_and_os_index(ObjType::NumaNode, 1)
///     .expect("node 1 exists");
/// assert_eq!(topology.object(node).cpuset().to_string(), "2-3");
/// # Ok::<(), topodist_core::TopologyError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Topology {
    objects: Vec<TopologyObject>,
}

impl Topology {
    /// Creates a tree holding only a root object.
    #[must_use]
    pub fn new(root_type: ObjType, cpuset: CpuSet) -> Self {
        Self {
            objects: vec![TopologyObject::new(root_type, Some(0), cpuset)],
        }
    }

    /// Root object.
    #[must_use]
    pub fn root(&self) -> ObjId {
        ObjId(0)
    }

    /// Number of objects in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// A tree always holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns the object behind `id`.
    ///
    /// # Panics
    /// Panics when `id` was not produced by this tree.
    #[must_use]
    pub fn object(&self, id: ObjId) -> &TopologyObject {
        &self.objects[id.0]
    }

    /// Returns the object behind `id`, or `None` for a foreign handle.
    #[must_use]
    pub fn get(&self, id: ObjId) -> Option<&TopologyObject> {
        self.objects.get(id.0)
    }

    /// Appends a child under `parent` and extends every ancestor's cpuset
    /// with `cpuset`.
    ///
    /// # Panics
    /// Panics when `parent` was not produced by this tree.
    pub fn add_child(
        &mut self,
        parent: ObjId,
        obj_type: ObjType,
        os_index: Option<u32>,
        cpuset: CpuSet,
    ) -> ObjId {
        let id = ObjId(self.objects.len());
        let mut object = TopologyObject::new(obj_type, os_index, cpuset.clone());
        object.parent = Some(parent);
        self.objects.push(object);
        self.objects[parent.0].children.push(id);

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            let slot = &mut self.objects[current.0];
            slot.cpuset.union_with(&cpuset);
            ancestor = slot.parent;
        }
        self.connect();
        id
    }

    /// Object ids in depth-first, left-to-right order starting at the root.
    #[must_use]
    pub fn dfs(&self) -> Vec<ObjId> {
        let mut order = Vec::with_capacity(self.objects.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.object(id).children.iter().rev().copied());
        }
        order
    }

    /// Searches the whole tree for the object with `obj_type` and raw index
    /// `os_index`.
    #[must_use]
    pub fn find_by_type_and_os_index(&self, obj_type: ObjType, os_index: u32) -> Option<ObjId> {
        self.dfs().into_iter().find(|&id| {
            let object = self.object(id);
            object.obj_type == obj_type && object.os_index == Some(os_index)
        })
    }

    /// Deepest object whose cpuset includes `set`.
    ///
    /// Returns `None` when `set` is empty or the root does not include it.
    #[must_use]
    pub fn covering_object(&self, set: &CpuSet) -> Option<ObjId> {
        if set.is_empty() || !self.object(self.root()).cpuset.includes(set) {
            return None;
        }
        let mut current = self.root();
        'descend: loop {
            for &child in &self.object(current).children {
                if self.object(child).cpuset.includes(set) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Depth of the objects of `obj_type`.
    #[must_use]
    pub fn type_depth(&self, obj_type: ObjType) -> TypeDepth {
        let mut depth = TypeDepth::Unknown;
        for object in self.objects.iter().filter(|o| o.obj_type == obj_type) {
            depth = match depth {
                TypeDepth::Unknown => TypeDepth::Depth(object.depth),
                TypeDepth::Depth(d) if d == object.depth => depth,
                _ => return TypeDepth::Multiple,
            };
        }
        depth
    }

    /// Objects of `obj_type`, ordered by depth then logical index.
    #[must_use]
    pub fn objects_of_type(&self, obj_type: ObjType) -> Vec<ObjId> {
        let mut ids: Vec<ObjId> = self
            .dfs()
            .into_iter()
            .filter(|&id| self.object(id).obj_type == obj_type)
            .collect();
        ids.sort_by_key(|&id| (self.object(id).depth, self.object(id).logical_index));
        ids
    }

    /// Attaches a normalized latency matrix to `owner`.
    pub(crate) fn attach_distances(&mut self, owner: ObjId, distances: NormalizedDistances) {
        self.objects[owner.0].distances.push(distances);
    }

    /// Recomputes depths and logical indexes after a structural change.
    fn connect(&mut self) {
        let mut counters: HashMap<(u32, ObjType), u32> = HashMap::new();
        let mut stack = vec![(self.root(), 0_u32)];
        while let Some((id, depth)) = stack.pop() {
            let object = &mut self.objects[id.0];
            object.depth = depth;
            let counter = counters.entry((depth, object.obj_type)).or_insert(0);
            object.logical_index = *counter;
            *counter += 1;
            stack.extend(object.children.iter().rev().map(|&child| (child, depth + 1)));
        }
    }
}

#[cfg(test)]
mod tests;
