//! Object types and per-object state stored in the topology arena.

use std::{fmt, str::FromStr};

use crate::{CpuSet, NormalizedDistances, error::TopologyError};

/// Kind of hardware object held by the tree.
///
/// Variants are ordered from the outermost to the innermost level, which is
/// also the order distance matrices are processed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjType {
    /// Whole system, possibly several machines.
    System,
    /// A single shared-memory machine.
    Machine,
    /// NUMA memory node.
    NumaNode,
    /// Physical package (socket).
    Package,
    /// Memory cache.
    Cache,
    /// Core.
    Core,
    /// Processing unit (hardware thread).
    Pu,
    /// Synthetic grouping object.
    Group,
    /// Miscellaneous object.
    Misc,
}

impl ObjType {
    /// Every type, in processing order.
    pub const ALL: [Self; 9] = [
        Self::System,
        Self::Machine,
        Self::NumaNode,
        Self::Package,
        Self::Cache,
        Self::Core,
        Self::Pu,
        Self::Group,
        Self::Misc,
    ];

    /// Number of object types.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable display name.
    ///
    /// # Examples
    /// ```
    /// use topodist_core::ObjType;
    ///
    /// assert_eq!(ObjType::NumaNode.name(), "NUMANode");
    /// assert_eq!("socket".parse::<ObjType>(), Ok(ObjType::Package));
    /// ```
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Machine => "Machine",
            Self::NumaNode => "NUMANode",
            Self::Package => "Package",
            Self::Cache => "Cache",
            Self::Core => "Core",
            Self::Pu => "PU",
            Self::Group => "Group",
            Self::Misc => "Misc",
        }
    }

    pub(crate) const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ObjType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjType {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let found = match lowered.as_str() {
            "socket" => Some(Self::Package),
            "node" => Some(Self::NumaNode),
            other => Self::ALL
                .into_iter()
                .find(|ty| ty.name().eq_ignore_ascii_case(other)),
        };
        found.ok_or_else(|| TopologyError::UnknownType { name: s.to_owned() })
    }
}

/// Stable handle to an object in a [`crate::Topology`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub(crate) usize);

impl ObjId {
    /// Position of the object in its arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the topology tree.
#[derive(Clone, Debug)]
pub struct TopologyObject {
    pub(crate) obj_type: ObjType,
    pub(crate) os_index: Option<u32>,
    pub(crate) cpuset: CpuSet,
    pub(crate) parent: Option<ObjId>,
    pub(crate) children: Vec<ObjId>,
    pub(crate) depth: u32,
    pub(crate) logical_index: u32,
    pub(crate) group_depth: Option<u32>,
    pub(crate) distances: Vec<NormalizedDistances>,
}

impl TopologyObject {
    pub(crate) fn new(obj_type: ObjType, os_index: Option<u32>, cpuset: CpuSet) -> Self {
        Self {
            obj_type,
            os_index,
            cpuset,
            parent: None,
            children: Vec::new(),
            depth: 0,
            logical_index: 0,
            group_depth: None,
            distances: Vec::new(),
        }
    }

    /// Object type.
    #[must_use]
    pub fn obj_type(&self) -> ObjType {
        self.obj_type
    }

    /// Raw identifier reported by the hardware, if any.
    #[must_use]
    pub fn os_index(&self) -> Option<u32> {
        self.os_index
    }

    /// Processing units covered by the object.
    #[must_use]
    pub fn cpuset(&self) -> &CpuSet {
        &self.cpuset
    }

    /// Parent object, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<ObjId> {
        self.parent
    }

    /// Children in left-to-right order.
    #[must_use]
    pub fn children(&self) -> &[ObjId] {
        &self.children
    }

    /// Distance from the root, which has depth 0.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Rank among objects of the same type and depth, left to right.
    #[must_use]
    pub fn logical_index(&self) -> u32 {
        self.logical_index
    }

    /// Grouping recursion level for Group objects built from distances.
    #[must_use]
    pub fn group_depth(&self) -> Option<u32> {
        self.group_depth
    }

    /// Normalized latency matrices owned by this object.
    #[must_use]
    pub fn distances(&self) -> &[NormalizedDistances] {
        &self.distances
    }
}
