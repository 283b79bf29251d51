//! Topodist core library.
//!
//! Stores raw latency matrices per object type, binds them to a hardware
//! topology tree, synthesizes `Group` objects from distance clusters and
//! attaches normalized latency matrices to the objects covering them.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod config;
mod cpuset;
mod error;
pub mod grouping;
pub mod normalize;
pub mod parse;
mod pipeline;
pub mod resolve;
mod store;
mod topology;

#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::DistancesBuilder,
    config::{DistancesConfig, IGNORE_DISTANCES_ENV, distances_env_key},
    cpuset::CpuSet,
    error::{
        Diagnostic, DistanceError, DistanceErrorCode, DistanceErrorKind, TopologyError,
        TopologyErrorCode,
    },
    grouping::GroupingLevel,
    normalize::NormalizedDistances,
    parse::{ParsedDistances, parse_distances},
    pipeline::{Distances, LoadReport},
    store::{DistanceMatrix, DistanceStore},
    topology::{Insertion, NewObject, ObjId, ObjType, Topology, TopologyObject, TypeDepth},
};
