//! Benchmark setup error type.
//!
//! Lets setup functions propagate failures with `?` instead of calling
//! `.expect()`.

use crate::source::SyntheticError;
use topodist_core::{DistanceError, TopologyError};

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Matrix generation failed.
    #[error("synthetic matrix generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// The generated matrix was rejected by the store.
    #[error("distance matrix rejected: {0}")]
    Distance(#[from] DistanceError),
    /// The synthetic topology could not be built.
    #[error("topology construction failed: {0}")]
    Topology(#[from] TopologyError),
}
