//! Benchmark support crate for topodist.
//!
//! Generates hierarchical distance matrices and the parameter types used by
//! the Criterion benchmarks for min-distance clustering and full load passes.

pub mod error;
pub mod params;
pub mod source;
