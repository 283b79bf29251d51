//! Hierarchical distance matrices for benchmarking.
//!
//! Objects are split into nested blocks. Two objects sharing their innermost
//! block are at distance 20, and each further level they have to climb adds
//! 10, so grouping recovers the block structure level by level. Rows are
//! shuffled so clustering cannot lean on index adjacency.

use rand::{SeedableRng, rngs::SmallRng, seq::SliceRandom};
use thiserror::Error;

/// Distance from an object to itself.
const LOCAL_DISTANCE: u16 = 10;

/// Errors raised while generating a matrix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntheticError {
    /// No block levels were given.
    #[error("at least one block level is required")]
    NoLevels,
    /// A level had zero members.
    #[error("block level {level} has arity zero")]
    ZeroArity {
        /// Offending level, outermost first.
        level: usize,
    },
    /// The object count does not fit a `u32` index.
    #[error("too many objects for u32 indexes")]
    TooManyObjects,
    /// Distances for this many levels overflow `u16`.
    #[error("{levels} block levels overflow the distance range")]
    TooDeep {
        /// Number of levels requested.
        levels: usize,
    },
}

/// Shape and seed for [`HierarchicalMatrix::generate`].
#[derive(Clone, Debug)]
pub struct HierarchicalConfig {
    /// Block arities from the outermost level inwards.
    pub arities: Vec<usize>,
    /// RNG seed for the row shuffle.
    pub seed: u64,
}

/// Generated NUMA-node indexes and their distance matrix.
#[derive(Clone, Debug)]
pub struct HierarchicalMatrix {
    indexes: Vec<u32>,
    values: Vec<f32>,
}

impl HierarchicalMatrix {
    /// Generates the matrix described by `config`.
    ///
    /// # Errors
    /// Returns [`SyntheticError`] for empty or zero-arity shapes and for
    /// shapes too large to index or too deep to encode.
    ///
    /// # Examples
    /// ```
    /// use topodist_benches::source::{HierarchicalConfig, HierarchicalMatrix};
    ///
    /// let matrix = HierarchicalMatrix::generate(&HierarchicalConfig {
    ///     arities: vec![2, 2],
    ///     seed: 7,
    /// })?;
    /// assert_eq!(matrix.nbobjs(), 4);
    /// assert_eq!(matrix.synthetic(), "numanode:4 pu:1");
    /// # Ok::<(), topodist_benches::source::SyntheticError>(())
    /// ```
    pub fn generate(config: &HierarchicalConfig) -> Result<Self, SyntheticError> {
        if config.arities.is_empty() {
            return Err(SyntheticError::NoLevels);
        }
        if let Some(level) = config.arities.iter().position(|&arity| arity == 0) {
            return Err(SyntheticError::ZeroArity { level });
        }
        let count = config
            .arities
            .iter()
            .try_fold(1_usize, |acc, &arity| acc.checked_mul(arity))
            .ok_or(SyntheticError::TooManyObjects)?;
        let count = u32::try_from(count).map_err(|_| SyntheticError::TooManyObjects)?;
        let levels = config.arities.len();
        u16::try_from(levels)
            .ok()
            .and_then(|levels| levels.checked_add(1))
            .and_then(|steps| steps.checked_mul(LOCAL_DISTANCE))
            .ok_or(SyntheticError::TooDeep { levels })?;

        let strides = strides(&config.arities);
        let mut indexes: Vec<u32> = (0..count).collect();
        indexes.shuffle(&mut SmallRng::seed_from_u64(config.seed));

        let values = indexes
            .iter()
            .flat_map(|&row| {
                let strides = &strides;
                indexes
                    .iter()
                    .map(move |&column| distance(row, column, strides))
            })
            .collect();
        Ok(Self { indexes, values })
    }

    /// Number of objects in the matrix.
    #[must_use]
    pub fn nbobjs(&self) -> usize {
        self.indexes.len()
    }

    /// NUMA-node indexes, in row order.
    #[must_use]
    pub fn indexes(&self) -> &[u32] {
        &self.indexes
    }

    /// Row-major distances.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Synthetic topology holding one NUMA node per index.
    #[must_use]
    pub fn synthetic(&self) -> String {
        format!("numanode:{} pu:1", self.nbobjs())
    }
}

/// Block size at each level, outermost first.
fn strides(arities: &[usize]) -> Vec<u32> {
    let mut strides: Vec<u32> = arities
        .iter()
        .rev()
        .scan(1_u32, |size, &arity| {
            // The full product was checked against `u32`.
            *size = size.saturating_mul(u32::try_from(arity).unwrap_or(u32::MAX));
            Some(*size)
        })
        .collect();
    strides.reverse();
    strides
}

#[expect(
    clippy::integer_division,
    reason = "block membership is the quotient of the index by the block size"
)]
fn distance(a: u32, b: u32, strides: &[u32]) -> f32 {
    if a == b {
        return f32::from(LOCAL_DISTANCE);
    }
    let shared = strides
        .iter()
        .filter(|&&stride| a / stride == b / stride)
        .count();
    let steps = strides.len() + 2 - shared;
    // `generate` bounds the level count so this cannot saturate.
    let steps = u16::try_from(steps).unwrap_or(u16::MAX);
    f32::from(steps.saturating_mul(LOCAL_DISTANCE))
}
