//! Benchmark parameter types.

use std::fmt;

/// Parameters for a grouping benchmark run.
#[derive(Clone, Debug)]
pub struct GroupingBenchParams {
    /// Block arities from the outermost level inwards.
    pub arities: Vec<usize>,
}

impl GroupingBenchParams {
    /// Number of objects covered by the matrix.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.arities.iter().product()
    }
}

impl fmt::Display for GroupingBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape: Vec<String> = self.arities.iter().map(ToString::to_string).collect();
        write!(f, "n={},shape={}", self.object_count(), shape.join("x"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![4], "n=4,shape=4")]
    #[case(vec![2, 4, 8], "n=64,shape=2x4x8")]
    fn renders_shape(#[case] arities: Vec<usize>, #[case] expected: &str) {
        assert_eq!(GroupingBenchParams { arities }.to_string(), expected);
    }
}
