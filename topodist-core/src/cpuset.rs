//! Processing-unit sets attached to topology objects.
//!
//! A [`CpuSet`] is a growable bitmap over processing-unit identifiers. The
//! tree uses it to decide containment (which object covers which) and the
//! grouping engine uses unions of member sets to place synthetic Group
//! objects.

use std::fmt;

const WORD_BITS: u32 = u64::BITS;

/// Set of processing-unit identifiers.
///
/// Trailing zero words are never stored, so structural equality matches set
/// equality.
///
/// # Examples
/// ```
/// use topodist_core::CpuSet;
///
/// let mut left = CpuSet::from_range(0..2);
/// let right = CpuSet::from_range(2..4);
/// left.union_with(&right);
/// assert_eq!(left, CpuSet::from_range(0..4));
/// assert!(left.includes(&right));
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct CpuSet {
    words: Vec<u64>,
}

impl CpuSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding every identifier in `range`.
    #[must_use]
    pub fn from_range(range: std::ops::Range<u32>) -> Self {
        let mut set = Self::new();
        for cpu in range {
            set.insert(cpu);
        }
        set
    }

    /// Adds `cpu` to the set.
    pub fn insert(&mut self, cpu: u32) {
        let word = (cpu / WORD_BITS) as usize;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1_u64 << (cpu % WORD_BITS);
    }

    /// Returns whether `cpu` belongs to the set.
    #[must_use]
    pub fn contains(&self, cpu: u32) -> bool {
        self.words
            .get((cpu / WORD_BITS) as usize)
            .is_some_and(|word| word & (1_u64 << (cpu % WORD_BITS)) != 0)
    }

    /// Returns whether the set holds no identifier.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of identifiers in the set.
    #[must_use]
    pub fn weight(&self) -> u32 {
        self.words.iter().map(|word| word.count_ones()).sum()
    }

    /// Lowest identifier in the set.
    #[must_use]
    pub fn first(&self) -> Option<u32> {
        self.words
            .iter()
            .enumerate()
            .find(|(_, word)| **word != 0)
            .map(|(idx, word)| idx as u32 * WORD_BITS + word.trailing_zeros())
    }

    /// Adds every identifier of `other` to `self`.
    pub fn union_with(&mut self, other: &Self) {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            *mine |= theirs;
        }
    }

    /// Returns whether every identifier of `other` is also in `self`.
    #[must_use]
    pub fn includes(&self, other: &Self) -> bool {
        other.words.iter().enumerate().all(|(idx, theirs)| {
            let mine = self.words.get(idx).copied().unwrap_or(0);
            theirs & !mine == 0
        })
    }

    /// Returns whether the two sets share at least one identifier.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(mine, theirs)| mine & theirs != 0)
    }

    /// Iterates over the identifiers in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.words.iter().enumerate().flat_map(|(idx, &word)| {
            (0..WORD_BITS)
                .filter(move |bit| word & (1_u64 << bit) != 0)
                .map(move |bit| idx as u32 * WORD_BITS + bit)
        })
    }
}

impl FromIterator<u32> for CpuSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = Self::new();
        for cpu in iter {
            set.insert(cpu);
        }
        set
    }
}

/// Renders the set as a list of ranges, e.g. `0-3,8,10-11`.
impl fmt::Display for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.iter().peekable();
        let mut first = true;
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}-{end}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CpuSet({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn union_spans_word_boundaries() {
        let mut set = CpuSet::from_range(60..64);
        set.union_with(&CpuSet::from_range(64..70));
        assert_eq!(set, CpuSet::from_range(60..70));
        assert_eq!(set.weight(), 10);
        assert_eq!(set.first(), Some(60));
    }

    #[rstest]
    #[case(CpuSet::from_range(0..4), CpuSet::from_range(1..3), true)]
    #[case(CpuSet::from_range(0..4), CpuSet::from_range(3..5), false)]
    #[case(CpuSet::from_range(0..4), CpuSet::new(), true)]
    #[case(CpuSet::new(), CpuSet::from_range(0..1), false)]
    fn includes_matches_subset_relation(
        #[case] outer: CpuSet,
        #[case] inner: CpuSet,
        #[case] expected: bool,
    ) {
        assert_eq!(outer.includes(&inner), expected);
    }

    #[rstest]
    fn intersects_detects_shared_bits() {
        let left = CpuSet::from_range(0..4);
        assert!(left.intersects(&CpuSet::from_range(3..8)));
        assert!(!left.intersects(&CpuSet::from_range(4..8)));
    }

    #[rstest]
    #[case(CpuSet::new(), "")]
    #[case(CpuSet::from_range(0..4), "0-3")]
    #[case([0, 2, 3, 8].into_iter().collect(), "0,2-3,8")]
    fn display_collapses_ranges(#[case] set: CpuSet, #[case] expected: &str) {
        assert_eq!(set.to_string(), expected);
    }

    #[rstest]
    fn iter_yields_sorted_members() {
        let set: CpuSet = [70, 3, 1].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 3, 70]);
        assert!(set.contains(70));
        assert!(!set.contains(2));
    }
}
