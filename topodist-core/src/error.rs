//! Error types for the topodist core library.
//!
//! Defines the error enums exposed by the public API, their stable codes and
//! the coarse taxonomy used when reporting dropped distance matrices.

use std::fmt;

use thiserror::Error;

use crate::{CpuSet, ObjId, ObjType};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by tree primitives or the synthetic tree builder.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TopologyError {
    /// A type name did not match any known object type.
    #[error("unknown object type `{name}`")]
    UnknownType {
        /// The unrecognised name.
        name: String,
    },
    /// A synthetic description could not be parsed.
    #[error("invalid synthetic description at `{token}`: {reason}")]
    InvalidSynthetic {
        /// Offending token.
        token: String,
        /// Why the token was rejected.
        reason: &'static str,
    },
    /// Objects inserted by cpuset must cover at least one processing unit.
    #[error("cannot insert an object with an empty cpuset")]
    EmptyCpuset,
    /// The cpuset reaches outside the root object.
    #[error("cpuset {cpuset} is not covered by the root object")]
    OutsideRoot {
        /// Cpuset of the rejected object.
        cpuset: CpuSet,
    },
    /// The cpuset partially overlaps an existing object.
    #[error("cpuset {cpuset} partially overlaps existing object {existing}")]
    Conflict {
        /// Cpuset of the rejected object.
        cpuset: CpuSet,
        /// Object whose cpuset intersects without containment.
        existing: ObjId,
    },
}

define_error_codes! {
    /// Stable codes describing [`TopologyError`] variants.
    enum TopologyErrorCode for TopologyError {
        /// A type name did not match any known object type.
        UnknownType => UnknownType { .. } => "TOPOLOGY_UNKNOWN_TYPE",
        /// A synthetic description could not be parsed.
        InvalidSynthetic => InvalidSynthetic { .. } => "TOPOLOGY_INVALID_SYNTHETIC",
        /// Objects inserted by cpuset must cover at least one processing unit.
        EmptyCpuset => EmptyCpuset => "TOPOLOGY_EMPTY_CPUSET",
        /// The cpuset reaches outside the root object.
        OutsideRoot => OutsideRoot { .. } => "TOPOLOGY_OUTSIDE_ROOT",
        /// The cpuset partially overlaps an existing object.
        Conflict => Conflict { .. } => "TOPOLOGY_CONFLICT",
    }
}

/// Coarse classification of [`DistanceError`] values.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DistanceErrorKind {
    /// The caller supplied an unusable index list or buffer.
    InvalidInput,
    /// A configuration string was malformed.
    ParseError,
    /// A raw index has no matching object in the tree.
    UnresolvedReference,
    /// The matrix values failed a structural check.
    ValidationFailure,
    /// The tree refused a synthesized Group object.
    TreeConflict,
}

/// An error produced while storing, resolving, normalizing or grouping a
/// distance matrix.
///
/// None of these abort a load pass: the matrix of the affected type is
/// dropped and the error is reported as a [`crate::Diagnostic`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DistanceError {
    /// The same raw index appears twice.
    #[error("index {index} is listed more than once")]
    DuplicateIndex {
        /// The repeated raw index.
        index: u32,
    },
    /// The matrix buffer does not hold `nbobjs * nbobjs` values.
    #[error("matrix holds {got} values but {expected} were expected")]
    LengthMismatch {
        /// Number of values required by the index list.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },
    /// No index was supplied.
    #[error("distance matrix must cover at least one object")]
    EmptyMatrix,
    /// A matrix value is negative, infinite or NaN.
    #[error("distance {value} at position {position} is not a finite non-negative number")]
    InvalidDistance {
        /// Row-major position of the value.
        position: usize,
        /// Offending value.
        value: f32,
    },
    /// The configuration string lacks the `:` separator.
    #[error("missing colon between indexes and distances")]
    MissingColon,
    /// An index token is not an unsigned integer.
    #[error("invalid index `{token}`")]
    InvalidIndex {
        /// Offending token.
        token: String,
    },
    /// A distance token is not a finite non-negative number.
    #[error("invalid distance `{token}` at position {position}")]
    InvalidValue {
        /// Zero-based position in the row-major value list.
        position: usize,
        /// Offending token.
        token: String,
    },
    /// The grouping shorthand does not multiply out to the object count.
    #[error("invalid grouping ({x}*{y}*{z}={product} instead of {expected})")]
    InvalidGrouping {
        /// Number of outer groups.
        x: u32,
        /// Number of middle groups per outer group.
        y: u32,
        /// Number of objects per inner group.
        z: u32,
        /// `x * y * z`, saturated.
        product: u64,
        /// Number of listed indexes.
        expected: usize,
    },
    /// Fewer explicit values than `nbobjs * nbobjs` were supplied.
    #[error("not enough values ({found} out of {expected})")]
    NotEnoughValues {
        /// Number of values found.
        found: usize,
        /// Number of values required.
        expected: usize,
    },
    /// A raw index has no matching object in the tree.
    #[error("unknown OS index {index}")]
    UnresolvedIndex {
        /// The raw index that could not be resolved.
        index: u32,
    },
    /// `m[row][col] != m[col][row]`.
    #[error("asymmetric matrix ([{row},{col}]={forward} != [{col},{row}]={backward})")]
    Asymmetric {
        /// Row of the first cell.
        row: usize,
        /// Column of the first cell.
        col: usize,
        /// Value at `[row][col]`.
        forward: f32,
        /// Value at `[col][row]`.
        backward: f32,
    },
    /// `m[row][col] <= m[row][row]`.
    #[error("distance to self not strictly minimal ([{row},{col}]={value} <= [{row},{row}]={diagonal})")]
    DiagonalNotMinimal {
        /// Row being checked.
        row: usize,
        /// Column whose value is not larger than the diagonal.
        col: usize,
        /// Value at `[row][row]`.
        diagonal: f32,
        /// Value at `[row][col]`.
        value: f32,
    },
    /// The smallest matrix value is zero, so values are not latencies.
    #[error("minimal distance is 0, matrix does not seem to contain latencies")]
    ZeroLatency,
    /// The tree refused a Group object synthesized at `level`.
    #[error("cannot insert group at level {level}: {source}")]
    GroupInsertion {
        /// Recursion level of the failed insertion.
        level: u32,
        /// Tree failure.
        #[source]
        source: TopologyError,
    },
}

define_error_codes! {
    /// Stable codes describing [`DistanceError`] variants.
    enum DistanceErrorCode for DistanceError {
        /// The same raw index appears twice.
        DuplicateIndex => DuplicateIndex { .. } => "DISTANCES_DUPLICATE_INDEX",
        /// The matrix buffer does not hold `nbobjs * nbobjs` values.
        LengthMismatch => LengthMismatch { .. } => "DISTANCES_LENGTH_MISMATCH",
        /// No index was supplied.
        EmptyMatrix => EmptyMatrix => "DISTANCES_EMPTY_MATRIX",
        /// A matrix value is negative, infinite or NaN.
        InvalidDistance => InvalidDistance { .. } => "DISTANCES_INVALID_DISTANCE",
        /// The configuration string lacks the `:` separator.
        MissingColon => MissingColon => "DISTANCES_MISSING_COLON",
        /// An index token is not an unsigned integer.
        InvalidIndex => InvalidIndex { .. } => "DISTANCES_INVALID_INDEX",
        /// A distance token is not a finite non-negative number.
        InvalidValue => InvalidValue { .. } => "DISTANCES_INVALID_VALUE",
        /// The grouping shorthand does not multiply out to the object count.
        InvalidGrouping => InvalidGrouping { .. } => "DISTANCES_INVALID_GROUPING",
        /// Fewer explicit values than required were supplied.
        NotEnoughValues => NotEnoughValues { .. } => "DISTANCES_NOT_ENOUGH_VALUES",
        /// A raw index has no matching object in the tree.
        UnresolvedIndex => UnresolvedIndex { .. } => "DISTANCES_UNRESOLVED_INDEX",
        /// The matrix is not symmetric.
        Asymmetric => Asymmetric { .. } => "DISTANCES_ASYMMETRIC",
        /// A diagonal entry is not the strict minimum of its row.
        DiagonalNotMinimal => DiagonalNotMinimal { .. } => "DISTANCES_DIAGONAL_NOT_MINIMAL",
        /// The smallest matrix value is zero.
        ZeroLatency => ZeroLatency => "DISTANCES_ZERO_LATENCY",
        /// The tree refused a synthesized Group object.
        GroupInsertion => GroupInsertion { .. } => "DISTANCES_GROUP_INSERTION",
    }
}

impl DistanceError {
    /// Classifies the error into the coarse [`DistanceErrorKind`] taxonomy.
    ///
    /// # Examples
    /// ```
    /// use topodist_core::{DistanceError, DistanceErrorKind};
    ///
    /// assert_eq!(DistanceError::ZeroLatency.kind(), DistanceErrorKind::ValidationFailure);
    /// assert_eq!(DistanceError::MissingColon.kind(), DistanceErrorKind::ParseError);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> DistanceErrorKind {
        match self {
            Self::DuplicateIndex { .. }
            | Self::LengthMismatch { .. }
            | Self::EmptyMatrix
            | Self::InvalidDistance { .. } => DistanceErrorKind::InvalidInput,
            Self::MissingColon
            | Self::InvalidIndex { .. }
            | Self::InvalidValue { .. }
            | Self::InvalidGrouping { .. }
            | Self::NotEnoughValues { .. } => DistanceErrorKind::ParseError,
            Self::UnresolvedIndex { .. } => DistanceErrorKind::UnresolvedReference,
            Self::Asymmetric { .. } | Self::DiagonalNotMinimal { .. } | Self::ZeroLatency => {
                DistanceErrorKind::ValidationFailure
            }
            Self::GroupInsertion { .. } => DistanceErrorKind::TreeConflict,
        }
    }
}

/// A dropped matrix, tagged with the object type it belonged to.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Type whose matrix, normalization or grouping was dropped.
    pub obj_type: ObjType,
    /// Why it was dropped.
    pub error: DistanceError,
}

impl Diagnostic {
    pub(crate) fn new(obj_type: ObjType, error: DistanceError) -> Self {
        Self { obj_type, error }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ignoring {} distances: {} [{}]",
            self.obj_type,
            self.error,
            self.error.code()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DistanceError::DuplicateIndex { index: 1 }, DistanceErrorKind::InvalidInput)]
    #[case(DistanceError::EmptyMatrix, DistanceErrorKind::InvalidInput)]
    #[case(
        DistanceError::InvalidDistance { position: 2, value: -1.0 },
        DistanceErrorKind::InvalidInput
    )]
    #[case(DistanceError::NotEnoughValues { found: 1, expected: 4 }, DistanceErrorKind::ParseError)]
    #[case(DistanceError::UnresolvedIndex { index: 9 }, DistanceErrorKind::UnresolvedReference)]
    #[case(
        DistanceError::Asymmetric { row: 0, col: 1, forward: 1.0, backward: 2.0 },
        DistanceErrorKind::ValidationFailure
    )]
    #[case(
        DistanceError::GroupInsertion { level: 0, source: TopologyError::EmptyCpuset },
        DistanceErrorKind::TreeConflict
    )]
    fn kind_matches_taxonomy(#[case] error: DistanceError, #[case] expected: DistanceErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[rstest]
    fn diagnostic_display_names_type_and_code() {
        let diagnostic = Diagnostic::new(ObjType::NumaNode, DistanceError::MissingColon);
        assert_eq!(
            diagnostic.to_string(),
            "ignoring NUMANode distances: missing colon between indexes and distances \
             [DISTANCES_MISSING_COLON]"
        );
    }

    #[rstest]
    fn topology_codes_are_stable() {
        let err = TopologyError::UnknownType {
            name: "board".into(),
        };
        assert_eq!(err.code().as_str(), "TOPOLOGY_UNKNOWN_TYPE");
        assert_eq!(err.to_string(), "unknown object type `board`");
    }
}
