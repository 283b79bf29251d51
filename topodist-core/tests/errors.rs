use topodist_core::{
    CpuSet, DistanceError, DistanceErrorCode, DistanceErrorKind, ObjType, TopologyError,
    TopologyErrorCode,
};
use rstest::rstest;

#[rstest]
#[case(DistanceError::DuplicateIndex { index: 1 }, DistanceErrorCode::DuplicateIndex, DistanceErrorKind::InvalidInput)]
#[case(
    DistanceError::LengthMismatch { expected: 4, got: 3 },
    DistanceErrorCode::LengthMismatch,
    DistanceErrorKind::InvalidInput,
)]
#[case(
    DistanceError::InvalidDistance { position: 0, value: f32::INFINITY },
    DistanceErrorCode::InvalidDistance,
    DistanceErrorKind::InvalidInput,
)]
#[case(DistanceError::MissingColon, DistanceErrorCode::MissingColon, DistanceErrorKind::ParseError)]
#[case(
    DistanceError::NotEnoughValues { found: 3, expected: 4 },
    DistanceErrorCode::NotEnoughValues,
    DistanceErrorKind::ParseError,
)]
#[case(
    DistanceError::UnresolvedIndex { index: 9 },
    DistanceErrorCode::UnresolvedIndex,
    DistanceErrorKind::UnresolvedReference,
)]
#[case(DistanceError::ZeroLatency, DistanceErrorCode::ZeroLatency, DistanceErrorKind::ValidationFailure)]
#[case(
    DistanceError::GroupInsertion { level: 0, source: TopologyError::EmptyCpuset },
    DistanceErrorCode::GroupInsertion,
    DistanceErrorKind::TreeConflict,
)]
fn returns_expected_distance_code(
    #[case] error: DistanceError,
    #[case] expected: DistanceErrorCode,
    #[case] kind: DistanceErrorKind,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), expected.as_str());
    assert_eq!(error.kind(), kind);
}

#[rstest]
#[case(TopologyError::UnknownType { name: "board".into() }, TopologyErrorCode::UnknownType)]
#[case(TopologyError::EmptyCpuset, TopologyErrorCode::EmptyCpuset)]
#[case(
    TopologyError::OutsideRoot { cpuset: CpuSet::from_range(8..10) },
    TopologyErrorCode::OutsideRoot,
)]
fn returns_expected_topology_code(#[case] error: TopologyError, #[case] expected: TopologyErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn group_insertion_exposes_tree_source() {
    let error = DistanceError::GroupInsertion {
        level: 2,
        source: TopologyError::EmptyCpuset,
    };
    let source = std::error::Error::source(&error).expect("source is kept");
    assert_eq!(source.to_string(), TopologyError::EmptyCpuset.to_string());
    assert!(error.to_string().starts_with("cannot insert group at level 2"));
}

#[rstest]
fn type_names_round_trip() {
    for obj_type in ObjType::ALL {
        assert_eq!(obj_type.name().parse::<ObjType>(), Ok(obj_type));
    }
}
