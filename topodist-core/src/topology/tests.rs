//! Unit tests for the topology arena and its tree primitives.

use rstest::{fixture, rstest};

use super::*;
use crate::{TopologyError, error::TopologyErrorCode};

#[fixture]
fn four_nodes() -> Topology {
    Topology::synthetic("numanode:4 core:2 pu:1").expect("synthetic description is valid")
}

#[rstest]
fn synthetic_assigns_depths_and_indexes(four_nodes: Topology) {
    let nodes = four_nodes.objects_of_type(ObjType::NumaNode);
    assert_eq!(nodes.len(), 4);
    for (rank, &id) in nodes.iter().enumerate() {
        let node = four_nodes.object(id);
        assert_eq!(node.depth(), 1);
        assert_eq!(node.logical_index() as usize, rank);
        assert_eq!(node.os_index(), Some(rank as u32));
    }
    assert_eq!(four_nodes.object(four_nodes.root()).cpuset().to_string(), "0-7");
    assert_eq!(four_nodes.type_depth(ObjType::Pu), TypeDepth::Depth(3));
    assert_eq!(four_nodes.type_depth(ObjType::Group), TypeDepth::Unknown);
}

#[rstest]
#[case("", TopologyErrorCode::InvalidSynthetic)]
#[case("numanode", TopologyErrorCode::InvalidSynthetic)]
#[case("numanode:0", TopologyErrorCode::InvalidSynthetic)]
#[case("numanode:x", TopologyErrorCode::InvalidSynthetic)]
#[case("pu:2 core:2", TopologyErrorCode::InvalidSynthetic)]
#[case("machine:2", TopologyErrorCode::InvalidSynthetic)]
#[case("board:2", TopologyErrorCode::UnknownType)]
fn synthetic_rejects_malformed_descriptions(
    #[case] description: &str,
    #[case] expected: TopologyErrorCode,
) {
    let err = Topology::synthetic(description).expect_err("description must be rejected");
    assert_eq!(err.code(), expected);
}

#[rstest]
fn find_searches_every_branch(four_nodes: Topology) {
    let core = four_nodes
        .find_by_type_and_os_index(ObjType::Core, 5)
        .expect("core 5 exists");
    assert_eq!(four_nodes.object(core).cpuset().to_string(), "5");
    assert!(four_nodes.find_by_type_and_os_index(ObjType::Core, 8).is_none());
    assert!(four_nodes.find_by_type_and_os_index(ObjType::Package, 0).is_none());
}

#[rstest]
fn covering_object_descends_to_deepest_container(four_nodes: Topology) {
    let within_node = CpuSet::from_range(2..4);
    let covering = four_nodes.covering_object(&within_node).expect("covered");
    assert_eq!(four_nodes.object(covering).obj_type(), ObjType::NumaNode);

    let across_nodes = CpuSet::from_range(1..3);
    let covering = four_nodes.covering_object(&across_nodes).expect("covered");
    assert_eq!(covering, four_nodes.root());

    assert!(four_nodes.covering_object(&CpuSet::new()).is_none());
    assert!(four_nodes.covering_object(&CpuSet::from_range(7..9)).is_none());
}

#[rstest]
fn group_insertion_adopts_members_and_shifts_depths(mut four_nodes: Topology) {
    let inserted = four_nodes
        .insert_by_cpuset(NewObject::group(CpuSet::from_range(4..8), 0))
        .expect("insertion succeeds");
    let Insertion::Created(group) = inserted else {
        panic!("expected a new object, got {inserted:?}");
    };

    let root_children: Vec<ObjType> = four_nodes
        .object(four_nodes.root())
        .children()
        .iter()
        .map(|&id| four_nodes.object(id).obj_type())
        .collect();
    assert_eq!(
        root_children,
        vec![ObjType::NumaNode, ObjType::NumaNode, ObjType::Group]
    );
    assert_eq!(four_nodes.object(group).group_depth(), Some(0));
    assert_eq!(four_nodes.type_depth(ObjType::NumaNode), TypeDepth::Multiple);

    let node3 = four_nodes
        .find_by_type_and_os_index(ObjType::NumaNode, 3)
        .expect("node 3 exists");
    assert_eq!(four_nodes.object(node3).parent(), Some(group));
    assert_eq!(four_nodes.object(node3).depth(), 2);
    assert_eq!(four_nodes.object(node3).logical_index(), 1);
}

#[rstest]
fn insertion_keeps_left_to_right_order(mut four_nodes: Topology) {
    four_nodes
        .insert_by_cpuset(NewObject::group(CpuSet::from_range(4..8), 0))
        .expect("second half");
    four_nodes
        .insert_by_cpuset(NewObject::group(CpuSet::from_range(0..4), 0))
        .expect("first half");
    let groups = four_nodes.objects_of_type(ObjType::Group);
    let sets: Vec<String> = groups
        .iter()
        .map(|&id| four_nodes.object(id).cpuset().to_string())
        .collect();
    assert_eq!(sets, vec!["0-3", "4-7"]);
}

#[rstest]
fn insertion_with_existing_cpuset_merges(mut four_nodes: Topology) {
    let node1 = four_nodes
        .find_by_type_and_os_index(ObjType::NumaNode, 1)
        .expect("node 1 exists");
    let before = four_nodes.len();
    let inserted = four_nodes
        .insert_by_cpuset(NewObject::group(CpuSet::from_range(2..4), 0))
        .expect("merge succeeds");
    assert_eq!(inserted, Insertion::Merged(node1));
    assert_eq!(four_nodes.len(), before);
}

#[rstest]
#[case(CpuSet::new(), TopologyErrorCode::EmptyCpuset)]
#[case(CpuSet::from_range(6..10), TopologyErrorCode::OutsideRoot)]
#[case(CpuSet::from_range(1..4), TopologyErrorCode::Conflict)]
fn insertion_rejects_unplaceable_cpusets(
    mut four_nodes: Topology,
    #[case] cpuset: CpuSet,
    #[case] expected: TopologyErrorCode,
) {
    let before = four_nodes.len();
    let err = four_nodes
        .insert_by_cpuset(NewObject::group(cpuset, 0))
        .expect_err("insertion must fail");
    assert_eq!(err.code(), expected);
    assert_eq!(four_nodes.len(), before);
}

#[rstest]
fn parse_type_names() {
    assert_eq!("NUMANode".parse::<ObjType>(), Ok(ObjType::NumaNode));
    assert_eq!(" pu ".parse::<ObjType>(), Ok(ObjType::Pu));
    assert_eq!("node".parse::<ObjType>(), Ok(ObjType::NumaNode));
    assert!(matches!(
        "board".parse::<ObjType>(),
        Err(TopologyError::UnknownType { .. })
    ));
}
