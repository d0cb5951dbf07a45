//! Merging designs through the public API.

use hwmeta::model::{BitFieldData, Entity, EntityData, PortKind, RegisterData};
use hwmeta::{Design, MergeOptions, MetadataError};

use crate::helpers::builders::{driven_pair, ip, mapped_pair};

fn with_register(design: &mut Design, name: &str, offset: u64) {
    let port = design.lookup("gpio[block]:S_AXI[port]").unwrap();
    let data = RegisterData {
        offset,
        ..RegisterData::default()
    };
    design
        .insert(port, Entity::new(name, EntityData::Register(data)))
        .unwrap();
}

#[test]
fn disjoint_registers_are_unioned() {
    let (mut ours, _, _) = mapped_pair(0x4000_0000, 0x1_0000);
    with_register(&mut ours, "r1", 0);
    let (mut theirs, _, _) = mapped_pair(0x4000_0000, 0x1_0000);
    with_register(&mut theirs, "r2", 4);

    ours.merge(theirs, MergeOptions::default()).unwrap();

    let port = ours.lookup("gpio[block]:S_AXI[port]").unwrap();
    let names: Vec<&str> = ours
        .registers(port)
        .map(|r| ours.get(r).unwrap().name())
        .collect();
    assert_eq!(names, vec!["r1", "r2"]);
    let r2 = ours.lookup("gpio[block]:S_AXI[port]:r2[register]").unwrap();
    assert_eq!(
        ours.reference(r2).unwrap(),
        "top:gpio[block]:S_AXI[port]:r2[register]"
    );
}

#[test]
fn conflicting_window_leaves_the_target_untouched() {
    let (mut ours, _, subordinate) = mapped_pair(0x4000_0000, 0x1_0000);
    let (mut theirs, _, _) = mapped_pair(0x4000_0000, 0x2_0000);
    theirs.insert(theirs.root(), ip("extra")).unwrap();
    let before = ours.len();

    let err = ours.merge(theirs, MergeOptions::default()).unwrap_err();
    assert!(matches!(err, MetadataError::MergeConflict { field: "range", .. }));
    assert!(err.is_merge_conflict());
    assert_eq!(ours.len(), before);
    assert!(ours.lookup("extra[block]").is_err());
    assert_eq!(ours.address_window(subordinate).unwrap().range, 0x1_0000);
}

#[test]
fn ignoring_address_info_skips_the_window() {
    let (mut ours, _, subordinate) = mapped_pair(0x4000_0000, 0x1_0000);
    let (theirs, _, _) = mapped_pair(0x8000_0000, 0x2_0000);
    let options = MergeOptions {
        ignore_addr_info: true,
        ..MergeOptions::default()
    };
    ours.merge(theirs, options).unwrap();
    assert_eq!(ours.address_window(subordinate).unwrap().base_address, 0x4000_0000);
}

#[test]
fn new_cores_arrive_with_their_connections() {
    let mut ours = Design::new("top");
    ours.insert(ours.root(), ip("a")).unwrap();
    let (theirs, _, _) = driven_pair();

    ours.merge(theirs, MergeOptions::default()).unwrap();

    let q_a = ours.lookup("a[block]:M[port]:q[signal]").unwrap();
    let q_b = ours.lookup("b[block]:S[port]:q[signal]").unwrap();
    assert_eq!(ours.connections(q_a).unwrap(), vec![q_b]);
    assert_eq!(ours.connections(q_b).unwrap(), vec![q_a]);
    assert_eq!(ours.busses(ours.root()).count(), 2);
}

#[test]
fn differently_named_roots_do_not_merge() {
    let mut ours = Design::new("top");
    let theirs = Design::new("other");
    let err = ours.merge(theirs, MergeOptions::default()).unwrap_err();
    assert!(matches!(err, MetadataError::MergeConflict { field: "name", .. }));
}

#[test]
fn external_flag_conflict_can_be_skipped() {
    let build = |external: bool| {
        let mut design = Design::new("top");
        let data = EntityData::port(PortKind::Generic);
        let data = if external { data.external() } else { data };
        design.insert(design.root(), Entity::new("io", data)).unwrap();
        design
    };

    let mut ours = build(false);
    let err = ours.merge(build(true), MergeOptions::default()).unwrap_err();
    assert!(matches!(err, MetadataError::MergeConflict { field: "external", .. }));

    let options = MergeOptions {
        skip_external: true,
        ..MergeOptions::default()
    };
    ours.merge(build(true), options).unwrap();
}

#[test]
fn bitfield_descriptions_must_agree() {
    let build = |description: &str| {
        let (mut design, _, _) = mapped_pair(0x4000_0000, 0x1_0000);
        with_register(&mut design, "ctrl", 0);
        let register = design.lookup("gpio[block]:S_AXI[port]:ctrl[register]").unwrap();
        let field = BitFieldData {
            msb: 3,
            description: description.to_string(),
            ..BitFieldData::default()
        };
        design
            .insert(register, Entity::new("mode", EntityData::BitField(field)))
            .unwrap();
        design
    };

    let mut ours = build("Operating mode");
    let before = ours.len();
    let err = ours
        .merge(build("Reserved"), MergeOptions::default())
        .unwrap_err();

    assert!(matches!(err, MetadataError::MergeConflict { field: "description", .. }));
    assert_eq!(ours.len(), before);
    let mode = ours
        .lookup("gpio[block]:S_AXI[port]:ctrl[register]:mode[bitfield]")
        .unwrap();
    match ours.get(mode).unwrap().data() {
        EntityData::BitField(f) => assert_eq!(f.description, "Operating mode"),
        other => panic!("expected bit field, got {}", other.kind()),
    }

    ours.merge(build("Operating mode"), MergeOptions::default()).unwrap();
}
