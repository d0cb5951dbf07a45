//! Reference paths, case-insensitive lookup and hierarchy.

use hwmeta::model::{CoreVariant, Entity, EntityData, Extension, GenericType};
use hwmeta::{Design, MetadataError, Vlnv};
use rstest::rstest;

use crate::helpers::builders::{core_with_signal, ip};

fn sample() -> Design {
    let mut design = Design::new("top");
    core_with_signal(&mut design, "dma0", "M_AXI", "AWADDR", true);
    design.refresh().unwrap();
    design
}

#[rstest]
#[case("dma0[block]")]
#[case("top:dma0[block]")]
#[case("DMA0[block]")]
#[case("Dma0[block]:m_axi[port]")]
#[case("dma0[block]:M_AXI[port]:awaddr[signal]")]
fn lookup_resolves_spellings(#[case] path: &str) {
    let design = sample();
    assert!(design.lookup(path).is_ok(), "{path} should resolve");
}

#[rstest]
#[case("dma0[port]")]
#[case("dma1[block]")]
#[case("dma0[block]:M_AXI[port]:missing[signal]")]
fn lookup_misses_report_not_found(#[case] path: &str) {
    let design = sample();
    assert!(matches!(
        design.lookup(path),
        Err(MetadataError::NotFound { .. })
    ));
}

#[test]
fn references_follow_the_owner_chain() {
    let design = sample();
    let signal = design.lookup("dma0[block]:M_AXI[port]:AWADDR[signal]").unwrap();
    assert_eq!(
        design.reference(signal).unwrap(),
        "top:dma0[block]:M_AXI[port]:AWADDR[signal]"
    );
    let owners: Vec<&str> = design
        .ancestors(signal)
        .map(|a| design.get(a).unwrap().name())
        .collect();
    assert_eq!(owners, vec!["M_AXI", "dma0", "top"]);
}

#[test]
fn reattaching_rewrites_descendant_references() {
    let mut design = sample();
    let root = design.root();
    let inner = design
        .insert(root, Entity::new("inner", EntityData::module()))
        .unwrap();
    let dma = design.lookup("dma0[block]").unwrap();
    design.attach(dma, inner).unwrap();

    let signal = design
        .lookup("inner[block]:dma0[block]:M_AXI[port]:AWADDR[signal]")
        .unwrap();
    assert_eq!(
        design.reference(signal).unwrap(),
        "top:inner[block]:dma0[block]:M_AXI[port]:AWADDR[signal]"
    );
    assert!(design.lookup("dma0[block]").is_err());
}

#[test]
fn sibling_keys_are_unique_per_generic_type() {
    let mut design = Design::new("top");
    let root = design.root();
    design.insert(root, ip("x")).unwrap();
    let err = design.insert(root, ip("x")).unwrap_err();
    assert!(matches!(err, MetadataError::AlreadyExists { .. }));

    let core = design.lookup("x[block]").unwrap();
    design
        .insert(core, Entity::new("x", EntityData::parameter(Some("1".into()))))
        .unwrap();
    assert_eq!(design.parameter_value(core, "x"), Some("1"));
    assert!(design.child(core, "x", GenericType::Parameter).is_some());
}

#[test]
fn extensions_are_tagged_per_entity() {
    let mut design = sample();
    let dma = design.lookup("dma0[block]").unwrap();
    assert!(design.set_ext(dma, "note", Extension::text("hello")).unwrap().is_none());
    let previous = design.set_ext(dma, "note", Extension::flag(true)).unwrap();
    assert_eq!(previous, Some(Extension::text("hello")));
    assert_eq!(
        design.entity(dma).unwrap().ext().get("note"),
        Some(&Extension::flag(true))
    );
}

#[test]
fn hierarchy_groups_cores_by_path() {
    let mut design = Design::new("top");
    let root = design.root();
    for (name, path) in [("leaf", "a/b/c/leaf"), ("sibling", "a/b/sibling"), ("solo", "solo")] {
        let data = EntityData::core(CoreVariant::Ip, Vlnv::default()).with_hierarchy(path);
        design.insert(root, Entity::new(name, data)).unwrap();
    }
    design.refresh().unwrap();

    let leaf = design.lookup("leaf[block]").unwrap();
    let c = design.hierarchy("a/b/c").unwrap();
    assert_eq!(c.path, "a/b/c");
    assert_eq!(c.core("leaf"), Some(leaf));
    assert!(design.hierarchy("a/b").unwrap().core("sibling").is_some());
    assert!(design.hierarchy_root(root).unwrap().core("solo").is_some());
    assert!(design.hierarchy("a/x").is_err());
}
