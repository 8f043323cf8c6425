use std::sync::Arc;

use featdoc_core::{Document, DocumentObject, GroupRole, ObjectProxy, PropertyValue};
use pretty_assertions::assert_eq;

/// Group proxy refusing every object whose name starts with `No`
struct Picky;

impl ObjectProxy for Picky {
    fn type_name(&self) -> &str {
        "Picky"
    }

    fn allow_object(&self, _group: &DocumentObject, candidate: &DocumentObject) -> bool {
        !candidate.name().starts_with("No")
    }
}

#[test]
fn test_group_roles() {
    let mut doc = Document::new("Roles");
    let plain = doc.add_object("App::DocumentObjectGroup", Some("Plain")).unwrap();
    let part = doc.add_object("App::Part", Some("Part")).unwrap();
    let feature = doc.add_object("App::FeatureTest", Some("Feature")).unwrap();

    assert_eq!(doc.group_role(&plain).unwrap(), Some(GroupRole::Plain));
    assert_eq!(doc.group_role(&part).unwrap(), Some(GroupRole::Geo));
    assert_eq!(doc.group_role(&feature).unwrap(), None);
    assert!(doc.group_objects(&feature).unwrap_err().is_type_error());
}

#[test]
fn test_nested_groups_and_recursive_membership() {
    let mut doc = Document::new("Nested");
    let outer = doc.add_object("App::DocumentObjectGroup", Some("Outer")).unwrap();
    let inner = doc.add_object("App::DocumentObjectGroup", Some("Inner")).unwrap();
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();

    doc.group_add_object(&outer, &inner).unwrap();
    doc.group_add_object(&inner, &obj).unwrap();

    assert!(!doc.group_has_object(&outer, &obj, false).unwrap());
    assert!(doc.group_has_object(&outer, &obj, true).unwrap());
    assert_eq!(doc.parent_group(&obj).unwrap(), Some("Inner"));
    assert_eq!(doc.parent_group(&inner).unwrap(), Some("Outer"));
    assert_eq!(doc.parent_group(&outer).unwrap(), None);
    assert!(doc.group_add_object(&obj, &outer).unwrap_err().is_type_error());
    assert!(doc
        .group_add_object(&inner, &outer)
        .unwrap_err()
        .is_structural_error());
}

#[test]
fn test_adding_twice_reports_nothing_new() {
    let mut doc = Document::new("Twice");
    let group = doc.add_object("App::DocumentObjectGroup", Some("Group")).unwrap();
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    assert_eq!(doc.group_add_object(&group, &obj).unwrap(), vec!["Obj"]);
    assert!(doc.group_add_object(&group, &obj).unwrap().is_empty());
    assert_eq!(doc.group_objects(&group).unwrap(), vec!["Obj"]);
}

#[test]
fn test_proxy_can_refuse_members() {
    let mut doc = Document::new("Refuse");
    let group = doc
        .add_object("App::DocumentObjectGroupPython", Some("Group"))
        .unwrap();
    doc.set_proxy(&group, Arc::new(Picky)).unwrap();
    let yes = doc.add_object("App::FeatureTest", Some("Yes")).unwrap();
    let no = doc.add_object("App::FeatureTest", Some("NoThanks")).unwrap();

    assert_eq!(doc.group_add_object(&group, &yes).unwrap(), vec!["Yes"]);
    assert!(doc.group_add_object(&group, &no).unwrap().is_empty());
    assert_eq!(doc.group_objects(&group).unwrap(), vec!["Yes"]);
}

#[test]
fn test_membership_change_is_undoable() {
    let mut doc = Document::new("Undo");
    let g1 = doc.add_object("App::DocumentObjectGroup", Some("G1")).unwrap();
    let g2 = doc.add_object("App::DocumentObjectGroup", Some("G2")).unwrap();
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    doc.group_add_object(&g1, &obj).unwrap();

    doc.open_transaction("move");
    doc.group_add_object(&g2, &obj).unwrap();
    doc.commit_transaction();
    assert_eq!(doc.parent_group(&obj).unwrap(), Some("G2"));

    doc.undo().unwrap();
    assert_eq!(doc.parent_group(&obj).unwrap(), Some("G1"));
    assert!(doc.group_objects(&g2).unwrap().is_empty());
}

#[test]
fn test_removing_a_member_empties_its_slot() {
    let mut doc = Document::new("Remove");
    let group = doc.add_object("App::DocumentObjectGroup", Some("Group")).unwrap();
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    doc.group_add_object(&group, &obj).unwrap();

    doc.remove_object(&obj).unwrap();
    assert!(doc.group_objects(&group).unwrap().is_empty());
}

#[test]
fn test_geo_groups_are_exclusive() {
    let mut doc = Document::new("Exclusive");
    let p1 = doc.add_object("App::Part", Some("Part1")).unwrap();
    let p2 = doc.add_object("App::Part", Some("Part2")).unwrap();
    let plain = doc.add_object("App::DocumentObjectGroup", Some("Plain")).unwrap();
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();

    doc.group_add_object(&p1, &obj).unwrap();
    doc.group_add_object(&plain, &obj).unwrap();
    doc.group_add_object(&p2, &obj).unwrap();

    assert!(doc.group_objects(&p1).unwrap().is_empty());
    assert_eq!(doc.parent_geo_feature_group(&obj).unwrap(), Some("Part2"));
    // plain membership is independent of geo membership
    assert_eq!(doc.parent_group(&obj).unwrap(), Some("Plain"));
}

#[test]
fn test_geo_group_reached_through_plain_group() {
    let mut doc = Document::new("Through");
    let part = doc.add_object("App::Part", Some("Part")).unwrap();
    let plain = doc.add_object("App::DocumentObjectGroup", Some("Plain")).unwrap();
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();

    doc.group_add_object(&plain, &obj).unwrap();
    doc.group_add_object(&part, &plain).unwrap();
    assert_eq!(doc.parent_geo_feature_group(&obj).unwrap(), Some("Part"));
}

#[test]
fn test_local_link_across_geo_boundary_is_invalid() {
    let mut doc = Document::new("Boundary");
    let part = doc.add_object("App::Part", Some("Part")).unwrap();
    let inside = doc.add_object("App::FeatureTest", Some("Inside")).unwrap();
    let outside = doc.add_object("App::FeatureTest", Some("Outside")).unwrap();
    doc.group_add_object(&part, &inside).unwrap();

    doc.set_property(&outside, "Source1", PropertyValue::Link(Some(inside.clone())))
        .unwrap();
    doc.recompute().unwrap();
    assert!(!doc.object(&outside).unwrap().is_valid());

    doc.group_add_object(&part, &outside).unwrap();
    doc.recompute().unwrap();
    assert!(doc.object(&outside).unwrap().is_valid());
}
