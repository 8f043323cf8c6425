use featdoc_core::{Document, PropertyValue};
use featdoc_test_utils::diamond_document;
use pretty_assertions::assert_eq;

fn integer(doc: &Document, object: &str) -> i64 {
    match doc.property(object, "Integer").unwrap() {
        PropertyValue::Integer(v) => *v,
        other => panic!("unexpected value {other:?}"),
    }
}

#[test]
fn test_transaction_names_are_stacked() {
    let mut doc = Document::new("Names");
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    for (i, name) in ["first", "second", "third"].into_iter().enumerate() {
        doc.open_transaction(name);
        doc.set_property(&obj, "Integer", i as i64).unwrap();
        doc.commit_transaction();
    }
    assert_eq!(doc.undo_names(), vec!["third", "second", "first"]);

    doc.undo().unwrap();
    doc.undo().unwrap();
    assert_eq!(doc.undo_names(), vec!["first"]);
    assert_eq!(doc.redo_names(), vec!["second", "third"]);
    assert_eq!(integer(&doc, &obj), 0);
}

#[test]
fn test_empty_transaction_is_not_stacked() {
    let mut doc = Document::new("Empty");
    doc.open_transaction("nothing");
    assert!(doc.has_pending_transaction());
    doc.commit_transaction();
    assert_eq!(doc.undo_count(), 0);
    assert!(!doc.has_pending_transaction());
}

#[test]
fn test_new_change_discards_redo() {
    let mut doc = Document::new("Redo");
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    doc.open_transaction("a");
    doc.set_property(&obj, "Integer", 1).unwrap();
    doc.commit_transaction();
    doc.undo().unwrap();
    assert_eq!(doc.redo_count(), 1);

    doc.open_transaction("b");
    doc.set_property(&obj, "Integer", 2).unwrap();
    doc.commit_transaction();
    assert_eq!(doc.redo_count(), 0);
    assert_eq!(doc.undo_names(), vec!["b"]);
}

#[test]
fn test_unrecorded_change_discards_redo() {
    let mut doc = Document::new("Unrecorded");
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    doc.open_transaction("a");
    doc.set_property(&obj, "Integer", 1).unwrap();
    doc.commit_transaction();
    doc.undo().unwrap();

    doc.set_property(&obj, "Integer", 5).unwrap();
    assert_eq!(doc.redo_count(), 0);
    assert!(!doc.redo().unwrap());
    assert_eq!(integer(&doc, &obj), 5);
}

#[test]
fn test_undo_object_creation_and_removal() {
    let mut doc = Document::new("Lifecycle");
    doc.open_transaction("create");
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    doc.commit_transaction();

    doc.undo().unwrap();
    assert!(doc.object(&obj).is_none());
    doc.redo().unwrap();
    assert!(doc.object(&obj).is_some());

    doc.open_transaction("remove");
    doc.remove_object(&obj).unwrap();
    doc.commit_transaction();
    doc.undo().unwrap();
    assert_eq!(doc.object_names(), vec!["Obj"]);
}

#[test]
fn test_undo_restores_links_of_removed_object() {
    let mut doc = diamond_document();
    doc.open_transaction("remove bottom");
    doc.remove_object("Bottom").unwrap();
    doc.commit_transaction();
    assert!(doc.out_list("Left").unwrap().is_empty());

    doc.undo().unwrap();
    assert_eq!(
        doc.property("Left", "Source1").unwrap(),
        &PropertyValue::Link(Some("Bottom".into()))
    );
    assert_eq!(doc.in_list("Bottom").unwrap().len(), 2);
    assert!(doc.depends_on("Top", "Bottom").unwrap());
}

#[test]
fn test_undo_expression_binding() {
    let mut doc = diamond_document();
    doc.open_transaction("bind");
    doc.set_expression("Top", "Integer", Some("Bottom.Integer * 2"))
        .unwrap();
    doc.commit_transaction();
    assert_eq!(doc.expressions("Top").unwrap().len(), 1);

    doc.undo().unwrap();
    assert!(doc.expressions("Top").unwrap().is_empty());
    doc.redo().unwrap();
    assert_eq!(
        doc.expressions("Top").unwrap(),
        vec![("Integer".to_string(), "Bottom.Integer * 2".to_string())]
    );
}

#[test]
fn test_dynamic_property_round_trip() {
    let mut doc = Document::new("Dynamic");
    let obj = doc.add_object("App::FeaturePython", Some("Obj")).unwrap();
    doc.open_transaction("add");
    doc.add_property(&obj, "App::PropertyInteger", "Count", "Data", "", Default::default())
        .unwrap();
    doc.set_property(&obj, "Count", 3).unwrap();
    doc.commit_transaction();

    doc.undo().unwrap();
    assert!(doc.property(&obj, "Count").is_err());
    doc.redo().unwrap();
    assert_eq!(doc.property(&obj, "Count").unwrap(), &PropertyValue::Integer(3));
}

#[test]
fn test_undo_depth_is_bounded() {
    use featdoc_core::{AppConfig, Application};

    let mut app = Application::new(AppConfig::default().with_max_undo_depth(2));
    let name = app.new_document(Some("Depth"), None).unwrap();
    let doc = app.document_mut(&name).unwrap();
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    for i in 0..4 {
        doc.open_transaction(&format!("t{i}"));
        doc.set_property(&obj, "Integer", i).unwrap();
        doc.commit_transaction();
    }
    assert_eq!(doc.undo_names(), vec!["t3", "t2"]);
}
