use featdoc_core::{Document, PropertyFlags, PropertyValue};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn feature_test() -> (Document, String) {
    let mut doc = Document::new("Properties");
    let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
    (doc, obj)
}

#[test]
fn test_declaration_metadata() {
    let (doc, obj) = feature_test();
    assert_eq!(doc.type_of_property(&obj, "TypeReadOnly").unwrap(), vec!["ReadOnly"]);
    assert_eq!(doc.type_of_property(&obj, "TypeTransient").unwrap(), vec!["Transient"]);
    assert!(doc.type_of_property(&obj, "Integer").unwrap().is_empty());
    assert_eq!(
        doc.enumerations_of_property(&obj, "Enum").unwrap(),
        Some(vec!["Zero".into(), "One".into(), "Two".into(), "Three".into(), "Four".into()])
    );
    assert_eq!(doc.enumerations_of_property(&obj, "Integer").unwrap(), None);
    assert!(doc.properties_list(&obj).unwrap().contains(&"ExceptionType"));
}

#[test]
fn test_missing_names_are_attribute_errors() {
    let (mut doc, obj) = feature_test();
    assert!(doc.property(&obj, "Nope").unwrap_err().is_attribute_error());
    assert!(doc.property("Nobody", "Integer").unwrap_err().is_attribute_error());
    assert!(doc.set_property(&obj, "Nope", 1).unwrap_err().is_attribute_error());
}

#[test]
fn test_wrong_shape_is_rejected_and_value_kept() {
    let (mut doc, obj) = feature_test();
    let err = doc.set_property(&obj, "Integer", "not a number").unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(doc.property(&obj, "Integer").unwrap(), &PropertyValue::Integer(4711));
    assert!(!doc.object(&obj).unwrap().is_touched());
}

#[test]
fn test_numeric_coercion() {
    let (mut doc, obj) = feature_test();
    doc.set_property(&obj, "Float", 3).unwrap();
    assert_eq!(doc.property(&obj, "Float").unwrap(), &PropertyValue::Float(3.0));
    doc.set_property(&obj, "Integer", 2.6).unwrap();
    assert_eq!(doc.property(&obj, "Integer").unwrap(), &PropertyValue::Integer(3));
    doc.set_property(&obj, "Bool", 0).unwrap();
    assert_eq!(doc.property(&obj, "Bool").unwrap(), &PropertyValue::Bool(false));
}

#[test]
fn test_enumeration_labels_can_be_replaced() {
    let (mut doc, obj) = feature_test();
    doc.set_property(&obj, "Enum", vec!["A".to_string(), "B".to_string()])
        .unwrap();
    assert_eq!(
        doc.enumerations_of_property(&obj, "Enum").unwrap(),
        Some(vec!["A".into(), "B".into()])
    );
    doc.set_property(&obj, "Enum", "B").unwrap();
    assert_eq!(doc.property(&obj, "Enum").unwrap().as_str(), Some("B"));
}

#[test]
fn test_editor_mode_is_runtime_only() {
    let (mut doc, obj) = feature_test();
    assert!(doc.editor_mode(&obj, "Integer").unwrap().is_empty());
    doc.set_editor_mode(&obj, "Integer", &["ReadOnly", "Hidden"]).unwrap();
    assert_eq!(doc.editor_mode(&obj, "Integer").unwrap(), vec!["ReadOnly", "Hidden"]);
    // the declared flags are unchanged, so external writes still work
    doc.set_property(&obj, "Integer", 1).unwrap();

    let err = doc.set_editor_mode(&obj, "Integer", &["Output"]).unwrap_err();
    assert!(err.is_value_error());
    let err = doc.set_editor_mode(&obj, "Integer", &["Bogus"]).unwrap_err();
    assert!(err.is_value_error());
}

#[test]
fn test_dynamic_properties() {
    let (mut doc, obj) = feature_test();
    doc.add_property(&obj, "App::PropertyLength", "Height", "Shape", "Height of it", PropertyFlags::NONE)
        .unwrap();
    assert_eq!(doc.group_of_property(&obj, "Height").unwrap(), "Shape");
    assert_eq!(doc.documentation_of_property(&obj, "Height").unwrap(), "Height of it");

    let err = doc
        .add_property(&obj, "App::PropertyLength", "Height", "", "", PropertyFlags::NONE)
        .unwrap_err();
    assert!(err.is_structural_error());
    let err = doc
        .add_property(&obj, "App::PropertyNope", "Other", "", "", PropertyFlags::NONE)
        .unwrap_err();
    assert!(err.is_type_error());

    assert!(doc.remove_property(&obj, "Integer").unwrap_err().is_structural_error());
    doc.remove_property(&obj, "Height").unwrap();
    assert!(doc.property(&obj, "Height").is_err());
}

#[test]
fn test_find_objects() {
    let mut doc = Document::new("Find");
    doc.add_object("App::FeatureTest", Some("Box")).unwrap();
    doc.add_object("App::FeatureTest", Some("Box001")).unwrap();
    doc.add_object("App::Part", Some("Part")).unwrap();

    let names = |found: Vec<&featdoc_core::DocumentObject>| {
        found.into_iter().map(|o| o.name().to_string()).collect::<Vec<_>>()
    };
    assert_eq!(names(doc.find_objects(Some("App::FeatureTest"), None, None).unwrap()), vec!["Box", "Box001"]);
    assert_eq!(names(doc.find_objects(None, Some("Box"), None).unwrap()), vec!["Box"]);
    assert_eq!(names(doc.find_objects(Some("App::GeoFeature"), None, None).unwrap()), vec!["Part"]);
    assert!(doc.find_objects(Some("App::Nope"), None, None).unwrap_err().is_type_error());
    assert!(doc
        .find_objects(Some("App::GroupExtension"), None, None)
        .unwrap_err()
        .is_type_error());
}

proptest! {
    #[test]
    fn prop_constraint_int_stays_in_range(value in -10_000i64..10_000) {
        let (mut doc, obj) = feature_test();
        doc.set_property(&obj, "ConstraintInt", value).unwrap();
        let PropertyValue::Integer(stored) = doc.property(&obj, "ConstraintInt").unwrap() else {
            panic!("not an integer");
        };
        prop_assert!((0..=100).contains(stored));
        prop_assert_eq!(*stored, value.clamp(0, 100));
    }

    #[test]
    fn prop_constraint_float_stays_in_range(value in -1.0e4f64..1.0e4) {
        let (mut doc, obj) = feature_test();
        doc.set_property(&obj, "ConstraintFloat", value).unwrap();
        let PropertyValue::Float(stored) = doc.property(&obj, "ConstraintFloat").unwrap() else {
            panic!("not a float");
        };
        prop_assert!((0.0..=100.0).contains(stored));
    }

    #[test]
    fn prop_enum_index_outside_labels_is_rejected(index in -10i64..10) {
        let (mut doc, obj) = feature_test();
        let result = doc.set_property(&obj, "Enum", index);
        if (0..5).contains(&index) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(result.unwrap_err().is_value_error());
            prop_assert_eq!(doc.property(&obj, "Enum").unwrap().as_str(), Some("Four"));
        }
    }
}
