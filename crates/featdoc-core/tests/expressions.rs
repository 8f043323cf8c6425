use featdoc_core::{Document, PropertyValue, Scalar};
use featdoc_test_utils::chain_document;
use pretty_assertions::assert_eq;

fn feature(doc: &mut Document, name: &str) -> String {
    doc.add_object("App::FeatureTest", Some(name)).unwrap()
}

#[test]
fn test_eval_without_binding() {
    let mut doc = Document::new("Eval");
    let obj = feature(&mut doc, "Obj");
    assert_eq!(doc.eval_expression(&obj, "2 * (5 % 3)").unwrap(), Scalar::Number(4.0));
    assert_eq!(doc.eval_expression(&obj, "10cm + 5mm").unwrap(), Scalar::Number(105.0));
    assert_eq!(doc.eval_expression(&obj, "Integer + 1").unwrap(), Scalar::Number(4712.0));
    assert!(doc.expressions(&obj).unwrap().is_empty());
}

#[test]
fn test_relative_and_absolute_references() {
    let mut doc = chain_document(2);
    doc.set_expression("Label_2", "Float", Some("Label_1.Integer / 2"))
        .unwrap();
    doc.set_expression("Label_2", ".Placement.Base.x", Some(".Float * 2"))
        .unwrap();
    doc.recompute().unwrap();

    assert_eq!(doc.property("Label_2", "Float").unwrap(), &PropertyValue::Float(2355.5));
    assert_eq!(
        doc.eval_expression("Label_2", ".Placement.Base.x").unwrap(),
        Scalar::Number(4711.0)
    );
}

#[test]
fn test_label_references() {
    let mut doc = Document::new("Labels");
    let a = feature(&mut doc, "A");
    let b = feature(&mut doc, "B");
    doc.set_expression(&b, "Integer", Some("<<A>>.Integer - 11")).unwrap();
    doc.recompute().unwrap();
    assert_eq!(doc.property(&b, "Integer").unwrap(), &PropertyValue::Integer(4700));
    assert!(doc.depends_on(&b, &a).unwrap());
}

#[test]
fn test_text_results() {
    let mut doc = Document::new("Text");
    let obj = feature(&mut doc, "Obj");
    doc.set_expression(&obj, "String", Some("Label + <<!>>")).unwrap();
    doc.recompute().unwrap();
    assert_eq!(doc.property(&obj, "String").unwrap().as_str(), Some("Obj!"));
}

#[test]
fn test_expression_adds_dependency_edge() {
    let mut doc = Document::new("Edges");
    let a = feature(&mut doc, "A");
    let b = feature(&mut doc, "B");
    assert!(doc.out_list(&b).unwrap().is_empty());
    doc.set_expression(&b, "Integer", Some("A.Integer")).unwrap();
    assert_eq!(doc.out_list(&b).unwrap(), vec!["A"]);

    doc.set_expression(&b, "Integer", None).unwrap();
    assert!(doc.out_list(&b).unwrap().is_empty());
    assert!(doc.in_list(&a).unwrap().is_empty());
}

#[test]
fn test_rejected_bindings() {
    let mut doc = Document::new("Rejected");
    let a = feature(&mut doc, "A");
    let b = feature(&mut doc, "B");

    let err = doc.set_expression(&a, "Integer", Some("Nope.Integer + 1")).unwrap_err();
    assert!(err.is_attribute_error());
    let err = doc.set_expression(&a, "Integer", Some("1 +")).unwrap_err();
    assert!(err.is_value_error());
    let err = doc.set_expression(&a, "NoSuchProperty", Some("1")).unwrap_err();
    assert!(err.is_attribute_error());

    // a link from B to A makes A -> B a cycle
    doc.set_property(&b, "Source1", PropertyValue::Link(Some(a.clone()))).unwrap();
    let err = doc.set_expression(&a, "Integer", Some("B.Integer")).unwrap_err();
    assert!(err.is_dependency_error());
    assert!(doc.expressions(&a).unwrap().is_empty());
}

#[test]
fn test_self_reference_is_a_cycle() {
    let mut doc = Document::new("SelfRef");
    let a = feature(&mut doc, "A");
    let err = doc.set_expression(&a, "Integer", Some("Integer + 1")).unwrap_err();
    assert!(err.is_dependency_error());
}

#[test]
fn test_removing_referenced_object_invalidates_formula() {
    let mut doc = Document::new("Dangling");
    let a = feature(&mut doc, "A");
    let b = feature(&mut doc, "B");
    doc.set_expression(&b, "Integer", Some("A.Integer + 1")).unwrap();
    doc.recompute().unwrap();

    doc.remove_object(&a).unwrap();
    doc.enforce_recompute(&b).unwrap();
    doc.recompute().unwrap();
    assert!(!doc.object(&b).unwrap().is_valid());
}
