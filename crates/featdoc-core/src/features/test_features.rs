//! `App::FeatureTest`: one property of nearly every kind

use featdoc_property::{Constraint, Enumeration, PropertyFlags, PropertyKind, PropertySpec, PropertyValue};

use super::DOCUMENT_OBJECT;
use crate::exec::{ExecContext, ExecError};
use crate::registry::ObjectType;

pub const FEATURE_TEST: &str = "App::FeatureTest";
pub const FEATURE_TEST_ATTRIBUTE: &str = "App::FeatureTestAttribute";

const GROUP: &str = "Feature Test";

/// Attributes every object answers to besides its properties
const INTRINSIC_ATTRIBUTES: [&str; 3] = ["Name", "TypeId", "ID"];

fn spec(kind: PropertyKind, name: &str) -> PropertySpec {
    PropertySpec::new(kind, name).group(GROUP)
}

pub(super) fn types() -> Vec<ObjectType> {
    use PropertyKind as K;

    let feature_test = ObjectType::new(FEATURE_TEST)
        .parent(DOCUMENT_OBJECT)
        .property(spec(K::Integer, "Integer").value(4711))
        .property(spec(K::Float, "Float").value(47.11))
        .property(spec(K::Bool, "Bool").value(true))
        .property(spec(K::BoolList, "BoolList"))
        .property(spec(K::String, "String").value("4711"))
        .property(spec(K::StringList, "StringList"))
        .property(spec(K::Path, "Path"))
        .property(spec(K::Angle, "Angle").value(3.0))
        .property(spec(K::Distance, "Distance").value(47.11))
        .property(spec(K::Percent, "Percent").constraint(Constraint::percent()))
        .property(
            spec(K::IntegerConstraint, "ConstraintInt")
                .constraint(Constraint::percent())
                .value(5),
        )
        .property(
            spec(K::FloatConstraint, "ConstraintFloat")
                .constraint(Constraint::new(0.0, 100.0, 0.1))
                .value(5.0),
        )
        .property(spec(K::Enumeration, "Enum").value(PropertyValue::Enumeration(
            Enumeration::new(["Zero", "One", "Two", "Three", "Four"], 4),
        )))
        .property(spec(K::IntegerList, "IntegerList"))
        .property(spec(K::FloatList, "FloatList"))
        .property(spec(K::Link, "Link"))
        .property(spec(K::LinkSub, "LinkSub"))
        .property(spec(K::LinkList, "LinkList"))
        .property(spec(K::LinkSubList, "LinkSubList"))
        .property(spec(K::Link, "Source1").doc("Link to the first source object"))
        .property(spec(K::Link, "Source2").doc("Link to the second source object"))
        .property(spec(K::LinkList, "SourceN").doc("Links to further source objects"))
        .property(spec(K::Vector, "Vector"))
        .property(spec(K::VectorList, "VectorList"))
        .property(spec(K::Placement, "Placement"))
        .property(spec(K::PlacementList, "PlacementList"))
        .property(spec(K::Rotation, "Rotation"))
        .property(spec(K::ColorList, "ColourList"))
        .property(spec(K::Integer, "TypeReadOnly").flags(PropertyFlags::READ_ONLY))
        .property(spec(K::Integer, "TypeHidden").flags(PropertyFlags::HIDDEN))
        .property(
            spec(K::Integer, "TypeTransient")
                .flags(PropertyFlags::TRANSIENT)
                .value(4711),
        )
        .property(spec(K::Integer, "TypeOutput").flags(PropertyFlags::OUTPUT))
        .property(
            spec(K::Integer, "TypeNoRecompute")
                .flags(PropertyFlags::NO_RECOMPUTE)
                .value(4711),
        )
        .property(
            spec(K::Integer, "ExceptionType")
                .doc("Non-zero makes execution fail with this kind of error"),
        )
        .property(spec(K::String, "ExecResult").flags(PropertyFlags::OUTPUT))
        .executor(execute_feature_test);

    let attribute = ObjectType::new(FEATURE_TEST_ATTRIBUTE)
        .parent(DOCUMENT_OBJECT)
        .property(spec(K::Link, "Object"))
        .property(spec(K::String, "Attribute").value("Name"))
        .executor(execute_attribute);

    vec![feature_test, attribute]
}

fn execute_feature_test(ctx: &mut ExecContext<'_>) -> Result<(), ExecError> {
    let message = match ctx.integer("ExceptionType")? {
        0 => {
            ctx.set("ExecResult", "Exec OK")?;
            return Ok(());
        }
        1 => "unknown exception raised".to_string(),
        2 => "runtime error raised".to_string(),
        3 => "base exception raised".to_string(),
        4 => "allocation failure raised".to_string(),
        other => format!("exception type {other} raised"),
    };
    Err(ExecError::new(message))
}

/// Fails unless the linked object answers to the named attribute
fn execute_attribute(ctx: &mut ExecContext<'_>) -> Result<(), ExecError> {
    let attribute = ctx.string("Attribute")?;
    let target = ctx
        .linked("Object")
        .ok_or_else(|| ExecError::new("no object linked"))?;
    if INTRINSIC_ATTRIBUTES.contains(&attribute.as_str())
        || target.properties().contains(&attribute)
    {
        Ok(())
    } else {
        Err(ExecError::new(format!(
            "'{}' has no attribute '{attribute}'",
            target.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::document::Document;
    use featdoc_property::PropertyValue;

    #[test]
    fn defaults_and_constraints() {
        let mut doc = Document::new("Defaults");
        let obj = doc.add_object("App::FeatureTest", Some("Label_1")).unwrap();
        assert_eq!(doc.property(&obj, "Integer").unwrap(), &PropertyValue::Integer(4711));
        assert_eq!(doc.property(&obj, "String").unwrap().as_str(), Some("4711"));
        assert_eq!(doc.property(&obj, "Enum").unwrap().as_str(), Some("Four"));
        assert_eq!(
            doc.documentation_of_property(&obj, "Source1").unwrap(),
            "Link to the first source object"
        );
        assert_eq!(doc.group_of_property(&obj, "Source1").unwrap(), "Feature Test");

        doc.set_property(&obj, "ConstraintInt", 500).unwrap();
        doc.set_property(&obj, "ConstraintFloat", -500.0).unwrap();
        assert_eq!(doc.property(&obj, "ConstraintInt").unwrap(), &PropertyValue::Integer(100));
        assert_eq!(doc.property(&obj, "ConstraintFloat").unwrap(), &PropertyValue::Float(0.0));

        doc.set_property(&obj, "Enum", 2).unwrap();
        assert_eq!(doc.property(&obj, "Enum").unwrap().as_str(), Some("Two"));
        let err = doc.set_property(&obj, "Enum", "SurelyNotInThere!").unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn attribute_feature_checks_the_linked_object() {
        let mut doc = Document::new("Attribute");
        let obj = doc.add_object("App::FeatureTestAttribute", Some("Attribute")).unwrap();
        doc.set_property(&obj, "Object", PropertyValue::Link(Some(obj.clone())))
            .unwrap();
        assert!(doc.recompute_object(&obj).unwrap());

        doc.set_property(&obj, "Attribute", "Name123").unwrap();
        doc.recompute().unwrap();
        assert_eq!(doc.object_state(&obj).unwrap(), vec!["Touched", "Invalid"]);
        doc.remove_object(&obj).unwrap();
    }
}
