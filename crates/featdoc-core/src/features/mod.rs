//! Built-in object types
//!
//! Every registry created with [`crate::TypeRegistry::with_builtins`] knows
//! these types. The `FeatureTest*` family exercises the runtime itself: each
//! one has a small executor with observable results and failure modes.

mod cell;
mod test_features;

use featdoc_property::{PropertyFlags, PropertyKind, PropertySpec};

use crate::extension::{GEO_FEATURE_GROUP_EXTENSION, GROUP_EXTENSION, GROUP_EXTENSION_PYTHON};
use crate::registry::ObjectType;

pub use cell::{FEATURE_TEST_ABS_ADDRESS, FEATURE_TEST_COLUMN, FEATURE_TEST_ROW};
pub use test_features::{FEATURE_TEST, FEATURE_TEST_ATTRIBUTE};

pub const DOCUMENT_OBJECT: &str = "App::DocumentObject";
pub const FEATURE_PYTHON: &str = "App::FeaturePython";
pub const GEO_FEATURE: &str = "App::GeoFeature";
pub const DOCUMENT_OBJECT_GROUP: &str = "App::DocumentObjectGroup";
pub const DOCUMENT_OBJECT_GROUP_PYTHON: &str = "App::DocumentObjectGroupPython";
pub const PART: &str = "App::Part";
pub const FILE_INCLUDED: &str = "App::DocumentObjectFileIncluded";

fn placement() -> PropertySpec {
    PropertySpec::new(PropertyKind::Placement, "Placement")
        .group("Base")
        .doc("Position and orientation")
}

pub(crate) fn builtin_types() -> Vec<ObjectType> {
    let mut types = vec![
        ObjectType::new(DOCUMENT_OBJECT).property(
            PropertySpec::new(PropertyKind::String, "Label")
                .group("Base")
                .doc("User name of the object")
                .flags(PropertyFlags::OUTPUT),
        ),
        ObjectType::new(FEATURE_PYTHON).parent(DOCUMENT_OBJECT),
        ObjectType::new(GEO_FEATURE)
            .parent(DOCUMENT_OBJECT)
            .property(placement()),
        ObjectType::new(DOCUMENT_OBJECT_GROUP)
            .parent(DOCUMENT_OBJECT)
            .extension(GROUP_EXTENSION),
        ObjectType::new(DOCUMENT_OBJECT_GROUP_PYTHON)
            .parent(DOCUMENT_OBJECT_GROUP)
            .extension(GROUP_EXTENSION_PYTHON),
        ObjectType::new(PART)
            .parent(GEO_FEATURE)
            .extension(GEO_FEATURE_GROUP_EXTENSION),
        ObjectType::new(FILE_INCLUDED).parent(DOCUMENT_OBJECT).property(
            PropertySpec::new(PropertyKind::FileIncluded, "File")
                .group("Base")
                .doc("File stored with the document"),
        ),
    ];
    types.extend(test_features::types());
    types.extend(cell::types());
    types
}
