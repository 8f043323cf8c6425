//! Extension kinds
//!
//! An extension kind is a named bundle of properties that can be attached to
//! an object, either implied by its type or added at runtime. Kinds form a
//! parent chain, so an object holding `App::GroupExtensionPython` also has
//! `App::GroupExtension`.

use featdoc_property::{PropertyKind, PropertySpec};

pub const DOCUMENT_OBJECT_EXTENSION: &str = "App::DocumentObjectExtension";
pub const GROUP_EXTENSION: &str = "App::GroupExtension";
pub const GROUP_EXTENSION_PYTHON: &str = "App::GroupExtensionPython";
pub const GEO_FEATURE_GROUP_EXTENSION: &str = "App::GeoFeatureGroupExtension";
pub const LINK_BASE_EXTENSION: &str = "App::LinkBaseExtension";
pub const LINK_EXTENSION: &str = "App::LinkExtension";
pub const LINK_EXTENSION_PYTHON: &str = "App::LinkExtensionPython";

/// Registered extension kind
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionKind {
    name: String,
    parent: Option<String>,
    attachable: bool,
    properties: Vec<PropertySpec>,
}

impl ExtensionKind {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            attachable: true,
            properties: Vec::new(),
        }
    }

    /// With parent kind
    #[inline]
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Only usable as the base of other kinds
    #[inline]
    #[must_use]
    pub fn not_attachable(mut self) -> Self {
        self.attachable = false;
        self
    }

    /// With a contributed property
    #[inline]
    #[must_use]
    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn is_attachable(&self) -> bool {
        self.attachable
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }
}

/// Containment behaviour conferred by group extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupRole {
    /// Membership only
    Plain,
    /// Membership plus a shared coordinate system
    Geo,
}

impl GroupRole {
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Plain => "group",
            Self::Geo => "geo feature group",
        }
    }
}

fn group_property() -> PropertySpec {
    PropertySpec::new(PropertyKind::LinkListChild, "Group")
        .group("Base")
        .doc("List of referenced objects")
}

pub(crate) fn builtin_kinds() -> Vec<ExtensionKind> {
    vec![
        ExtensionKind::new(DOCUMENT_OBJECT_EXTENSION).not_attachable(),
        ExtensionKind::new(GROUP_EXTENSION)
            .parent(DOCUMENT_OBJECT_EXTENSION)
            .property(group_property()),
        ExtensionKind::new(GROUP_EXTENSION_PYTHON).parent(GROUP_EXTENSION),
        ExtensionKind::new(GEO_FEATURE_GROUP_EXTENSION).parent(GROUP_EXTENSION),
        ExtensionKind::new(LINK_BASE_EXTENSION)
            .parent(DOCUMENT_OBJECT_EXTENSION)
            .not_attachable(),
        ExtensionKind::new(LINK_EXTENSION)
            .parent(LINK_BASE_EXTENSION)
            .property(
                PropertySpec::new(PropertyKind::LinkGlobal, "LinkedObject")
                    .group("Link")
                    .doc("Linked object"),
            ),
        ExtensionKind::new(LINK_EXTENSION_PYTHON).parent(LINK_EXTENSION),
    ]
}
