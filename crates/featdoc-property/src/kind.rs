//! Property type tags
//!
//! Every property has a [`PropertyKind`], addressed externally by a namespaced
//! type tag such as `App::PropertyInteger`. The kind decides the default
//! value, the accepted assignment shapes and, for links, the link scope.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::error::PropertyError;
use crate::value::{Enumeration, PropertyValue, SubLink};

/// Which objects a link may legally point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkScope {
    /// Same coordinate system only
    Local,
    /// Containment membership
    Child,
    /// Anywhere
    Global,
}

macro_rules! property_kinds {
    ($($variant:ident => $tag:literal),* $(,)?) => {
        /// Semantic property type
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum PropertyKind {
            $($variant,)*
        }

        impl PropertyKind {
            const ALL: &'static [PropertyKind] = &[$(PropertyKind::$variant,)*];

            /// Namespaced type tag
            #[must_use]
            pub fn type_name(self) -> &'static str {
                match self {
                    $(PropertyKind::$variant => $tag,)*
                }
            }
        }
    };
}

property_kinds! {
    Bool => "App::PropertyBool",
    BoolList => "App::PropertyBoolList",
    Integer => "App::PropertyInteger",
    IntegerList => "App::PropertyIntegerList",
    IntegerConstraint => "App::PropertyIntegerConstraint",
    Percent => "App::PropertyPercent",
    Float => "App::PropertyFloat",
    FloatList => "App::PropertyFloatList",
    FloatConstraint => "App::PropertyFloatConstraint",
    Length => "App::PropertyLength",
    Distance => "App::PropertyDistance",
    Angle => "App::PropertyAngle",
    Quantity => "App::PropertyQuantity",
    String => "App::PropertyString",
    StringList => "App::PropertyStringList",
    Path => "App::PropertyPath",
    File => "App::PropertyFile",
    Enumeration => "App::PropertyEnumeration",
    Link => "App::PropertyLink",
    LinkChild => "App::PropertyLinkChild",
    LinkGlobal => "App::PropertyLinkGlobal",
    LinkList => "App::PropertyLinkList",
    LinkListChild => "App::PropertyLinkListChild",
    LinkListGlobal => "App::PropertyLinkListGlobal",
    LinkSub => "App::PropertyLinkSub",
    LinkSubList => "App::PropertyLinkSubList",
    Placement => "App::PropertyPlacement",
    PlacementList => "App::PropertyPlacementList",
    Rotation => "App::PropertyRotation",
    Vector => "App::PropertyVector",
    VectorList => "App::PropertyVectorList",
    Color => "App::PropertyColor",
    ColorList => "App::PropertyColorList",
    FileIncluded => "App::PropertyFileIncluded",
    Map => "App::PropertyMap",
    PythonObject => "App::PropertyPythonObject",
}

impl PropertyKind {
    /// All kinds, in declaration order
    pub fn all() -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied()
    }

    /// Look up a kind by type tag
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::all().find(|k| k.type_name() == name)
    }

    /// Scope of a link kind, `None` for non-link kinds
    #[must_use]
    pub fn link_scope(self) -> Option<LinkScope> {
        match self {
            Self::Link | Self::LinkList | Self::LinkSub | Self::LinkSubList => {
                Some(LinkScope::Local)
            }
            Self::LinkChild | Self::LinkListChild => Some(LinkScope::Child),
            Self::LinkGlobal | Self::LinkListGlobal => Some(LinkScope::Global),
            _ => None,
        }
    }

    /// True for kinds whose values reference objects
    #[inline]
    #[must_use]
    pub fn is_link(self) -> bool {
        self.link_scope().is_some()
    }

    /// Bounds applied when the property is created without explicit ones
    #[must_use]
    pub fn default_constraint(self) -> Option<Constraint> {
        match self {
            Self::Percent => Some(Constraint::percent()),
            _ => None,
        }
    }

    /// Value of a freshly created property
    #[must_use]
    pub fn default_value(self) -> PropertyValue {
        match self {
            Self::Bool => PropertyValue::Bool(false),
            Self::BoolList => PropertyValue::BoolList(Vec::new()),
            Self::Integer | Self::IntegerConstraint | Self::Percent => PropertyValue::Integer(0),
            Self::IntegerList => PropertyValue::IntegerList(Vec::new()),
            Self::Float
            | Self::FloatConstraint
            | Self::Length
            | Self::Distance
            | Self::Angle
            | Self::Quantity => PropertyValue::Float(0.0),
            Self::FloatList => PropertyValue::FloatList(Vec::new()),
            Self::String | Self::Path | Self::File => PropertyValue::String(String::new()),
            Self::StringList => PropertyValue::StringList(Vec::new()),
            Self::Enumeration => PropertyValue::Enumeration(Enumeration::default()),
            Self::Link | Self::LinkChild | Self::LinkGlobal => PropertyValue::Link(None),
            Self::LinkList | Self::LinkListChild | Self::LinkListGlobal => {
                PropertyValue::LinkList(Vec::new())
            }
            Self::LinkSub => PropertyValue::LinkSub(None),
            Self::LinkSubList => PropertyValue::LinkSubList(Vec::new()),
            Self::Placement => PropertyValue::Placement(crate::Placement::default()),
            Self::PlacementList => PropertyValue::PlacementList(Vec::new()),
            Self::Rotation => PropertyValue::Rotation(crate::Rotation::default()),
            Self::Vector => PropertyValue::Vector(crate::Vector3::default()),
            Self::VectorList => PropertyValue::VectorList(Vec::new()),
            Self::Color => PropertyValue::Color(crate::Color::default()),
            Self::ColorList => PropertyValue::ColorList(Vec::new()),
            Self::FileIncluded => PropertyValue::FileIncluded(None),
            Self::Map => PropertyValue::Map(BTreeMap::new()),
            Self::PythonObject => PropertyValue::Object(serde_json::Value::Null),
        }
    }

    /// Convert an incoming value into the shape this kind stores
    ///
    /// `current` is consulted for enumerations, whose labels survive an
    /// assignment by label or index.
    ///
    /// # Errors
    /// [`PropertyError::TypeMismatch`] when the value cannot be converted, or an
    /// enumeration error when a label or index is out of range.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn coerce(
        self,
        property: &str,
        current: &PropertyValue,
        incoming: PropertyValue,
    ) -> Result<PropertyValue, PropertyError> {
        use PropertyValue as V;

        let mismatch = |found: &PropertyValue| PropertyError::TypeMismatch {
            property: property.to_string(),
            expected: self.type_name(),
            found: found.shape(),
        };

        let value = match (self, incoming) {
            (Self::Bool, V::Bool(b)) => V::Bool(b),
            (Self::Bool, V::Integer(i)) => V::Bool(i != 0),
            (Self::Integer | Self::IntegerConstraint | Self::Percent, V::Integer(i)) => {
                V::Integer(i)
            }
            (Self::Integer | Self::IntegerConstraint | Self::Percent, V::Float(f))
                if f.is_finite() =>
            {
                V::Integer(f.round() as i64)
            }
            (Self::Integer | Self::IntegerConstraint | Self::Percent, V::Bool(b)) => {
                V::Integer(i64::from(b))
            }
            (
                Self::Float
                | Self::FloatConstraint
                | Self::Length
                | Self::Distance
                | Self::Angle
                | Self::Quantity,
                V::Float(f),
            ) => V::Float(f),
            (
                Self::Float
                | Self::FloatConstraint
                | Self::Length
                | Self::Distance
                | Self::Angle
                | Self::Quantity,
                V::Integer(i),
            ) => V::Float(i as f64),
            (Self::String | Self::Path | Self::File, V::String(s)) => V::String(s),
            (Self::StringList, V::StringList(s)) => V::StringList(s),
            (Self::BoolList, V::BoolList(b)) => V::BoolList(b),
            (Self::IntegerList, V::IntegerList(i)) => V::IntegerList(i),
            (Self::FloatList, V::FloatList(f)) => V::FloatList(f),
            (Self::FloatList, V::IntegerList(i)) => {
                V::FloatList(i.into_iter().map(|v| v as f64).collect())
            }
            (Self::Enumeration, V::Enumeration(e)) => V::Enumeration(e),
            (Self::Enumeration, V::StringList(labels)) => {
                let mut e = current.as_enumeration().cloned().unwrap_or_default();
                e.set_labels(labels);
                V::Enumeration(e)
            }
            (Self::Enumeration, V::String(label)) => {
                let mut e = current.as_enumeration().cloned().unwrap_or_default();
                e.select_label(property, &label)?;
                V::Enumeration(e)
            }
            (Self::Enumeration, V::Integer(index)) => {
                let mut e = current.as_enumeration().cloned().unwrap_or_default();
                e.select_index(property, index)?;
                V::Enumeration(e)
            }
            (Self::Link | Self::LinkChild | Self::LinkGlobal, V::Link(l)) => V::Link(l),
            (Self::Link | Self::LinkChild | Self::LinkGlobal, V::String(s)) => V::Link(Some(s)),
            (
                Self::LinkList | Self::LinkListChild | Self::LinkListGlobal,
                V::LinkList(l) | V::StringList(l),
            ) => V::LinkList(l),
            (Self::LinkSub, V::LinkSub(l)) => V::LinkSub(l),
            (Self::LinkSub, V::Link(l)) => V::LinkSub(l.map(|o| SubLink::new(o, Vec::new()))),
            (Self::LinkSubList, V::LinkSubList(l)) => V::LinkSubList(l),
            (Self::LinkSubList, V::LinkList(l)) => V::LinkSubList(
                l.into_iter().map(|o| SubLink::new(o, Vec::new())).collect(),
            ),
            (Self::Placement, V::Placement(p)) => V::Placement(p),
            (Self::PlacementList, V::PlacementList(p)) => V::PlacementList(p),
            (Self::Rotation, V::Rotation(r)) => V::Rotation(r),
            (Self::Vector, V::Vector(v)) => V::Vector(v),
            (Self::VectorList, V::VectorList(v)) => V::VectorList(v),
            (Self::Color, V::Color(c)) => V::Color(c),
            (Self::ColorList, V::ColorList(c)) => V::ColorList(c),
            (Self::FileIncluded, V::FileIncluded(f)) => V::FileIncluded(f),
            (Self::FileIncluded, V::String(s)) => V::FileIncluded(Some(s)),
            (Self::Map, V::Map(m)) => V::Map(m),
            (Self::PythonObject, V::Object(o)) => V::Object(o),
            (_, other) => return Err(mismatch(&other)),
        };
        Ok(value)
    }
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for PropertyKind {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_type_name(s).ok_or_else(|| PropertyError::UnknownType(s.to_string()))
    }
}
