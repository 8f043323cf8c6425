//! A single typed property slot

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::error::PropertyError;
use crate::flags::PropertyFlags;
use crate::kind::PropertyKind;
use crate::path::is_identifier;
use crate::value::PropertyValue;

/// Declaration of a property: everything except its runtime state
///
/// Used to create properties, and recorded verbatim so that a removed
/// dynamic property can be recreated identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub kind: PropertyKind,
    pub group: String,
    pub documentation: String,
    pub flags: PropertyFlags,
    pub value: Option<PropertyValue>,
    pub constraint: Option<Constraint>,
}

impl PropertySpec {
    /// Declaration with default group, no documentation and no flags
    #[must_use]
    pub fn new(kind: PropertyKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            group: String::new(),
            documentation: String::new(),
            flags: PropertyFlags::NONE,
            value: None,
            constraint: kind.default_constraint(),
        }
    }

    /// With group label
    #[inline]
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// With documentation text
    #[inline]
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.documentation = doc.into();
        self
    }

    /// With flags
    #[inline]
    #[must_use]
    pub fn flags(mut self, flags: PropertyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// With initial value
    #[inline]
    #[must_use]
    pub fn value(mut self, value: impl Into<PropertyValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// With numeric bounds
    #[inline]
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// Typed property slot owned by one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    name: String,
    kind: PropertyKind,
    group: String,
    documentation: String,
    flags: PropertyFlags,
    editor_mode: PropertyFlags,
    value: PropertyValue,
    constraint: Option<Constraint>,
    dynamic: bool,
    #[serde(skip)]
    touched: bool,
}

impl Property {
    /// Materialize a declaration
    ///
    /// # Errors
    /// Fails if the name is not an identifier or the initial value does not
    /// fit the kind.
    pub fn from_spec(spec: PropertySpec, dynamic: bool) -> Result<Self, PropertyError> {
        if !is_identifier(&spec.name) {
            return Err(PropertyError::InvalidName(spec.name));
        }
        let default = spec.kind.default_value();
        let mut prop = Self {
            name: spec.name,
            kind: spec.kind,
            group: spec.group,
            documentation: spec.documentation,
            flags: spec.flags,
            editor_mode: PropertyFlags::NONE,
            value: default,
            constraint: spec.constraint,
            dynamic,
            touched: false,
        };
        if let Some(value) = spec.value {
            prop.value = prop.prepare(value)?;
        }
        Ok(prop)
    }

    /// Declaration that recreates this property with its current value
    #[must_use]
    pub fn to_spec(&self) -> PropertySpec {
        PropertySpec {
            name: self.name.clone(),
            kind: self.kind,
            group: self.group.clone(),
            documentation: self.documentation.clone(),
            flags: self.flags,
            value: Some(self.value.clone()),
            constraint: self.constraint,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[inline]
    #[must_use]
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    #[inline]
    pub fn set_flags(&mut self, flags: PropertyFlags) {
        self.flags = flags;
    }

    /// Runtime editor mode (`ReadOnly`/`Hidden`), independent of the declared flags
    #[inline]
    #[must_use]
    pub fn editor_mode(&self) -> PropertyFlags {
        self.editor_mode
    }

    #[inline]
    pub fn set_editor_mode(&mut self, mode: PropertyFlags) {
        self.editor_mode = mode;
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    #[inline]
    #[must_use]
    pub fn constraint(&self) -> Option<Constraint> {
        self.constraint
    }

    /// True for properties added at runtime rather than by the object type
    #[inline]
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Rejects external assignment; editor mode is a display hint and does not count
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.flags.contains(PropertyFlags::READ_ONLY)
    }

    #[inline]
    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    #[inline]
    pub fn set_touched(&mut self, touched: bool) {
        self.touched = touched;
    }

    /// Coerce and clamp a value without storing it
    ///
    /// # Errors
    /// Fails if the value does not fit the kind.
    pub fn prepare(&self, incoming: PropertyValue) -> Result<PropertyValue, PropertyError> {
        let value = self.kind.coerce(&self.name, &self.value, incoming)?;
        Ok(match (value, self.constraint) {
            (PropertyValue::Integer(i), Some(c)) => PropertyValue::Integer(c.clamp_i64(i)),
            (PropertyValue::Float(f), Some(c)) => PropertyValue::Float(c.clamp_f64(f)),
            (value, _) => value,
        })
    }

    /// Coerce, clamp and store a value, returning the previous one
    ///
    /// # Errors
    /// Fails if the value does not fit the kind; the old value is kept.
    pub fn assign(&mut self, incoming: PropertyValue) -> Result<PropertyValue, PropertyError> {
        let value = self.prepare(incoming)?;
        Ok(std::mem::replace(&mut self.value, value))
    }

    /// Store a value that is already known to fit, returning the previous one
    pub fn replace_value(&mut self, value: PropertyValue) -> PropertyValue {
        std::mem::replace(&mut self.value, value)
    }
}
