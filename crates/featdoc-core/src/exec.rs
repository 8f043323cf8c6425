//! Execution context handed to executors during recompute

use featdoc_expr::{EvalContext, ExpressionError, Scope, Target};
use featdoc_property::{PropertyError, PropertyPath, PropertyValue, Scalar};
use indexmap::IndexMap;

use crate::document::Document;
use crate::object::DocumentObject;

/// Failure of one object's execution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ExecError(String);

impl ExecError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<PropertyError> for ExecError {
    fn from(e: PropertyError) -> Self {
        Self(e.to_string())
    }
}

impl From<ExpressionError> for ExecError {
    fn from(e: ExpressionError) -> Self {
        Self(e.to_string())
    }
}

/// Read-only view of the document plus buffered writes to the executing object
///
/// Writes are collected here and applied once execution returns; reads of
/// the executing object see them immediately. Read-only properties may be
/// written, since execution is an internal mutation.
pub struct ExecContext<'a> {
    document: &'a Document,
    object: &'a DocumentObject,
    writes: IndexMap<String, PropertyValue>,
}

impl<'a> ExecContext<'a> {
    pub(crate) fn new(document: &'a Document, object: &'a DocumentObject) -> Self {
        Self {
            document,
            object,
            writes: IndexMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.document
    }

    /// The executing object, as it was before execution started
    #[inline]
    #[must_use]
    pub fn object(&self) -> &'a DocumentObject {
        self.object
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.object.name()
    }

    /// Current value of a property of the executing object
    ///
    /// # Errors
    /// Fails if the property does not exist.
    pub fn value(&self, property: &str) -> Result<&PropertyValue, ExecError> {
        if let Some(v) = self.writes.get(property) {
            return Ok(v);
        }
        Ok(self.object.properties().value(property)?)
    }

    /// Integer property
    ///
    /// # Errors
    /// Fails if the property is missing or not integral.
    pub fn integer(&self, property: &str) -> Result<i64, ExecError> {
        self.value(property)?
            .as_integer()
            .ok_or_else(|| ExecError::new(format!("property '{property}' is not an integer")))
    }

    /// Text of a string-like property
    ///
    /// # Errors
    /// Fails if the property is missing or not textual.
    pub fn string(&self, property: &str) -> Result<String, ExecError> {
        self.value(property)?
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| ExecError::new(format!("property '{property}' is not a string")))
    }

    /// Boolean property
    ///
    /// # Errors
    /// Fails if the property is missing or not boolean.
    pub fn boolean(&self, property: &str) -> Result<bool, ExecError> {
        self.value(property)?
            .as_bool()
            .ok_or_else(|| ExecError::new(format!("property '{property}' is not a boolean")))
    }

    /// Object referenced by a single-link property
    #[must_use]
    pub fn linked(&self, property: &str) -> Option<&'a DocumentObject> {
        let name = match self.writes.get(property) {
            Some(v) => v.as_link()?.to_string(),
            None => self.object.properties().value(property).ok()?.as_link()?.to_string(),
        };
        self.document.object(&name)
    }

    /// Buffer a write to a property of the executing object
    ///
    /// # Errors
    /// Fails if the property does not exist or the value does not fit.
    pub fn set(&mut self, property: &str, value: impl Into<PropertyValue>) -> Result<(), ExecError> {
        let prepared = self.object.properties().require(property)?.prepare(value.into())?;
        self.writes.insert(property.to_string(), prepared);
        Ok(())
    }

    /// Buffer a write to one component of a property
    ///
    /// # Errors
    /// Fails if the path does not address a writable component.
    pub fn set_component(&mut self, path: &PropertyPath, scalar: &Scalar) -> Result<(), ExecError> {
        let property = path.property_name();
        if path.component().is_empty() {
            return self.set(property, PropertyValue::from(scalar.clone()));
        }
        let mut value = self.value(property)?.clone();
        value.set_component(property, path.component(), scalar)?;
        self.writes.insert(property.to_string(), value);
        Ok(())
    }

    pub(crate) fn into_writes(self) -> IndexMap<String, PropertyValue> {
        self.writes
    }
}

impl Scope for ExecContext<'_> {
    fn owner(&self) -> &str {
        self.object.name()
    }

    fn has_object(&self, name: &str) -> bool {
        self.document.object(name).is_some()
    }

    fn object_by_label(&self, label: &str) -> Option<String> {
        self.document
            .object_by_label(label)
            .map(|o| o.name().to_string())
    }

    fn has_property(&self, object: &str, property: &str) -> bool {
        self.document
            .object(object)
            .is_some_and(|o| o.properties().contains(property))
    }
}

impl EvalContext for ExecContext<'_> {
    fn read(&self, target: &Target) -> Option<Scalar> {
        let property = target.path.property_name();
        let value = if target.object == self.object.name() {
            self.value(property).ok()?
        } else {
            self.document
                .object(&target.object)?
                .properties()
                .value(property)
                .ok()?
        };
        value.component(target.path.component())
    }
}
