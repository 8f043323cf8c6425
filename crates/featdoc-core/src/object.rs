//! Document objects

use std::sync::Arc;

use featdoc_expr::ExpressionEngine;
use featdoc_graph::ObjectId;
use featdoc_property::{Property, PropertyStore, PropertyValue};

use crate::proxy::ObjectProxy;
use crate::status::ObjectStatus;

/// A named, typed entity owned by one document
///
/// Documents hand out shared references only; mutation goes through the
/// document so that notifications, dependency edges and undo records stay
/// consistent.
#[derive(Clone)]
pub struct DocumentObject {
    id: ObjectId,
    name: String,
    type_name: String,
    pub(crate) properties: PropertyStore,
    /// Extensions implied by the type, never removable or saved
    pub(crate) implied_extensions: Vec<String>,
    /// Extensions added at runtime
    pub(crate) extensions: Vec<String>,
    pub(crate) status: ObjectStatus,
    pub(crate) exec_count: u64,
    pub(crate) expressions: ExpressionEngine,
    pub(crate) proxy: Option<Arc<dyn ObjectProxy>>,
}

impl DocumentObject {
    pub(crate) fn new(id: ObjectId, name: String, type_name: String, properties: PropertyStore) -> Self {
        Self {
            id,
            name,
            type_name,
            properties,
            implied_extensions: Vec::new(),
            extensions: Vec::new(),
            status: ObjectStatus::NONE,
            exec_count: 0,
            expressions: ExpressionEngine::new(),
            proxy: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Display name; falls back to the object name
    #[must_use]
    pub fn label(&self) -> &str {
        self.properties
            .get("Label")
            .and_then(|p| p.value().as_str())
            .unwrap_or(&self.name)
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// Direct store access, used by restore hooks to migrate legacy schemas
    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    #[inline]
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    #[inline]
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name).map(Property::value)
    }

    /// Every attached extension kind, implied ones first
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.implied_extensions
            .iter()
            .chain(self.extensions.iter())
            .map(String::as_str)
    }

    /// Extensions added at runtime
    #[inline]
    #[must_use]
    pub fn dynamic_extensions(&self) -> &[String] {
        &self.extensions
    }

    #[inline]
    #[must_use]
    pub fn status(&self) -> ObjectStatus {
        self.status
    }

    /// Number of execution attempts since creation or restore
    #[inline]
    #[must_use]
    pub fn exec_count(&self) -> u64 {
        self.exec_count
    }

    #[inline]
    #[must_use]
    pub fn expressions(&self) -> &ExpressionEngine {
        &self.expressions
    }

    #[inline]
    #[must_use]
    pub fn proxy(&self) -> Option<&Arc<dyn ObjectProxy>> {
        self.proxy.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.status.contains(ObjectStatus::TOUCHED)
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.status.contains(ObjectStatus::INVALID)
    }

    /// Names of every object referenced by link properties or expressions
    #[must_use]
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let linked = self
            .properties
            .iter()
            .filter(|p| p.kind().is_link())
            .flat_map(|p| p.value().linked_names());
        for name in linked.chain(self.expressions.referenced_objects()) {
            if name != self.name && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub(crate) fn touch(&mut self, status: ObjectStatus) {
        self.status.insert(status);
    }

    pub(crate) fn purge(&mut self) {
        self.status.purge();
        self.properties.purge_touched();
    }
}

impl std::fmt::Debug for DocumentObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("properties", &self.properties.len())
            .field("extensions", &self.extensions().collect::<Vec<_>>())
            .field("status", &self.status)
            .field("exec_count", &self.exec_count)
            .field("proxy", &self.proxy.as_ref().map(|p| p.type_name().to_string()))
            .finish()
    }
}
