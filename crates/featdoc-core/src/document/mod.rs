//! The document façade
//!
//! A [`Document`] owns its objects, their dependency graph, the undo log and
//! the transient file area. Every mutation funnels through a small set of
//! internal primitives that emit notifications, keep graph edges current and
//! record undo deltas, so the public operations in the submodules only
//! compose them.

mod expressions;
mod extensions;
mod files;
mod groups;
mod objects;
pub(crate) mod persist;
mod properties;
mod recompute;
mod undo;

use std::collections::HashMap;
use std::sync::Arc;

use featdoc_graph::{DependencyGraph, ObjectId};
use featdoc_property::{PropertyFlags, PropertyKind, PropertySpec, PropertyStore, PropertyValue};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tempfile::TempDir;

use crate::config::AppConfig;
use crate::error::{DocumentError, Result};
use crate::notify::{DocumentEvent, EventBus};
use crate::object::DocumentObject;
use crate::registry::{SharedRegistry, TypeRegistry};
use crate::transaction::{Recorded, TransactionOp, UndoManager};

pub use objects::ObjectKey;
pub(crate) use properties::Origin;

/// Container of objects with recompute, undo and persistence
pub struct Document {
    name: String,
    properties: PropertyStore,
    objects: IndexMap<String, DocumentObject>,
    ids: HashMap<ObjectId, String>,
    graph: DependencyGraph,
    next_id: u64,
    undo: UndoManager,
    registry: SharedRegistry,
    bus: Arc<EventBus>,
    config: AppConfig,
    active_object: Option<String>,
    auto_created: bool,
    transient: OnceCell<TempDir>,
    file_slot: u64,
}

impl Document {
    /// Standalone document with the built-in types and its own event bus
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::create(
            name,
            name,
            AppConfig::default(),
            TypeRegistry::with_builtins().shared(),
            Arc::new(EventBus::new()),
        )
    }

    pub(crate) fn create(
        name: &str,
        label: &str,
        config: AppConfig,
        registry: SharedRegistry,
        bus: Arc<EventBus>,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let mut properties = PropertyStore::new();
        let specs = [
            PropertySpec::new(PropertyKind::String, "Label").value(label),
            PropertySpec::new(PropertyKind::String, "Comment"),
            PropertySpec::new(PropertyKind::String, "FileName").flags(PropertyFlags::READ_ONLY),
            PropertySpec::new(PropertyKind::String, "Uid")
                .value(uuid::Uuid::new_v4().to_string())
                .flags(PropertyFlags::READ_ONLY),
            PropertySpec::new(PropertyKind::String, "CreationDate")
                .value(now.clone())
                .flags(PropertyFlags::READ_ONLY),
            PropertySpec::new(PropertyKind::String, "LastModifiedDate").value(now),
        ];
        for spec in specs {
            if let Err(e) = properties.add(spec, false) {
                tracing::error!(error = %e, "invalid document property declaration");
            }
        }
        Self {
            name: name.to_string(),
            properties,
            objects: IndexMap::new(),
            ids: HashMap::new(),
            graph: DependencyGraph::new(),
            next_id: 1,
            undo: UndoManager::new(config.undo_enabled, config.max_undo_depth),
            registry,
            bus,
            config,
            active_object: None,
            auto_created: false,
            transient: OnceCell::new(),
            file_slot: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.doc_string("Label")
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        self.doc_string("Comment")
    }

    /// Path of the last save or open, empty if never saved
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.doc_string("FileName")
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        self.doc_string("Uid")
    }

    /// Document-level properties (`Label`, `Comment`, `FileName`, ...)
    #[inline]
    #[must_use]
    pub fn document_properties(&self) -> &PropertyStore {
        &self.properties
    }

    fn doc_string(&self, name: &str) -> &str {
        self.properties
            .get(name)
            .and_then(|p| p.value().as_str())
            .unwrap_or_default()
    }

    /// Change the document label
    ///
    /// # Errors
    /// Never fails today; kept fallible like every other mutation.
    pub fn set_label(&mut self, label: &str) -> Result<()> {
        self.set_document_property("Label", PropertyValue::from(label))?;
        self.emit(DocumentEvent::DocumentRelabeled {
            document: self.name.clone(),
        });
        Ok(())
    }

    /// Change the document comment
    ///
    /// # Errors
    /// Never fails today; kept fallible like every other mutation.
    pub fn set_comment(&mut self, comment: &str) -> Result<()> {
        self.set_document_property("Comment", PropertyValue::from(comment))
    }

    pub(crate) fn set_document_property(&mut self, property: &str, value: PropertyValue) -> Result<()> {
        let prepared = self.properties.require(property)?.prepare(value)?;
        self.emit(DocumentEvent::DocumentBeforeChange {
            document: self.name.clone(),
            property: property.to_string(),
        });
        self.properties.require_mut(property)?.replace_value(prepared);
        self.emit(DocumentEvent::DocumentChanged {
            document: self.name.clone(),
            property: property.to_string(),
        });
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry shared with the owning application
    #[inline]
    #[must_use]
    pub fn types(&self) -> &SharedRegistry {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    #[inline]
    #[must_use]
    pub fn is_auto_created(&self) -> bool {
        self.auto_created
    }

    #[inline]
    pub fn set_auto_created(&mut self, auto_created: bool) {
        self.auto_created = auto_created;
    }

    pub(crate) fn emit(&self, event: DocumentEvent) {
        self.bus.emit(&event);
    }

    /// Object by name
    #[must_use]
    pub fn object(&self, name: &str) -> Option<&DocumentObject> {
        self.objects.get(name)
    }

    /// Object by stable id
    #[must_use]
    pub fn object_by_id(&self, id: ObjectId) -> Option<&DocumentObject> {
        self.ids.get(&id).and_then(|name| self.objects.get(name))
    }

    /// First object carrying this label
    #[must_use]
    pub fn object_by_label(&self, label: &str) -> Option<&DocumentObject> {
        self.objects.values().find(|o| o.label() == label)
    }

    /// Objects in insertion order
    pub fn objects(&self) -> impl Iterator<Item = &DocumentObject> {
        self.objects.values()
    }

    #[must_use]
    pub fn object_names(&self) -> Vec<&str> {
        self.objects.keys().map(String::as_str).collect()
    }

    #[inline]
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Most recently added object still in the document
    #[must_use]
    pub fn active_object(&self) -> Option<&DocumentObject> {
        self.active_object.as_deref().and_then(|n| self.objects.get(n))
    }

    pub(crate) fn require(&self, name: &str) -> Result<&DocumentObject> {
        self.objects
            .get(name)
            .ok_or_else(|| DocumentError::ObjectNotFound(name.to_string()))
    }

    pub(crate) fn require_mut(&mut self, name: &str) -> Result<&mut DocumentObject> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| DocumentError::ObjectNotFound(name.to_string()))
    }

    fn id_of(&self, name: &str) -> Option<ObjectId> {
        self.objects.get(name).map(DocumentObject::id)
    }

    fn name_of(&self, id: ObjectId) -> Option<&str> {
        self.object_by_id(id).map(DocumentObject::name)
    }

    fn names_of(&self, ids: Vec<ObjectId>) -> Vec<&str> {
        ids.into_iter().filter_map(|id| self.name_of(id)).collect()
    }

    /// Recompute the out-edges of one object from its links and expressions
    pub(crate) fn refresh_edges(&mut self, name: &str) -> Result<()> {
        let object = self.require(name)?;
        let id = object.id();
        let targets: Vec<ObjectId> = object
            .referenced_names()
            .into_iter()
            .filter_map(|n| self.id_of(n))
            .collect();
        self.graph.set_out_edges(id, targets)?;
        Ok(())
    }

    pub(crate) fn rebuild_all_edges(&mut self) -> Result<()> {
        let names: Vec<String> = self.objects.keys().cloned().collect();
        for name in names {
            self.refresh_edges(&name)?;
        }
        Ok(())
    }

    /// Log a delta according to the origin of the change
    pub(crate) fn record(&mut self, op: TransactionOp, origin: Origin) {
        if origin == Origin::Replay {
            return;
        }
        match self.undo.record(op) {
            Recorded::Opened(name) => {
                tracing::debug!(document = %self.name, transaction = %name, "transaction opened");
                self.emit(DocumentEvent::TransactionOpened {
                    document: self.name.clone(),
                    name,
                });
            }
            Recorded::Appended => {}
            Recorded::Dropped if origin == Origin::Internal => {}
            Recorded::Dropped => self.undo.discard_redo(),
        }
    }

    /// Identifier-safe, unused object name derived from `base`
    pub(crate) fn unique_object_name(&self, base: &str) -> String {
        let base = sanitize_name(base);
        if !self.objects.contains_key(&base) {
            return base;
        }
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        (1u32..)
            .map(|i| format!("{stem}{i:03}"))
            .find(|n| !self.objects.contains_key(n))
            .unwrap_or(base)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("label", &self.label())
            .field("objects", &self.objects.len())
            .field("undo", &self.undo)
            .finish_non_exhaustive()
    }
}

/// Replace characters that cannot appear in an identifier
pub(crate) fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        name.push_str("Unnamed");
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_sanitized() {
        assert_eq!(sanitize_name("My Box"), "My_Box");
        assert_eq!(sanitize_name("1st"), "_1st");
        assert_eq!(sanitize_name(""), "Unnamed");
    }

    #[test]
    fn unique_names_get_numbered_suffix() {
        let mut doc = Document::new("Names");
        doc.add_object("App::FeatureTest", Some("Test")).unwrap();
        let second = doc.add_object("App::FeatureTest", Some("Test")).unwrap();
        let third = doc.add_object("App::FeatureTest", Some("Test")).unwrap();
        assert_eq!(second, "Test001");
        assert_eq!(third, "Test002");
        let default = doc.add_object("App::FeatureTest", None).unwrap();
        assert_eq!(default, "FeatureTest");
    }

    #[test]
    fn id_lookup_follows_removal_and_undo() {
        let mut doc = Document::new("Ids");
        let a = doc.add_object("App::FeatureTest", Some("A")).unwrap();
        let id = doc.object(&a).unwrap().id();
        assert_eq!(doc.object_by_id(id).unwrap().name(), "A");

        doc.open_transaction("remove");
        doc.remove_object(&a).unwrap();
        doc.commit_transaction();
        assert!(doc.object_by_id(id).is_none());

        assert!(doc.undo().unwrap());
        assert_eq!(doc.object_by_id(id).unwrap().name(), "A");
        assert_eq!(doc.names_of(vec![id]), vec!["A"]);
    }

    #[test]
    fn document_properties_are_initialised() {
        let doc = Document::new("Props");
        assert_eq!(doc.label(), "Props");
        assert!(doc.file_name().is_empty());
        assert_eq!(doc.uid().len(), 36);
    }
}
