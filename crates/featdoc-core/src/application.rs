//! Application registry
//!
//! The [`Application`] owns every open document, the type registry they
//! share, and the event bus their observers hang off.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::AppConfig;
use crate::document::{persist, sanitize_name, Document};
use crate::error::{DocumentError, Result};
use crate::notify::{DocumentEvent, DocumentObserver, EventBus, ObserverId, ObserverScope};
use crate::registry::{SharedRegistry, TypeRegistry};

const DEFAULT_NAME: &str = "Unnamed";

/// Open documents plus the shared registry and event bus
pub struct Application {
    config: AppConfig,
    registry: SharedRegistry,
    bus: Arc<EventBus>,
    documents: IndexMap<String, Document>,
    active: Option<String>,
}

impl Application {
    /// Application with the built-in types and no documents
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            registry: TypeRegistry::with_builtins().shared(),
            bus: Arc::new(EventBus::new()),
            documents: IndexMap::new(),
            active: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry shared by every document of this application
    #[inline]
    #[must_use]
    pub fn types(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Create an empty document and make it active
    ///
    /// `name` is a hint made identifier-safe and unique among open
    /// documents; `label` defaults to the hint. Returns the actual name.
    ///
    /// # Errors
    /// Only if the label cannot be stored.
    pub fn new_document(&mut self, name: Option<&str>, label: Option<&str>) -> Result<String> {
        let hint = name.unwrap_or(DEFAULT_NAME);
        let name = self.unique_document_name(hint);
        let mut document = Document::create(
            &name,
            &name,
            self.config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.bus),
        );
        self.bus.emit(&DocumentEvent::DocumentCreated {
            document: name.clone(),
        });
        document.set_label(label.unwrap_or(hint))?;
        self.documents.insert(name.clone(), document);
        tracing::info!(document = %name, "document created");
        self.set_active_document(&name)?;
        Ok(name)
    }

    /// Open a saved document under a fresh name and make it active
    ///
    /// # Errors
    /// I/O failures, corrupt files and unsupported versions.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let file = persist::read_file(path)?;
        let name = self.unique_document_name(file.name());
        let mut document = Document::create(
            &name,
            &name,
            self.config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.bus),
        );
        self.bus.emit(&DocumentEvent::DocumentCreated {
            document: name.clone(),
        });
        document.apply(file, Some(path))?;
        self.documents.insert(name.clone(), document);
        tracing::info!(document = %name, path = %path.display(), "document opened");
        self.set_active_document(&name)?;
        Ok(name)
    }

    /// Document by name
    #[must_use]
    pub fn document(&self, name: &str) -> Option<&Document> {
        self.documents.get(name)
    }

    #[must_use]
    pub fn document_mut(&mut self, name: &str) -> Option<&mut Document> {
        self.documents.get_mut(name)
    }

    /// Open documents in creation order
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    #[must_use]
    pub fn document_names(&self) -> Vec<&str> {
        self.documents.keys().map(String::as_str).collect()
    }

    /// Close a document, dropping its transient files
    ///
    /// # Errors
    /// [`DocumentError::DocumentNotFound`].
    pub fn close_document(&mut self, name: &str) -> Result<()> {
        let document = self
            .documents
            .shift_remove(name)
            .ok_or_else(|| DocumentError::DocumentNotFound(name.to_string()))?;
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        drop(document);
        tracing::info!(document = name, "document closed");
        self.bus.emit(&DocumentEvent::DocumentDeleted {
            document: name.to_string(),
        });
        Ok(())
    }

    /// # Errors
    /// [`DocumentError::DocumentNotFound`].
    pub fn set_active_document(&mut self, name: &str) -> Result<()> {
        if !self.documents.contains_key(name) {
            return Err(DocumentError::DocumentNotFound(name.to_string()));
        }
        self.active = Some(name.to_string());
        self.bus.emit(&DocumentEvent::DocumentActivated {
            document: name.to_string(),
        });
        Ok(())
    }

    /// The active document; none after it was closed
    #[must_use]
    pub fn active_document(&self) -> Option<&Document> {
        self.active.as_deref().and_then(|n| self.documents.get(n))
    }

    /// Receive events of every document, or of one by name
    pub fn add_observer(&self, observer: Arc<dyn DocumentObserver>, scope: ObserverScope) -> ObserverId {
        self.bus.subscribe(observer, scope)
    }

    /// Returns false if the id was not registered
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Close every document, most recent first
    pub fn teardown(&mut self) {
        while let Some(name) = self.documents.keys().last().cloned() {
            if let Err(e) = self.close_document(&name) {
                tracing::error!(document = %name, error = %e, "teardown failed");
                break;
            }
        }
    }

    fn unique_document_name(&self, hint: &str) -> String {
        let base = sanitize_name(hint);
        if !self.documents.contains_key(&base) {
            return base;
        }
        (1u32..)
            .map(|i| format!("{base}{i}"))
            .find(|n| !self.documents.contains_key(n))
            .unwrap_or(base)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("documents", &self.documents.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .field("registry", &*self.registry.read())
            .finish_non_exhaustive()
    }
}
