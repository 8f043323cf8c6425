//! Testing utilities for the featdoc workspace
//!
//! Shared fixtures: an observer that records every event, documents
//! pre-populated with common shapes, and scratch files.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use featdoc_core::{Application, Document, DocumentEvent, DocumentObserver, PropertyValue};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Observer that keeps every event it receives
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<DocumentEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn events(&self) -> Vec<DocumentEvent> {
        self.events.lock().clone()
    }

    /// Event names in arrival order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(DocumentEvent::name).collect()
    }

    /// Names of events about one object, in arrival order
    #[must_use]
    pub fn names_for(&self, object: &str) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.object() == Some(object))
            .map(DocumentEvent::name)
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DocumentObserver for RecordingObserver {
    fn on_event(&self, event: &DocumentEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Application with one empty document; returns the document name
#[must_use]
pub fn setup_app(name: &str) -> (Application, String) {
    let mut app = Application::default();
    let doc = app.new_document(Some(name), None).unwrap();
    (app, doc)
}

/// Document with a chain `Label_1 <- Label_2 <- ... <- Label_n`
///
/// Each object links the previous one through `Source1`.
#[must_use]
pub fn chain_document(length: usize) -> Document {
    let mut doc = Document::new("Chain");
    let mut previous: Option<String> = None;
    for i in 1..=length {
        let name = doc
            .add_object("App::FeatureTest", Some(&format!("Label_{i}")))
            .unwrap();
        if let Some(prev) = previous {
            doc.set_property(&name, "Source1", PropertyValue::Link(Some(prev)))
                .unwrap();
        }
        previous = Some(name);
    }
    doc
}

/// Document with `Top -> {Left, Right} -> Bottom`
#[must_use]
pub fn diamond_document() -> Document {
    let mut doc = Document::new("Diamond");
    for name in ["Bottom", "Left", "Right", "Top"] {
        doc.add_object("App::FeatureTest", Some(name)).unwrap();
    }
    let link = |name: &str| PropertyValue::Link(Some(name.to_string()));
    doc.set_property("Left", "Source1", link("Bottom")).unwrap();
    doc.set_property("Right", "Source1", link("Bottom")).unwrap();
    doc.set_property("Top", "Source1", link("Left")).unwrap();
    doc.set_property("Top", "Source2", link("Right")).unwrap();
    doc
}

/// Scratch directory with a text file in it
#[must_use]
pub fn scratch_file(file_name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(file_name);
    std::fs::write(&path, content).unwrap();
    (dir, path)
}
