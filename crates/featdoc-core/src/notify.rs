//! Synchronous notification bus
//!
//! Observers are called on the mutating thread, in registration order, while
//! the mutation is in progress. A removed observer receives nothing further,
//! even from a dispatch that is already running.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Something that happened to a document or one of its objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    DocumentCreated { document: String },
    DocumentDeleted { document: String },
    DocumentActivated { document: String },
    DocumentRelabeled { document: String },
    DocumentRestored { document: String },
    DocumentBeforeChange { document: String, property: String },
    DocumentChanged { document: String, property: String },
    DocumentRecomputed { document: String, executed: usize },

    ObjectCreated { document: String, object: String },
    ObjectDeleted { document: String, object: String },
    ObjectBeforeChange { document: String, object: String, property: String },
    ObjectChanged { document: String, object: String, property: String },
    ObjectRecomputed { document: String, object: String },

    DynamicPropertyAdded { document: String, object: String, property: String },
    DynamicPropertyRemoved { document: String, object: String, property: String },
    EditorModeChanged { document: String, object: String, property: String },
    BeforeAddExtension { document: String, object: String, extension: String },
    ExtensionAdded { document: String, object: String, extension: String },

    TransactionOpened { document: String, name: String },
    TransactionCommitted { document: String },
    TransactionAborted { document: String },
    Undo { document: String },
    Redo { document: String },

    SaveStarted { document: String, path: PathBuf },
    SaveFinished { document: String, path: PathBuf },
}

impl DocumentEvent {
    /// Name of the document the event belongs to
    #[must_use]
    pub fn document(&self) -> &str {
        match self {
            Self::DocumentCreated { document }
            | Self::DocumentDeleted { document }
            | Self::DocumentActivated { document }
            | Self::DocumentRelabeled { document }
            | Self::DocumentRestored { document }
            | Self::DocumentBeforeChange { document, .. }
            | Self::DocumentChanged { document, .. }
            | Self::DocumentRecomputed { document, .. }
            | Self::ObjectCreated { document, .. }
            | Self::ObjectDeleted { document, .. }
            | Self::ObjectBeforeChange { document, .. }
            | Self::ObjectChanged { document, .. }
            | Self::ObjectRecomputed { document, .. }
            | Self::DynamicPropertyAdded { document, .. }
            | Self::DynamicPropertyRemoved { document, .. }
            | Self::EditorModeChanged { document, .. }
            | Self::BeforeAddExtension { document, .. }
            | Self::ExtensionAdded { document, .. }
            | Self::TransactionOpened { document, .. }
            | Self::TransactionCommitted { document }
            | Self::TransactionAborted { document }
            | Self::Undo { document }
            | Self::Redo { document }
            | Self::SaveStarted { document, .. }
            | Self::SaveFinished { document, .. } => document,
        }
    }

    /// Name of the object the event is about, if any
    #[must_use]
    pub fn object(&self) -> Option<&str> {
        match self {
            Self::ObjectCreated { object, .. }
            | Self::ObjectDeleted { object, .. }
            | Self::ObjectBeforeChange { object, .. }
            | Self::ObjectChanged { object, .. }
            | Self::ObjectRecomputed { object, .. }
            | Self::DynamicPropertyAdded { object, .. }
            | Self::DynamicPropertyRemoved { object, .. }
            | Self::EditorModeChanged { object, .. }
            | Self::BeforeAddExtension { object, .. }
            | Self::ExtensionAdded { object, .. } => Some(object),
            _ => None,
        }
    }

    /// Short event name, as used in logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DocumentCreated { .. } => "DocumentCreated",
            Self::DocumentDeleted { .. } => "DocumentDeleted",
            Self::DocumentActivated { .. } => "DocumentActivated",
            Self::DocumentRelabeled { .. } => "DocumentRelabeled",
            Self::DocumentRestored { .. } => "DocumentRestored",
            Self::DocumentBeforeChange { .. } => "DocumentBeforeChange",
            Self::DocumentChanged { .. } => "DocumentChanged",
            Self::DocumentRecomputed { .. } => "DocumentRecomputed",
            Self::ObjectCreated { .. } => "ObjectCreated",
            Self::ObjectDeleted { .. } => "ObjectDeleted",
            Self::ObjectBeforeChange { .. } => "ObjectBeforeChange",
            Self::ObjectChanged { .. } => "ObjectChanged",
            Self::ObjectRecomputed { .. } => "ObjectRecomputed",
            Self::DynamicPropertyAdded { .. } => "DynamicPropertyAdded",
            Self::DynamicPropertyRemoved { .. } => "DynamicPropertyRemoved",
            Self::EditorModeChanged { .. } => "EditorModeChanged",
            Self::BeforeAddExtension { .. } => "BeforeAddExtension",
            Self::ExtensionAdded { .. } => "ExtensionAdded",
            Self::TransactionOpened { .. } => "TransactionOpened",
            Self::TransactionCommitted { .. } => "TransactionCommitted",
            Self::TransactionAborted { .. } => "TransactionAborted",
            Self::Undo { .. } => "Undo",
            Self::Redo { .. } => "Redo",
            Self::SaveStarted { .. } => "SaveStarted",
            Self::SaveFinished { .. } => "SaveFinished",
        }
    }
}

/// Receiver of document events
pub trait DocumentObserver: Send + Sync {
    fn on_event(&self, event: &DocumentEvent);
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Which events an observer receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObserverScope {
    All,
    Document(String),
}

impl ObserverScope {
    fn accepts(&self, event: &DocumentEvent) -> bool {
        match self {
            Self::All => true,
            Self::Document(name) => event.document() == name,
        }
    }
}

struct Registration {
    id: ObserverId,
    scope: ObserverScope,
    observer: Arc<dyn DocumentObserver>,
}

/// Registered observers, shared by every document of an application
#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<Registration>>,
    next_id: AtomicU64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn DocumentObserver>, scope: ObserverScope) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push(Registration {
            id,
            scope,
            observer,
        });
        tracing::debug!(observer = id.0, "observer registered");
        id
    }

    /// Returns false if the id was not registered
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|r| r.id != id);
        observers.len() != before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Deliver an event to every interested observer
    ///
    /// The observer list is snapshotted so that observers may subscribe or
    /// unsubscribe from inside `on_event`; each delivery re-checks that the
    /// target is still registered.
    pub fn emit(&self, event: &DocumentEvent) {
        let targets: Vec<(ObserverId, Arc<dyn DocumentObserver>)> = self
            .observers
            .read()
            .iter()
            .filter(|r| r.scope.accepts(event))
            .map(|r| (r.id, Arc::clone(&r.observer)))
            .collect();
        if targets.is_empty() {
            return;
        }
        tracing::trace!(event = event.name(), document = event.document(), "dispatch");
        for (id, observer) in targets {
            if self.observers.read().iter().any(|r| r.id == id) {
                observer.on_event(event);
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl DocumentObserver for Collect {
        fn on_event(&self, event: &DocumentEvent) {
            self.0.lock().push(event.name().to_string());
        }
    }

    fn created(doc: &str) -> DocumentEvent {
        DocumentEvent::DocumentCreated {
            document: doc.into(),
        }
    }

    #[test]
    fn scoped_observer_only_sees_its_document() {
        let bus = EventBus::new();
        let all = Arc::new(Collect::default());
        let one = Arc::new(Collect::default());
        bus.subscribe(all.clone(), ObserverScope::All);
        bus.subscribe(one.clone(), ObserverScope::Document("A".into()));

        bus.emit(&created("A"));
        bus.emit(&created("B"));
        assert_eq!(all.0.lock().len(), 2);
        assert_eq!(one.0.lock().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let obs = Arc::new(Collect::default());
        let id = bus.subscribe(obs.clone(), ObserverScope::All);
        bus.emit(&created("A"));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&created("A"));
        assert_eq!(obs.0.lock().len(), 1);
        assert!(bus.is_empty());
    }

    struct Remover {
        bus: Arc<EventBus>,
        victim: Mutex<Option<ObserverId>>,
    }

    impl DocumentObserver for Remover {
        fn on_event(&self, _event: &DocumentEvent) {
            if let Some(id) = self.victim.lock().take() {
                self.bus.unsubscribe(id);
            }
        }
    }

    #[test]
    fn removal_during_dispatch_is_immediate() {
        let bus = Arc::new(EventBus::new());
        let remover = Arc::new(Remover {
            bus: Arc::clone(&bus),
            victim: Mutex::new(None),
        });
        let victim = Arc::new(Collect::default());
        bus.subscribe(remover.clone(), ObserverScope::All);
        let id = bus.subscribe(victim.clone(), ObserverScope::All);
        *remover.victim.lock() = Some(id);

        bus.emit(&created("A"));
        assert!(victim.0.lock().is_empty());
    }
}
