//! featdoc Core - Parametric Document Runtime
//!
//! Documents hold typed objects whose properties link them into a dependency
//! graph. A recompute executes changed objects in dependency order; every
//! change can be grouped into named transactions for undo and redo.
//!
//! # Core Concepts
//!
//! - [`Application`]: open documents, shared [`TypeRegistry`] and [`EventBus`]
//! - [`Document`]: objects, recompute, transactions, groups and persistence
//! - [`DocumentObject`]: a named, typed bag of properties with a status
//! - [`ObjectProxy`]: per-object hooks for execution, change callbacks and restore
//! - [`DocumentObserver`]: synchronous receiver of [`DocumentEvent`]s
//!
//! # Example
//!
//! ```rust
//! use featdoc_core::{Application, AppConfig, PropertyValue};
//!
//! let mut app = Application::new(AppConfig::default());
//! let name = app.new_document(Some("Example"), None).unwrap();
//! let doc = app.document_mut(&name).unwrap();
//!
//! let base = doc.add_object("App::FeatureTest", Some("Base")).unwrap();
//! let top = doc.add_object("App::FeatureTest", Some("Top")).unwrap();
//! doc.set_property(&top, "Source1", PropertyValue::Link(Some(base.clone()))).unwrap();
//! doc.set_expression(&top, "Integer", Some("Base.Integer + 1")).unwrap();
//!
//! doc.recompute().unwrap();
//! assert_eq!(doc.property(&top, "Integer").unwrap(), &PropertyValue::Integer(4712));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod application;
pub mod config;
pub mod document;
pub mod error;
pub mod exec;
pub mod extension;
pub mod features;
pub mod notify;
pub mod object;
pub mod proxy;
pub mod registry;
pub mod status;
pub mod transaction;

// Re-exports for convenience
pub use application::Application;
pub use config::AppConfig;
pub use document::{Document, ObjectKey};
pub use error::{DocumentError, ErrorKind, Result};
pub use exec::{ExecContext, ExecError};
pub use extension::{ExtensionKind, GroupRole};
pub use notify::{DocumentEvent, DocumentObserver, EventBus, ObserverId, ObserverScope};
pub use object::DocumentObject;
pub use proxy::{ObjectProxy, ProxyFactory};
pub use registry::{Executor, ObjectType, SharedRegistry, TypeRegistry};
pub use status::ObjectStatus;
pub use transaction::{Transaction, TransactionOp};

pub use featdoc_expr::{Expression, ExpressionError};
pub use featdoc_graph::ObjectId;
pub use featdoc_property::{
    PropertyError, PropertyFlags, PropertyKind, PropertySpec, PropertyValue, Scalar,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with featdoc documents
    pub use crate::{
        AppConfig, Application, Document, DocumentError, DocumentEvent, DocumentObserver,
        ObjectProxy, ObserverScope, PropertyKind, PropertyValue, Result,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
