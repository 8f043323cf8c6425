//! featdoc Property Store
//!
//! Typed, flagged, optionally constrained properties owned by document objects.
//!
//! # Core Concepts
//!
//! - [`PropertyKind`]: semantic type addressed by a tag such as `App::PropertyInteger`
//! - [`PropertyValue`]: the payload; links hold object names
//! - [`PropertyFlags`]: read-only, transient, hidden, output, no-recompute, no-persist
//! - [`PropertyStore`]: ordered per-object registry with dump/restore
//! - [`PropertyPath`]: addressing of value components like `Placement.Base.x`
//!
//! # Example
//!
//! ```rust
//! use featdoc_property::{PropertyKind, PropertySpec, PropertyStore, PropertyValue, Constraint};
//!
//! let mut store = PropertyStore::new();
//! store
//!     .add(
//!         PropertySpec::new(PropertyKind::IntegerConstraint, "Level")
//!             .constraint(Constraint::new(0.0, 100.0, 1.0)),
//!         true,
//!     )
//!     .unwrap();
//! store.assign("Level", PropertyValue::Integer(500)).unwrap();
//! assert_eq!(store.value("Level").unwrap(), &PropertyValue::Integer(100));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod codec;
mod constraint;
mod error;
mod flags;
mod kind;
mod path;
mod property;
mod store;
mod value;

pub use codec::{decode, dump, encode, load, PersistedProperty, PropertiesDump};
pub use constraint::Constraint;
pub use error::PropertyError;
pub use flags::PropertyFlags;
pub use kind::{LinkScope, PropertyKind};
pub use path::{is_identifier, PathError, PropertyPath};
pub use property::{Property, PropertySpec};
pub use store::PropertyStore;
pub use value::{Color, Enumeration, Placement, PropertyValue, Rotation, Scalar, SubLink, Vector3};
