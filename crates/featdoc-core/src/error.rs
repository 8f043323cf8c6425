//! Error types for the document runtime
//!
//! Every rejection is reported before any state changes. [`DocumentError::kind`]
//! folds the variants into the caller-facing taxonomy:
//! - type errors: unknown or non-instantiable type tags, wrong key types
//! - value errors: out-of-range enumeration labels, malformed formulas
//! - dependency errors: bindings or links that would close a cycle
//! - attribute errors: missing objects or properties
//! - structural errors: illegal group membership, duplicate extensions

use std::path::PathBuf;

use featdoc_expr::ExpressionError;
use featdoc_graph::GraphError;
use featdoc_property::PropertyError;

/// Taxonomy class of a [`DocumentError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Type,
    Value,
    Dependency,
    Attribute,
    Structural,
    Io,
    Runtime,
}

/// Main document error type
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Type tag is not registered
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// Type is abstract
    #[error("type '{0}' cannot be instantiated")]
    NotInstantiable(String),

    /// Tag names an extension kind where an object type is required
    #[error("'{0}' is not a document object type")]
    NotAnObjectType(String),

    /// Lookup key has the wrong shape
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// No object with this name or id
    #[error("object '{0}' not found")]
    ObjectNotFound(String),

    /// No open document with this name
    #[error("document '{0}' not found")]
    DocumentNotFound(String),

    /// Object exists but lacks the capability the call needs
    #[error("object '{object}' is not a {expected}")]
    WrongObjectKind {
        object: String,
        expected: &'static str,
    },

    /// Membership or extension change would break a structural invariant
    #[error("{0}")]
    Structural(String),

    /// External write to a read-only property
    #[error("property '{object}.{property}' is read-only")]
    ReadOnly { object: String, property: String },

    /// Property store rejection
    #[error(transparent)]
    Property(#[from] PropertyError),

    /// Formula rejection
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// Graph rejection
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Binding would make an object depend on itself through links
    #[error("'{from}' cannot depend on '{to}' without creating a dependency cycle")]
    DependencyCycle { from: String, to: String },

    /// Search pattern is not a valid regular expression
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Object execution failed
    #[error("execution of '{object}' failed: {message}")]
    Execution { object: String, message: String },

    /// Document has never been saved
    #[error("document '{0}' has no file name")]
    NoFileName(String),

    /// Saved file failed its integrity check
    #[error("checksum mismatch in '{}'", path.display())]
    ChecksumMismatch { path: PathBuf },

    /// Saved file uses an unsupported layout version
    #[error("unsupported file version {0}")]
    UnsupportedVersion(u32),

    /// Configuration could not be read
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentError {
    /// Taxonomy class of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownType(_)
            | Self::NotInstantiable(_)
            | Self::NotAnObjectType(_)
            | Self::InvalidKey(_)
            | Self::WrongObjectKind { .. } => ErrorKind::Type,
            Self::ObjectNotFound(_) | Self::DocumentNotFound(_) => ErrorKind::Attribute,
            Self::Structural(_) => ErrorKind::Structural,
            Self::ReadOnly { .. } | Self::Execution { .. } => ErrorKind::Runtime,
            Self::Property(e) if e.is_type_error() => ErrorKind::Type,
            Self::Property(e) if e.is_attribute_error() => ErrorKind::Attribute,
            Self::Property(e) if e.is_value_error() => ErrorKind::Value,
            Self::Property(PropertyError::AlreadyExists(_) | PropertyError::StaticProperty(_)) => {
                ErrorKind::Structural
            }
            Self::Property(_) => ErrorKind::Io,
            Self::Expression(ExpressionError::Cycle { .. })
            | Self::Graph(_)
            | Self::DependencyCycle { .. } => ErrorKind::Dependency,
            Self::Expression(ExpressionError::UnknownIdentifier(_)) => ErrorKind::Attribute,
            Self::Expression(_) | Self::InvalidPattern(_) => ErrorKind::Value,
            Self::NoFileName(_)
            | Self::ChecksumMismatch { .. }
            | Self::UnsupportedVersion(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Io,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_type_error(&self) -> bool {
        self.kind() == ErrorKind::Type
    }

    #[inline]
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        self.kind() == ErrorKind::Value
    }

    #[inline]
    #[must_use]
    pub fn is_dependency_error(&self) -> bool {
        self.kind() == ErrorKind::Dependency
    }

    #[inline]
    #[must_use]
    pub fn is_attribute_error(&self) -> bool {
        self.kind() == ErrorKind::Attribute
    }

    #[inline]
    #[must_use]
    pub fn is_structural_error(&self) -> bool {
        self.kind() == ErrorKind::Structural
    }

    pub(crate) fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }
}

/// Result alias used throughout the crate
pub type Result<T, E = DocumentError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_errors_map_to_taxonomy() {
        let e: DocumentError = PropertyError::UnknownType("App::Nope".into()).into();
        assert!(e.is_type_error());
        let e: DocumentError = PropertyError::NotFound("X".into()).into();
        assert!(e.is_attribute_error());
        let e: DocumentError = PropertyError::InvalidEnumLabel {
            property: "Enum".into(),
            label: "Five".into(),
        }
        .into();
        assert!(e.is_value_error());
        let e: DocumentError = PropertyError::AlreadyExists("Height".into()).into();
        assert!(e.is_structural_error());
    }

    #[test]
    fn cycles_are_dependency_errors() {
        let e = DocumentError::DependencyCycle {
            from: "A".into(),
            to: "B".into(),
        };
        assert!(e.is_dependency_error());
        assert_eq!(DocumentError::structural("nope").kind(), ErrorKind::Structural);
    }
}
