//! Property store errors

use thiserror::Error;

use crate::path::PathError;

/// Errors raised by the property store
#[derive(Debug, Error)]
pub enum PropertyError {
    /// Type tag does not name any property type
    #[error("unknown property type '{0}'")]
    UnknownType(String),

    /// Type tag names something that is not a property type
    #[error("'{0}' is not a property type")]
    NotAPropertyType(String),

    /// No property with this name
    #[error("property '{0}' does not exist")]
    NotFound(String),

    /// Property name already taken
    #[error("property '{0}' already exists")]
    AlreadyExists(String),

    /// Property name is not an identifier
    #[error("invalid property name '{0}'")]
    InvalidName(String),

    /// Static properties belong to the type and cannot be removed
    #[error("property '{0}' is static and cannot be removed")]
    StaticProperty(String),

    /// Assigned value has the wrong shape for the property type
    #[error("property '{property}' expects {expected}, got {found}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Enumeration label outside the legal set
    #[error("'{label}' is not part of the enumeration '{property}'")]
    InvalidEnumLabel { property: String, label: String },

    /// Enumeration index outside the legal range
    #[error("index {index} out of range for enumeration '{property}' with {len} entries")]
    EnumIndexOutOfRange {
        property: String,
        index: i64,
        len: usize,
    },

    /// Sub-path does not address a component of the value
    #[error("'{path}' does not address a component of property '{property}'")]
    InvalidComponent { property: String, path: String },

    /// Flag name is not known
    #[error("unknown property flag '{0}'")]
    UnknownFlag(String),

    /// Malformed property path
    #[error(transparent)]
    Path(#[from] PathError),

    /// Dump could not be encoded or decoded
    #[error("content codec error: {0}")]
    Codec(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while compressing
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PropertyError {
    /// True for errors caused by the wrong kind of argument
    #[inline]
    #[must_use]
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownType(_) | Self::NotAPropertyType(_) | Self::TypeMismatch { .. }
        )
    }

    /// True for errors caused by an out-of-domain value
    #[inline]
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEnumLabel { .. }
                | Self::EnumIndexOutOfRange { .. }
                | Self::InvalidComponent { .. }
                | Self::InvalidName(_)
                | Self::UnknownFlag(_)
                | Self::Path(_)
        )
    }

    /// True for errors about missing attributes
    #[inline]
    #[must_use]
    pub fn is_attribute_error(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
