//! Resolved binding targets

use std::fmt::{self, Display, Formatter};

use featdoc_property::PropertyPath;
use serde::{Deserialize, Serialize};

/// A property path on a named object
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub object: String,
    pub path: PropertyPath,
}

impl Target {
    #[must_use]
    pub fn new(object: impl Into<String>, path: PropertyPath) -> Self {
        Self {
            object: object.into(),
            path,
        }
    }

    /// Same object and one path is a prefix of the other
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.object == other.object && self.path.overlaps(&other.path)
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.object, self.path)
    }
}
