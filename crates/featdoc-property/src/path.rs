//! Property paths
//!
//! A [`PropertyPath`] names a property and optionally a component inside its
//! value, e.g. `Placement.Rotation.Angle` or `Placement.Base.x`. Paths are
//! what expression bindings target and reference.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::PropertyError;
use crate::value::{PropertyValue, Scalar};

/// Path to a property or one of its components
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyPath(SmallVec<[String; 4]>);

impl PropertyPath {
    /// Path from segments; the first segment is the property name
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(SmallVec::from_vec(segments))
    }

    /// Path naming a whole property
    #[inline]
    #[must_use]
    pub fn property(name: impl Into<String>) -> Self {
        let mut segments = SmallVec::new();
        segments.push(name.into());
        Self(segments)
    }

    /// All segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Property name (first segment)
    #[inline]
    #[must_use]
    pub fn property_name(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    /// Segments after the property name
    #[inline]
    #[must_use]
    pub fn component(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty path
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a segment, returning a new path
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Check if this path is a segment-wise prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0[..] == other.0[..self.0.len()]
    }

    /// Check if paths overlap (one is prefix of the other)
    ///
    /// `Placement` overlaps `Placement.Base.x`; `Placement.Base.x` does not
    /// overlap `Placement.Base.y`.
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_prefix_of(other) || other.is_prefix_of(self)
    }
}

impl Display for PropertyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for PropertyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        let segments = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else if !is_identifier(seg) {
                    Err(PathError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<SmallVec<_>, _>>()?;
        Ok(Self(segments))
    }
}

/// True if `s` is a valid identifier (letter or underscore, then alphanumerics)
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Errors related to property paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty path
    #[error("empty property path")]
    Empty,

    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Invalid segment characters
    #[error("invalid path segment '{0}'")]
    InvalidSegment(String),
}

impl PropertyValue {
    /// Read a scalar component addressed by `sub`
    ///
    /// An empty `sub` reads the whole value when it is scalar. Angles are
    /// reported in degrees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn component(&self, sub: &[String]) -> Option<Scalar> {
        let keys: Vec<&str> = sub.iter().map(String::as_str).collect();
        match (self, keys.as_slice()) {
            (Self::Bool(b), []) => Some(Scalar::Bool(*b)),
            (Self::Integer(i), []) => Some(Scalar::Number(*i as f64)),
            (Self::Float(f), []) => Some(Scalar::Number(*f)),
            (Self::String(s), []) => Some(Scalar::Text(s.clone())),
            (Self::Enumeration(e), []) => e.label().map(|l| Scalar::Text(l.to_string())),
            (Self::Link(Some(name)), []) => Some(Scalar::Text(name.clone())),
            (Self::Vector(v), [c]) => v.component(c).map(Scalar::Number),
            (Self::Rotation(r), ["Angle"]) => Some(Scalar::Number(r.angle_degrees())),
            (Self::Rotation(r), ["Axis", c]) => r.axis().component(c).map(Scalar::Number),
            (Self::Placement(p), ["Base", c]) => p.base.component(c).map(Scalar::Number),
            (Self::Placement(p), ["Rotation", "Angle"]) => {
                Some(Scalar::Number(p.rotation.angle_degrees()))
            }
            (Self::Placement(p), ["Rotation", "Axis", c]) => {
                p.rotation.axis().component(c).map(Scalar::Number)
            }
            (Self::Color(c), [k]) => match *k {
                "r" => Some(Scalar::Number(c.r)),
                "g" => Some(Scalar::Number(c.g)),
                "b" => Some(Scalar::Number(c.b)),
                "a" => Some(Scalar::Number(c.a)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Write a scalar component addressed by `sub`
    ///
    /// # Errors
    /// [`PropertyError::InvalidComponent`] when `sub` does not address a
    /// writable component or the scalar has the wrong shape.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set_component(
        &mut self,
        property: &str,
        sub: &[String],
        scalar: &Scalar,
    ) -> Result<(), PropertyError> {
        let invalid = || PropertyError::InvalidComponent {
            property: property.to_string(),
            path: sub.join("."),
        };
        let keys: Vec<&str> = sub.iter().map(String::as_str).collect();
        let number = scalar.as_f64();

        let ok = match (self, keys.as_slice()) {
            (Self::Vector(v), [c]) => number.is_some_and(|n| v.set_component(c, n)),
            (Self::Rotation(r), ["Angle"])
            | (Self::Placement(crate::Placement { rotation: r, .. }), ["Rotation", "Angle"]) => {
                number.is_some_and(|n| {
                    r.set_angle_degrees(n);
                    true
                })
            }
            (Self::Rotation(r), ["Axis", c])
            | (Self::Placement(crate::Placement { rotation: r, .. }), ["Rotation", "Axis", c]) => {
                number.is_some_and(|n| r.axis_mut().set_component(c, n))
            }
            (Self::Placement(p), ["Base", c]) => {
                number.is_some_and(|n| p.base.set_component(c, n))
            }
            (Self::Color(col), [k]) => match (number, *k) {
                (Some(n), "r") => {
                    col.r = n;
                    true
                }
                (Some(n), "g") => {
                    col.g = n;
                    true
                }
                (Some(n), "b") => {
                    col.b = n;
                    true
                }
                (Some(n), "a") => {
                    col.a = n;
                    true
                }
                _ => false,
            },
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(invalid())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Placement, Rotation, Vector3};

    fn path(s: &str) -> PropertyPath {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        let p = path("Placement.Rotation.Angle");
        assert_eq!(p.property_name(), "Placement");
        assert_eq!(p.component(), &["Rotation", "Angle"]);
        assert_eq!(p.to_string(), "Placement.Rotation.Angle");
    }

    #[test]
    fn parse_rejects_bad_segments() {
        assert!(matches!("".parse::<PropertyPath>(), Err(PathError::Empty)));
        assert!(matches!(
            "a..b".parse::<PropertyPath>(),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            "a.b-c".parse::<PropertyPath>(),
            Err(PathError::InvalidSegment(_))
        ));
    }

    #[test]
    fn sibling_components_do_not_overlap() {
        assert!(!path("Placement.Base.x").overlaps(&path("Placement.Base.y")));
        assert!(path("Placement").overlaps(&path("Placement.Base.y")));
        assert!(path("Placement.Base.y").overlaps(&path("Placement")));
    }

    #[test]
    fn placement_components_read_and_write() {
        let mut v = PropertyValue::Placement(Placement::new(
            Vector3::new(1.0, 2.0, 3.0),
            Rotation::from_degrees(Vector3::new(0.0, 0.0, 1.0), 10.0),
        ));
        let angle = v
            .component(&["Rotation".into(), "Angle".into()])
            .and_then(|s| s.as_f64())
            .unwrap();
        assert!((angle - 10.0).abs() < 1e-9);

        v.set_component("Placement", &["Base".into(), "y".into()], &Scalar::Number(7.0))
            .unwrap();
        assert_eq!(v.component(&["Base".into(), "y".into()]), Some(Scalar::Number(7.0)));
    }

    #[test]
    fn set_component_rejects_unknown_key() {
        let mut v = PropertyValue::Vector(Vector3::default());
        let err = v
            .set_component("Vector", &["w".into()], &Scalar::Number(1.0))
            .unwrap_err();
        assert!(matches!(err, PropertyError::InvalidComponent { .. }));
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("Label_2"));
        assert!(is_identifier("_x"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("a b"));
    }
}
