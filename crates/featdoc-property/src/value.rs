//! Property values
//!
//! [`PropertyValue`] is the payload held by every property. Object references
//! are stored by object name so that values stay meaningful across dumps and
//! restores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PropertyError;

/// Three-component vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    /// Create vector
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Named component (`x`, `y` or `z`)
    #[must_use]
    pub fn component(&self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.x),
            "y" => Some(self.y),
            "z" => Some(self.z),
            _ => None,
        }
    }

    /// Set named component, returning false if the name is not a component
    pub fn set_component(&mut self, name: &str, value: f64) -> bool {
        match name {
            "x" => self.x = value,
            "y" => self.y = value,
            "z" => self.z = value,
            _ => return false,
        }
        true
    }
}

/// Axis-angle rotation
///
/// The axis is kept exactly as supplied so that a save/restore round trip
/// reproduces it. The angle is stored in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    axis: Vector3,
    angle: f64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self {
            axis: Vector3::new(0.0, 0.0, 1.0),
            angle: 0.0,
        }
    }
}

impl Rotation {
    /// Rotation from an axis and an angle in radians
    #[inline]
    #[must_use]
    pub const fn from_axis_angle(axis: Vector3, radians: f64) -> Self {
        Self {
            axis,
            angle: radians,
        }
    }

    /// Rotation from an axis and an angle in degrees
    #[inline]
    #[must_use]
    pub fn from_degrees(axis: Vector3, degrees: f64) -> Self {
        Self::from_axis_angle(axis, degrees.to_radians())
    }

    /// Axis as supplied
    #[inline]
    #[must_use]
    pub fn axis(&self) -> Vector3 {
        self.axis
    }

    /// Angle in radians
    #[inline]
    #[must_use]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Angle in degrees
    #[inline]
    #[must_use]
    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }

    /// Replace the angle, in degrees
    #[inline]
    pub fn set_angle_degrees(&mut self, degrees: f64) {
        self.angle = degrees.to_radians();
    }

    /// Mutable axis access
    #[inline]
    pub fn axis_mut(&mut self) -> &mut Vector3 {
        &mut self.axis
    }
}

/// Position plus orientation
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub base: Vector3,
    pub rotation: Rotation,
}

impl Placement {
    /// Create placement
    #[inline]
    #[must_use]
    pub const fn new(base: Vector3, rotation: Rotation) -> Self {
        Self { base, rotation }
    }
}

/// RGBA colour with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Color {
    /// Opaque colour
    #[inline]
    #[must_use]
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Colour with explicit alpha
    #[inline]
    #[must_use]
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// Reference to an object qualified with named sub-elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLink {
    pub object: String,
    pub subs: Vec<String>,
}

impl SubLink {
    /// Create sub-link
    #[must_use]
    pub fn new(object: impl Into<String>, subs: Vec<String>) -> Self {
        Self {
            object: object.into(),
            subs,
        }
    }
}

/// Enumeration payload: ordered legal labels plus the selected index
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Enumeration {
    labels: Vec<String>,
    index: Option<usize>,
}

impl Enumeration {
    /// Enumeration over `labels`, selecting `index` when it is in range
    #[must_use]
    pub fn new<I, S>(labels: I, index: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let index = (index < labels.len()).then_some(index);
        Self { labels, index }
    }

    /// Legal labels in order
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Selected index
    #[inline]
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Selected label
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.index
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }

    /// Select by label
    ///
    /// # Errors
    /// Fails if `label` is not one of the legal labels.
    pub fn select_label(&mut self, property: &str, label: &str) -> Result<(), PropertyError> {
        let index = self
            .labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| PropertyError::InvalidEnumLabel {
                property: property.to_string(),
                label: label.to_string(),
            })?;
        self.index = Some(index);
        Ok(())
    }

    /// Select by index
    ///
    /// # Errors
    /// Fails if `index` is outside the label range.
    pub fn select_index(&mut self, property: &str, index: i64) -> Result<(), PropertyError> {
        match usize::try_from(index) {
            Ok(i) if i < self.labels.len() => {
                self.index = Some(i);
                Ok(())
            }
            _ => Err(PropertyError::EnumIndexOutOfRange {
                property: property.to_string(),
                index,
                len: self.labels.len(),
            }),
        }
    }

    /// Replace the legal labels, keeping the selection by label when possible
    pub fn set_labels(&mut self, labels: Vec<String>) {
        let current = self.label().map(str::to_string);
        self.index = current
            .and_then(|c| labels.iter().position(|l| *l == c))
            .or(if labels.is_empty() { None } else { Some(0) });
        self.labels = labels;
    }
}

/// Scalar view of a value component, used by property paths
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// Numeric view; booleans map to 0/1
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(_) => None,
        }
    }
}

/// Payload of a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    BoolList(Vec<bool>),
    Integer(i64),
    IntegerList(Vec<i64>),
    Float(f64),
    FloatList(Vec<f64>),
    String(String),
    StringList(Vec<String>),
    Enumeration(Enumeration),
    Link(Option<String>),
    LinkList(Vec<String>),
    LinkSub(Option<SubLink>),
    LinkSubList(Vec<SubLink>),
    Placement(Placement),
    PlacementList(Vec<Placement>),
    Rotation(Rotation),
    Vector(Vector3),
    VectorList(Vec<Vector3>),
    Color(Color),
    ColorList(Vec<Color>),
    FileIncluded(Option<String>),
    Map(BTreeMap<String, String>),
    Object(serde_json::Value),
}

impl PropertyValue {
    /// Short label of the value shape, used in error messages
    #[must_use]
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::BoolList(_) => "bool list",
            Self::Integer(_) => "integer",
            Self::IntegerList(_) => "integer list",
            Self::Float(_) => "float",
            Self::FloatList(_) => "float list",
            Self::String(_) => "string",
            Self::StringList(_) => "string list",
            Self::Enumeration(_) => "enumeration",
            Self::Link(_) => "link",
            Self::LinkList(_) => "link list",
            Self::LinkSub(_) => "sub-element link",
            Self::LinkSubList(_) => "sub-element link list",
            Self::Placement(_) => "placement",
            Self::PlacementList(_) => "placement list",
            Self::Rotation(_) => "rotation",
            Self::Vector(_) => "vector",
            Self::VectorList(_) => "vector list",
            Self::Color(_) => "colour",
            Self::ColorList(_) => "colour list",
            Self::FileIncluded(_) => "included file",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Names of every object referenced by this value, duplicates included
    #[must_use]
    pub fn linked_names(&self) -> Vec<&str> {
        match self {
            Self::Link(Some(name)) => vec![name.as_str()],
            Self::LinkList(names) => names.iter().map(String::as_str).collect(),
            Self::LinkSub(Some(link)) => vec![link.object.as_str()],
            Self::LinkSubList(links) => links.iter().map(|l| l.object.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Remove every reference to `name`; returns true if anything changed
    pub fn unlink(&mut self, name: &str) -> bool {
        match self {
            Self::Link(target) if target.as_deref() == Some(name) => {
                *target = None;
                true
            }
            Self::LinkSub(target) if target.as_ref().is_some_and(|l| l.object == name) => {
                *target = None;
                true
            }
            Self::LinkList(names) => {
                let before = names.len();
                names.retain(|n| n != name);
                names.len() != before
            }
            Self::LinkSubList(links) => {
                let before = links.len();
                links.retain(|l| l.object != name);
                links.len() != before
            }
            _ => false,
        }
    }

    /// Integer view
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float view; integers widen
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Bool view
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String view; enumerations yield their selected label, included files their path
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::FileIncluded(Some(s)) => Some(s),
            Self::Enumeration(e) => e.label(),
            _ => None,
        }
    }

    /// Single link target
    #[must_use]
    pub fn as_link(&self) -> Option<&str> {
        match self {
            Self::Link(Some(name)) => Some(name),
            Self::LinkSub(Some(link)) => Some(&link.object),
            _ => None,
        }
    }

    /// Link list targets
    #[must_use]
    pub fn as_link_list(&self) -> Option<&[String]> {
        match self {
            Self::LinkList(names) => Some(names),
            _ => None,
        }
    }

    /// Placement view
    #[must_use]
    pub fn as_placement(&self) -> Option<&Placement> {
        match self {
            Self::Placement(p) => Some(p),
            _ => None,
        }
    }

    /// Enumeration view
    #[must_use]
    pub fn as_enumeration(&self) -> Option<&Enumeration> {
        match self {
            Self::Enumeration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vector3> for PropertyValue {
    fn from(v: Vector3) -> Self {
        Self::Vector(v)
    }
}

impl From<Placement> for PropertyValue {
    fn from(v: Placement) -> Self {
        Self::Placement(v)
    }
}

impl From<Rotation> for PropertyValue {
    fn from(v: Rotation) -> Self {
        Self::Rotation(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        Self::StringList(v)
    }
}

/// Formula results; numbers land as floats and are narrowed by the target kind
impl From<Scalar> for PropertyValue {
    fn from(v: Scalar) -> Self {
        match v {
            Scalar::Number(n) => Self::Float(n),
            Scalar::Bool(b) => Self::Bool(b),
            Scalar::Text(s) => Self::String(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_become_values() {
        assert_eq!(PropertyValue::from(Scalar::Number(2.5)), PropertyValue::Float(2.5));
        assert_eq!(PropertyValue::from(Scalar::Bool(true)), PropertyValue::Bool(true));
        assert_eq!(
            PropertyValue::from(Scalar::Text("x".into())),
            PropertyValue::String("x".into())
        );
    }

    #[test]
    fn enumeration_select_by_label_and_index_agree() {
        let labels = ["Zero", "One", "Two", "Three", "Four"];
        let mut by_label = Enumeration::new(labels, 4);
        let mut by_index = by_label.clone();

        by_label.select_label("Enum", "Two").unwrap();
        by_index.select_index("Enum", 2).unwrap();
        assert_eq!(by_label, by_index);
        assert_eq!(by_label.label(), Some("Two"));
    }

    #[test]
    fn enumeration_rejects_unknown_label_and_keeps_selection() {
        let mut e = Enumeration::new(["Zero", "One"], 1);
        assert!(e.select_label("Enum", "Five").is_err());
        assert!(e.select_index("Enum", 7).is_err());
        assert!(e.select_index("Enum", -1).is_err());
        assert_eq!(e.label(), Some("One"));
    }

    #[test]
    fn enumeration_relabel_keeps_matching_label() {
        let mut e = Enumeration::new(["a", "b"], 1);
        e.set_labels(vec!["x".into(), "b".into()]);
        assert_eq!(e.label(), Some("b"));
        e.set_labels(vec!["one".into(), "two".into()]);
        assert_eq!(e.index(), Some(0));
        e.set_labels(Vec::new());
        assert_eq!(e.label(), None);
    }

    #[test]
    fn unlink_removes_every_occurrence() {
        let mut v = PropertyValue::LinkList(vec!["A".into(), "B".into(), "A".into()]);
        assert!(v.unlink("A"));
        assert_eq!(v, PropertyValue::LinkList(vec!["B".into()]));
        assert!(!v.unlink("A"));

        let mut single = PropertyValue::Link(Some("B".into()));
        assert!(single.unlink("B"));
        assert_eq!(single, PropertyValue::Link(None));
    }

    #[test]
    fn linked_names_cover_sub_links() {
        let v = PropertyValue::LinkSubList(vec![
            SubLink::new("Box", vec!["Face1".into()]),
            SubLink::new("Cyl", Vec::new()),
        ]);
        assert_eq!(v.linked_names(), vec!["Box", "Cyl"]);
    }

    #[test]
    fn rotation_keeps_raw_axis() {
        let r = Rotation::from_degrees(Vector3::new(1.0, 2.0, 3.0), 90.0);
        assert_eq!(r.axis(), Vector3::new(1.0, 2.0, 3.0));
        assert!((r.angle_degrees() - 90.0).abs() < 1e-9);
    }
}
