//! Per-object property registry

use indexmap::IndexMap;

use crate::codec::{self, PersistedProperty, PropertiesDump};
use crate::error::PropertyError;
use crate::flags::PropertyFlags;
use crate::kind::PropertyKind;
use crate::property::{Property, PropertySpec};
use crate::value::PropertyValue;

/// Ordered set of properties owned by one object
///
/// Insertion order is preserved and is the order used in dumps. The store
/// does not enforce read-only flags; callers decide whether a write is
/// external or internal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyStore {
    props: IndexMap<String, Property>,
}

impl PropertyStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property from its declaration
    ///
    /// # Errors
    /// Fails if the name is taken or the declaration is invalid.
    pub fn add(&mut self, spec: PropertySpec, dynamic: bool) -> Result<&Property, PropertyError> {
        if self.props.contains_key(&spec.name) {
            return Err(PropertyError::AlreadyExists(spec.name));
        }
        let prop = Property::from_spec(spec, dynamic)?;
        let name = prop.name().to_string();
        Ok(self.props.entry(name).or_insert(prop))
    }

    /// Put back a property exactly as it was, replacing any namesake
    pub fn insert(&mut self, prop: Property) -> Option<Property> {
        self.props.insert(prop.name().to_string(), prop)
    }

    /// Remove a property whether static or dynamic
    ///
    /// Used when the extension that contributed it is detached.
    pub fn take(&mut self, name: &str) -> Option<Property> {
        self.props.shift_remove(name)
    }

    /// Remove a dynamic property
    ///
    /// # Errors
    /// Fails if the property does not exist or is static.
    pub fn remove(&mut self, name: &str) -> Result<Property, PropertyError> {
        match self.props.get(name) {
            None => Err(PropertyError::NotFound(name.to_string())),
            Some(p) if !p.is_dynamic() => Err(PropertyError::StaticProperty(name.to_string())),
            Some(_) => self
                .props
                .shift_remove(name)
                .ok_or_else(|| PropertyError::NotFound(name.to_string())),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.props.get(name)
    }

    #[inline]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.props.get_mut(name)
    }

    /// Property by name or [`PropertyError::NotFound`]
    ///
    /// # Errors
    /// Fails if the property does not exist.
    pub fn require(&self, name: &str) -> Result<&Property, PropertyError> {
        self.props
            .get(name)
            .ok_or_else(|| PropertyError::NotFound(name.to_string()))
    }

    /// Mutable property by name or [`PropertyError::NotFound`]
    ///
    /// # Errors
    /// Fails if the property does not exist.
    pub fn require_mut(&mut self, name: &str) -> Result<&mut Property, PropertyError> {
        self.props
            .get_mut(name)
            .ok_or_else(|| PropertyError::NotFound(name.to_string()))
    }

    /// Value by name
    ///
    /// # Errors
    /// Fails if the property does not exist.
    pub fn value(&self, name: &str) -> Result<&PropertyValue, PropertyError> {
        self.require(name).map(Property::value)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.props.contains_key(name)
    }

    /// Property names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }

    /// Properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.props.values()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Coerce, clamp and store a value, returning the previous one
    ///
    /// # Errors
    /// Fails if the property does not exist or the value does not fit.
    pub fn assign(
        &mut self,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertyValue, PropertyError> {
        self.require_mut(name)?.assign(value)
    }

    /// Names of the declared flags of a property
    ///
    /// # Errors
    /// Fails if the property does not exist.
    pub fn type_of_property(&self, name: &str) -> Result<Vec<&'static str>, PropertyError> {
        Ok(self.require(name)?.flags().names())
    }

    /// Legal labels of an enumeration property, `None` for other kinds
    ///
    /// # Errors
    /// Fails if the property does not exist.
    pub fn enumerations_of(&self, name: &str) -> Result<Option<Vec<String>>, PropertyError> {
        Ok(self
            .require(name)?
            .value()
            .as_enumeration()
            .map(|e| e.labels().to_vec()))
    }

    /// Clear every touched mark
    pub fn purge_touched(&mut self) {
        for p in self.props.values_mut() {
            p.set_touched(false);
        }
    }

    /// Persisted form of one property
    #[must_use]
    pub fn persist(prop: &Property) -> PersistedProperty {
        let transient = prop.flags().contains(PropertyFlags::TRANSIENT);
        PersistedProperty {
            name: prop.name().to_string(),
            type_name: prop.kind().type_name().to_string(),
            group: prop.group().to_string(),
            documentation: prop.documentation().to_string(),
            flags: prop.flags(),
            editor_mode: prop.editor_mode(),
            dynamic: prop.is_dynamic(),
            value: (!transient).then(|| prop.value().clone()),
            constraint: prop.constraint(),
        }
    }

    /// Persisted form of every property except the no-persist ones
    #[must_use]
    pub fn to_persisted(&self) -> PropertiesDump {
        PropertiesDump {
            properties: self
                .props
                .values()
                .filter(|p| !p.flags().contains(PropertyFlags::NO_PERSIST))
                .map(Self::persist)
                .collect(),
        }
    }

    /// Apply one persisted property
    ///
    /// Existing properties take the saved value; missing dynamic properties
    /// are recreated. Returns `false` when the entry names a static property
    /// this store does not have, which callers treat as legacy schema.
    ///
    /// # Errors
    /// Fails on unknown type tags or values that do not fit the kind.
    pub fn restore_persisted(&mut self, item: PersistedProperty) -> Result<bool, PropertyError> {
        let kind: PropertyKind = item.type_name.parse()?;
        if !self.contains(&item.name) {
            if !item.dynamic {
                return Ok(false);
            }
            let mut spec = PropertySpec::new(kind, item.name.clone())
                .group(item.group)
                .doc(item.documentation)
                .flags(item.flags);
            spec.constraint = item.constraint;
            self.add(spec, true)?;
        }
        let prop = self.require_mut(&item.name)?;
        if prop.kind() != kind {
            return Err(PropertyError::TypeMismatch {
                property: item.name,
                expected: prop.kind().type_name(),
                found: kind.type_name(),
            });
        }
        prop.set_editor_mode(item.editor_mode);
        if let Some(value) = item.value {
            let value = prop.prepare(value)?;
            prop.replace_value(value);
        }
        Ok(true)
    }

    /// Dump one property's content
    ///
    /// # Errors
    /// Fails if the property does not exist or encoding fails.
    pub fn dump_property_content(&self, name: &str, level: i32) -> Result<Vec<u8>, PropertyError> {
        let prop = self.require(name)?;
        codec::dump(&Self::persist(prop), level)
    }

    /// Restore one property's content from [`Self::dump_property_content`]
    ///
    /// The dump may come from another object; only its value is applied.
    ///
    /// # Errors
    /// Fails if the property does not exist, the dump is malformed, or the
    /// dumped type differs.
    pub fn restore_property_content(
        &mut self,
        name: &str,
        bytes: &[u8],
    ) -> Result<PropertyValue, PropertyError> {
        let mut item: PersistedProperty = codec::load(bytes)?;
        let old = self.require(name)?.value().clone();
        name.clone_into(&mut item.name);
        item.dynamic = false;
        item.editor_mode = self.require(name)?.editor_mode();
        self.restore_persisted(item)?;
        Ok(old)
    }

    /// Dump every persistent property under a `Properties` root
    ///
    /// # Errors
    /// Fails if encoding fails.
    pub fn dump_content(&self, level: i32) -> Result<Vec<u8>, PropertyError> {
        codec::dump(&self.to_persisted(), level)
    }

    /// Restore from [`Self::dump_content`], returning names of skipped entries
    ///
    /// # Errors
    /// Fails if the dump is malformed or a value does not fit.
    pub fn restore_content(&mut self, bytes: &[u8]) -> Result<Vec<String>, PropertyError> {
        let dump: PropertiesDump = codec::load(bytes)?;
        let mut skipped = Vec::new();
        for item in dump.properties {
            let name = item.name.clone();
            if !self.restore_persisted(item)? {
                skipped.push(name);
            }
        }
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Placement, Rotation, Vector3};
    use pretty_assertions::assert_eq;

    fn store() -> PropertyStore {
        let mut s = PropertyStore::new();
        s.add(PropertySpec::new(PropertyKind::Integer, "Integer").value(4711), false)
            .unwrap();
        s.add(
            PropertySpec::new(PropertyKind::Integer, "Transient")
                .flags(PropertyFlags::TRANSIENT)
                .value(1),
            false,
        )
        .unwrap();
        s.add(
            PropertySpec::new(PropertyKind::String, "Scratch").flags(PropertyFlags::NO_PERSIST),
            true,
        )
        .unwrap();
        s.add(
            PropertySpec::new(PropertyKind::Placement, "Placement").value(Placement::new(
                Vector3::new(1.0, 2.0, 3.0),
                Rotation::from_degrees(Vector3::new(1.0, 2.0, 3.0), 30.0),
            )),
            false,
        )
        .unwrap();
        s.add(
            PropertySpec::new(PropertyKind::LinkList, "Links")
                .value(PropertyValue::LinkList(vec!["A".into(), "B".into()])),
            true,
        )
        .unwrap();
        s
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut s = store();
        let err = s
            .add(PropertySpec::new(PropertyKind::Float, "Integer"), true)
            .unwrap_err();
        assert!(matches!(err, PropertyError::AlreadyExists(_)));
    }

    #[test]
    fn static_property_cannot_be_removed() {
        let mut s = store();
        assert!(matches!(
            s.remove("Integer"),
            Err(PropertyError::StaticProperty(_))
        ));
        assert!(s.remove("Links").is_ok());
        assert!(!s.contains("Links"));
    }

    #[test]
    fn content_round_trip_skips_no_persist_and_transient_values() {
        let mut source = store();
        source.assign("Transient", PropertyValue::Integer(99)).unwrap();
        let bytes = source.dump_content(3).unwrap();

        let mut target = PropertyStore::new();
        target
            .add(PropertySpec::new(PropertyKind::Integer, "Integer"), false)
            .unwrap();
        target
            .add(
                PropertySpec::new(PropertyKind::Integer, "Transient")
                    .flags(PropertyFlags::TRANSIENT)
                    .value(1),
                false,
            )
            .unwrap();
        target
            .add(PropertySpec::new(PropertyKind::Placement, "Placement"), false)
            .unwrap();
        let skipped = target.restore_content(&bytes).unwrap();

        assert!(skipped.is_empty());
        assert_eq!(target.value("Integer").unwrap(), &PropertyValue::Integer(4711));
        assert_eq!(target.value("Transient").unwrap(), &PropertyValue::Integer(1));
        assert_eq!(
            target.value("Placement").unwrap(),
            source.value("Placement").unwrap()
        );
        assert_eq!(
            target.value("Links").unwrap(),
            &PropertyValue::LinkList(vec!["A".into(), "B".into()])
        );
        assert!(!target.contains("Scratch"));
    }

    #[test]
    fn property_content_restores_across_stores() {
        let source = store();
        let bytes = source.dump_property_content("Placement", 0).unwrap();
        let mut target = PropertyStore::new();
        target
            .add(PropertySpec::new(PropertyKind::Placement, "Other"), true)
            .unwrap();
        target.restore_property_content("Other", &bytes).unwrap();
        assert_eq!(
            target.value("Other").unwrap(),
            source.value("Placement").unwrap()
        );
    }

    #[test]
    fn property_content_type_mismatch_rejected() {
        let source = store();
        let bytes = source.dump_property_content("Integer", 0).unwrap();
        let mut target = PropertyStore::new();
        target
            .add(PropertySpec::new(PropertyKind::String, "S"), true)
            .unwrap();
        assert!(target.restore_property_content("S", &bytes).is_err());
    }

    #[test]
    fn unknown_static_entry_is_reported() {
        let source = store();
        let bytes = source.dump_content(0).unwrap();
        let mut target = PropertyStore::new();
        let skipped = target.restore_content(&bytes).unwrap();
        assert_eq!(skipped, vec!["Integer", "Transient", "Placement"]);
    }

    #[test]
    fn type_of_property_lists_flags() {
        let s = store();
        assert_eq!(s.type_of_property("Transient").unwrap(), vec!["Transient"]);
        assert!(s.type_of_property("Missing").unwrap_err().is_attribute_error());
    }
}
