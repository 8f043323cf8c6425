//! Property access, the write pipeline and content dumps

use featdoc_property::{
    load, PersistedProperty, PropertiesDump, PropertyError, PropertyFlags, PropertyKind,
    PropertySpec, PropertyValue,
};

use super::Document;
use crate::error::{DocumentError, Result};
use crate::notify::DocumentEvent;
use crate::status::ObjectStatus;
use crate::transaction::TransactionOp;

/// Who is changing a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Caller of the public API; read-only properties are enforced
    External,
    /// Recompute writing results; nothing is touched
    Internal,
    /// Consequence of another change, such as unlinking a removed object
    Cascade,
    /// Undo or redo putting back a recorded value
    Replay,
}

impl Document {
    /// Assign a property from outside
    ///
    /// # Errors
    /// Missing object or property, read-only property, or a value that does
    /// not fit. A rejected write leaves the old value in place.
    pub fn set_property(
        &mut self,
        object: &str,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        self.write_property(object, property, value.into(), Origin::External)
    }

    /// Current value of a property
    ///
    /// # Errors
    /// Missing object or property.
    pub fn property(&self, object: &str, property: &str) -> Result<&PropertyValue> {
        Ok(self.require(object)?.properties.value(property)?)
    }

    /// Names of every property of an object, in declaration order
    ///
    /// # Errors
    /// Missing object.
    pub fn properties_list(&self, object: &str) -> Result<Vec<&str>> {
        Ok(self.require(object)?.properties.names().collect())
    }

    /// Declared flag names of a property
    ///
    /// # Errors
    /// Missing object or property.
    pub fn type_of_property(&self, object: &str, property: &str) -> Result<Vec<&'static str>> {
        Ok(self.require(object)?.properties.type_of_property(property)?)
    }

    /// Legal labels of an enumeration property, `None` for other kinds
    ///
    /// # Errors
    /// Missing object or property.
    pub fn enumerations_of_property(
        &self,
        object: &str,
        property: &str,
    ) -> Result<Option<Vec<String>>> {
        Ok(self.require(object)?.properties.enumerations_of(property)?)
    }

    /// # Errors
    /// Missing object or property.
    pub fn group_of_property(&self, object: &str, property: &str) -> Result<&str> {
        Ok(self.require(object)?.properties.require(property)?.group())
    }

    /// # Errors
    /// Missing object or property.
    pub fn documentation_of_property(&self, object: &str, property: &str) -> Result<&str> {
        Ok(self
            .require(object)?
            .properties
            .require(property)?
            .documentation())
    }

    /// Runtime editor mode names of a property
    ///
    /// # Errors
    /// Missing object or property.
    pub fn editor_mode(&self, object: &str, property: &str) -> Result<Vec<&'static str>> {
        Ok(self
            .require(object)?
            .properties
            .require(property)?
            .editor_mode()
            .names())
    }

    /// Replace the runtime editor mode (`ReadOnly`, `Hidden`) of a property
    ///
    /// # Errors
    /// Missing object or property, or a mode name other than the two above.
    pub fn set_editor_mode<S: AsRef<str>>(
        &mut self,
        object: &str,
        property: &str,
        modes: &[S],
    ) -> Result<()> {
        let mode = PropertyFlags::from_names(modes.iter().map(AsRef::as_ref))?;
        if !(PropertyFlags::READ_ONLY | PropertyFlags::HIDDEN).contains(mode) {
            return Err(PropertyError::UnknownFlag(mode.to_string()).into());
        }
        self.require_mut(object)?
            .properties
            .require_mut(property)?
            .set_editor_mode(mode);
        self.emit(DocumentEvent::EditorModeChanged {
            document: self.name.clone(),
            object: object.to_string(),
            property: property.to_string(),
        });
        Ok(())
    }

    /// Add a dynamic property by type tag
    ///
    /// # Errors
    /// Unknown tag or a tag naming an object type or extension (type
    /// errors), an invalid or taken name.
    pub fn add_property(
        &mut self,
        object: &str,
        type_tag: &str,
        name: &str,
        group: &str,
        documentation: &str,
        flags: PropertyFlags,
    ) -> Result<()> {
        let kind = match PropertyKind::from_type_name(type_tag) {
            Some(kind) => kind,
            None => {
                let registry = self.registry.read();
                let err = if registry.object_type(type_tag).is_some()
                    || registry.is_extension(type_tag)
                {
                    PropertyError::NotAPropertyType(type_tag.to_string())
                } else {
                    PropertyError::UnknownType(type_tag.to_string())
                };
                return Err(err.into());
            }
        };
        let spec = PropertySpec::new(kind, name)
            .group(group)
            .doc(documentation)
            .flags(flags);
        self.add_property_spec(object, spec)
    }

    /// Add a dynamic property from a full declaration
    ///
    /// # Errors
    /// Missing object, invalid or taken name, or an initial value that does
    /// not fit.
    pub fn add_property_spec(&mut self, object: &str, spec: PropertySpec) -> Result<()> {
        let added = self
            .require_mut(object)?
            .properties
            .add(spec, true)?
            .clone();
        let name = added.name().to_string();
        let is_link = added.kind().is_link();
        self.record(
            TransactionOp::PropertyAdded {
                object: object.to_string(),
                property: added,
            },
            Origin::External,
        );
        if is_link {
            self.refresh_edges(object)?;
        }
        self.emit(DocumentEvent::DynamicPropertyAdded {
            document: self.name.clone(),
            object: object.to_string(),
            property: name,
        });
        Ok(())
    }

    /// Remove a dynamic property, its expression bindings and its edges
    ///
    /// # Errors
    /// Missing object or property, or a static property.
    pub fn remove_property(&mut self, object: &str, property: &str) -> Result<()> {
        let prop = self.require(object)?.properties.require(property)?;
        if !prop.is_dynamic() {
            return Err(PropertyError::StaticProperty(property.to_string()).into());
        }
        let unbound = self
            .require_mut(object)?
            .expressions
            .unbind_property(property);
        for binding in unbound {
            self.record(
                TransactionOp::ExpressionChanged {
                    object: object.to_string(),
                    path: binding.target,
                    old: Some(binding.expression.source().to_string()),
                    new: None,
                },
                Origin::External,
            );
        }
        let removed = self.require_mut(object)?.properties.remove(property)?;
        self.record(
            TransactionOp::PropertyRemoved {
                object: object.to_string(),
                property: removed,
            },
            Origin::External,
        );
        self.refresh_edges(object)?;
        self.emit(DocumentEvent::DynamicPropertyRemoved {
            document: self.name.clone(),
            object: object.to_string(),
            property: property.to_string(),
        });
        Ok(())
    }

    /// The single path every value change takes
    ///
    /// Order: prepare, before-change hooks, assign, record, edges, touch,
    /// after-change hooks.
    pub(crate) fn write_property(
        &mut self,
        object: &str,
        property: &str,
        value: PropertyValue,
        origin: Origin,
    ) -> Result<()> {
        let obj = self.require(object)?;
        let prop = obj.properties.require(property)?;
        if origin == Origin::External && prop.is_read_only() {
            tracing::warn!(document = %self.name, object, property, "rejected write to read-only property");
            return Err(DocumentError::ReadOnly {
                object: object.to_string(),
                property: property.to_string(),
            });
        }
        let kind = prop.kind();
        let flags = prop.flags();
        let proxy = obj.proxy.clone();
        let mut prepared = if origin == Origin::Replay {
            value
        } else {
            prop.prepare(value)?
        };

        if kind == PropertyKind::FileIncluded && origin != Origin::Replay {
            match self.include_file(object, property, prepared)? {
                Some(v) => prepared = v,
                None => return Ok(()),
            }
        }
        if origin == Origin::External && property == "Group" {
            self.check_group_assignment(object, &prepared)?;
        }

        if let Some(proxy) = &proxy {
            proxy.on_before_change(self.require(object)?, property);
        }
        self.emit(DocumentEvent::ObjectBeforeChange {
            document: self.name.clone(),
            object: object.to_string(),
            property: property.to_string(),
        });

        let obj = self.require_mut(object)?;
        let prop = obj.properties.require_mut(property)?;
        let old = prop.replace_value(prepared);
        let new = prop.value().clone();
        if origin != Origin::Internal && !flags.contains(PropertyFlags::OUTPUT) {
            prop.set_touched(true);
            obj.touch(if flags.contains(PropertyFlags::NO_RECOMPUTE) {
                ObjectStatus::TOUCHED
            } else {
                ObjectStatus::TOUCHED | ObjectStatus::MUST_EXECUTE
            });
        }
        self.record(
            TransactionOp::PropertyChanged {
                object: object.to_string(),
                property: property.to_string(),
                old,
                new,
            },
            origin,
        );
        if kind.is_link() {
            self.refresh_edges(object)?;
        }

        if let Some(proxy) = &proxy {
            proxy.on_changed(self.require(object)?, property);
        }
        self.emit(DocumentEvent::ObjectChanged {
            document: self.name.clone(),
            object: object.to_string(),
            property: property.to_string(),
        });
        Ok(())
    }

    /// Dump one property, compressed when `level > 0`
    ///
    /// # Errors
    /// Missing object or property, or an encoding failure.
    pub fn dump_property_content(&self, object: &str, property: &str, level: i32) -> Result<Vec<u8>> {
        Ok(self
            .require(object)?
            .properties
            .dump_property_content(property, level)?)
    }

    /// Assign a property from a dump, possibly taken from another object
    ///
    /// # Errors
    /// Missing object or property, a malformed dump, or a dumped value that
    /// does not fit this property.
    pub fn restore_property_content(&mut self, object: &str, property: &str, bytes: &[u8]) -> Result<()> {
        let item: PersistedProperty = load(bytes)?;
        match item.value {
            Some(value) => self.write_property(object, property, value, Origin::Cascade),
            None => {
                self.require(object)?.properties.require(property)?;
                Ok(())
            }
        }
    }

    /// Dump every persistent property of an object
    ///
    /// # Errors
    /// Missing object or an encoding failure.
    pub fn dump_object_content(&self, object: &str, level: i32) -> Result<Vec<u8>> {
        Ok(self.require(object)?.properties.dump_content(level)?)
    }

    /// Apply an object dump, recreating missing dynamic properties
    ///
    /// Returns the names of static entries this object does not have.
    ///
    /// # Errors
    /// Missing object, a malformed dump, or values that do not fit.
    pub fn restore_object_content(&mut self, object: &str, bytes: &[u8]) -> Result<Vec<String>> {
        let dump: PropertiesDump = load(bytes)?;
        let mut skipped = Vec::new();
        for item in dump.properties {
            if !self.require(object)?.properties.contains(&item.name) {
                if !item.dynamic {
                    skipped.push(item.name);
                    continue;
                }
                let kind: PropertyKind = item.type_name.parse()?;
                let mut spec = PropertySpec::new(kind, item.name.clone())
                    .group(item.group)
                    .doc(item.documentation)
                    .flags(item.flags);
                spec.constraint = item.constraint;
                self.add_property_spec(object, spec)?;
            }
            if let Some(value) = item.value {
                self.write_property(object, &item.name, value, Origin::Cascade)?;
            }
        }
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_rejects_external_writes_only() {
        let mut doc = Document::new("RO");
        let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
        let err = doc.set_property(&obj, "TypeReadOnly", 7).unwrap_err();
        assert!(matches!(err, DocumentError::ReadOnly { .. }));
        doc.write_property(&obj, "TypeReadOnly", PropertyValue::Integer(7), Origin::Internal)
            .unwrap();
        assert_eq!(doc.property(&obj, "TypeReadOnly").unwrap(), &PropertyValue::Integer(7));
    }

    #[test]
    fn output_properties_do_not_touch() {
        let mut doc = Document::new("Out");
        let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
        doc.set_property(&obj, "TypeOutput", 3).unwrap();
        assert!(!doc.object(&obj).unwrap().is_touched());
        doc.set_property(&obj, "Integer", 3).unwrap();
        assert!(doc.object(&obj).unwrap().is_touched());
    }

    #[test]
    fn property_tags_that_name_objects_are_type_errors() {
        let mut doc = Document::new("Tags");
        let obj = doc.add_object("App::FeaturePython", Some("Obj")).unwrap();
        let err = doc
            .add_property(&obj, "App::DocumentObjectExtension", "P", "", "", PropertyFlags::NONE)
            .unwrap_err();
        assert!(err.is_type_error());
        let err = doc
            .add_property(&obj, "App::PropertyNope", "P", "", "", PropertyFlags::NONE)
            .unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn editor_mode_accepts_only_runtime_modes() {
        let mut doc = Document::new("Modes");
        let obj = doc.add_object("App::FeatureTest", Some("Obj")).unwrap();
        doc.set_editor_mode(&obj, "Integer", &["ReadOnly"]).unwrap();
        assert_eq!(doc.editor_mode(&obj, "Integer").unwrap(), vec!["ReadOnly"]);
        doc.set_property(&obj, "Integer", 1).unwrap();
        assert!(doc.set_editor_mode(&obj, "Integer", &["Output"]).is_err());
        doc.set_editor_mode::<&str>(&obj, "Integer", &[]).unwrap();
        assert!(doc.editor_mode(&obj, "Integer").unwrap().is_empty());
    }
}
