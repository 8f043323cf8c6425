//! Object lifecycle, lookup and graph queries

use std::collections::HashMap;

use featdoc_graph::ObjectId;
use featdoc_property::{PropertyStore, PropertyValue};
use regex::Regex;

use super::{Document, Origin};
use crate::error::{DocumentError, Result};
use crate::notify::DocumentEvent;
use crate::object::DocumentObject;
use crate::transaction::TransactionOp;

/// Object lookup key: a name or a stable id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKey {
    Name(String),
    Id(ObjectId),
}

impl From<&str> for ObjectKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ObjectKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<ObjectId> for ObjectKey {
    fn from(id: ObjectId) -> Self {
        Self::Id(id)
    }
}

/// Keys coming from loosely typed callers: strings are names, unsigned
/// integers are ids, anything else is rejected
impl TryFrom<&serde_json::Value> for ObjectKey {
    type Error = DocumentError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(name) => Ok(Self::Name(name.clone())),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(|raw| Self::Id(ObjectId::new(raw)))
                .ok_or_else(|| DocumentError::InvalidKey(format!("{n} is not an object id"))),
            other => Err(DocumentError::InvalidKey(format!(
                "expected a name or an id, got {other}"
            ))),
        }
    }
}

impl Document {
    /// Create an object of a registered type
    ///
    /// `name` is only a hint; the returned name is identifier-safe and
    /// unique in this document. Without a hint the short type name is used.
    ///
    /// # Errors
    /// Unknown, abstract or extension-only type tags.
    pub fn add_object(&mut self, type_tag: &str, name: Option<&str>) -> Result<String> {
        let (specs, implied) = {
            let registry = self.registry.read();
            registry.instantiable(type_tag)?;
            (
                registry.type_properties(type_tag),
                registry.implied_extensions(type_tag),
            )
        };
        let base = name.map_or_else(
            || type_tag.rsplit("::").next().unwrap_or(type_tag).to_string(),
            ToString::to_string,
        );
        let name = self.unique_object_name(&base);

        let mut store = PropertyStore::new();
        for spec in specs {
            store.add(spec, false)?;
        }
        if let Some(label) = store.get_mut("Label") {
            label.replace_value(PropertyValue::String(name.clone()));
        }

        let id = ObjectId::new(self.next_id);
        self.next_id += 1;
        let mut object = DocumentObject::new(id, name.clone(), type_tag.to_string(), store);
        object.implied_extensions = implied;

        self.record(
            TransactionOp::ObjectCreated(Box::new(object.clone())),
            Origin::External,
        );
        self.insert_object(object)?;
        self.active_object = Some(name.clone());
        tracing::debug!(document = %self.name, object = %name, r#type = type_tag, "object added");
        self.emit(DocumentEvent::ObjectCreated {
            document: self.name.clone(),
            object: name.clone(),
        });
        Ok(name)
    }

    pub(crate) fn insert_object(&mut self, object: DocumentObject) -> Result<()> {
        let name = object.name().to_string();
        self.graph.add_node(object.id());
        self.next_id = self.next_id.max(object.id().get() + 1);
        self.ids.insert(object.id(), name.clone());
        self.objects.insert(name.clone(), object);
        self.refresh_edges(&name)
    }

    /// Remove an object and every link pointing at it
    ///
    /// Each unlink is an ordinary recorded property change, so undoing the
    /// removal also restores group memberships and link lists.
    ///
    /// # Errors
    /// Missing object.
    pub fn remove_object(&mut self, name: &str) -> Result<()> {
        let id = self.require(name)?.id();
        let referrers: Vec<String> = self
            .names_of(self.graph.in_list(id))
            .into_iter()
            .map(ToString::to_string)
            .collect();
        for referrer in referrers {
            let edits: Vec<(String, PropertyValue)> = self
                .require(&referrer)?
                .properties
                .iter()
                .filter(|p| p.kind().is_link())
                .filter_map(|p| {
                    let mut value = p.value().clone();
                    value
                        .unlink(name)
                        .then(|| (p.name().to_string(), value))
                })
                .collect();
            for (property, value) in edits {
                self.write_property(&referrer, &property, value, Origin::Cascade)?;
            }
        }

        let Some(removed) = self.objects.shift_remove(name) else {
            return Err(DocumentError::ObjectNotFound(name.to_string()));
        };
        self.ids.remove(&id);
        self.graph.remove_node(id);
        if self.active_object.as_deref() == Some(name) {
            self.active_object = None;
        }
        self.record(TransactionOp::ObjectDeleted(Box::new(removed)), Origin::External);
        tracing::debug!(document = %self.name, object = name, "object removed");
        self.emit(DocumentEvent::ObjectDeleted {
            document: self.name.clone(),
            object: name.to_string(),
        });
        Ok(())
    }

    /// Object by name or id
    pub fn get(&self, key: impl Into<ObjectKey>) -> Option<&DocumentObject> {
        match key.into() {
            ObjectKey::Name(name) => self.object(&name),
            ObjectKey::Id(id) => self.object_by_id(id),
        }
    }

    /// Objects matching every given filter
    ///
    /// `type_tag` also matches derived types. The patterns must match the
    /// whole name or label.
    ///
    /// # Errors
    /// Unknown type tags or extension kinds (type errors), invalid patterns.
    pub fn find_objects(
        &self,
        type_tag: Option<&str>,
        name: Option<&str>,
        label: Option<&str>,
    ) -> Result<Vec<&DocumentObject>> {
        let registry = self.registry.read();
        if let Some(tag) = type_tag {
            if registry.is_extension(tag) {
                return Err(DocumentError::NotAnObjectType(tag.to_string()));
            }
            if registry.object_type(tag).is_none() {
                return Err(DocumentError::UnknownType(tag.to_string()));
            }
        }
        let name = name.map(anchored).transpose()?;
        let label = label.map(anchored).transpose()?;
        Ok(self
            .objects
            .values()
            .filter(|o| type_tag.map_or(true, |t| registry.is_derived_from(o.type_name(), t)))
            .filter(|o| name.as_ref().map_or(true, |re| re.is_match(o.name())))
            .filter(|o| label.as_ref().map_or(true, |re| re.is_match(o.label())))
            .collect())
    }

    /// Duplicate an object, optionally with everything it depends on
    ///
    /// Links among the copied objects are redirected to the copies. Returns
    /// the new names, the copy of `name` first.
    ///
    /// # Errors
    /// Missing object, or a copied property that cannot be restored.
    pub fn copy_object(&mut self, name: &str, with_dependencies: bool) -> Result<Vec<String>> {
        let id = self.require(name)?.id();
        let mut sources = vec![name.to_string()];
        if with_dependencies {
            sources.extend(
                self.names_of(self.graph.out_list_recursive(id))
                    .into_iter()
                    .map(ToString::to_string),
            );
        }

        let mut renamed: HashMap<String, String> = HashMap::new();
        let mut created = Vec::with_capacity(sources.len());
        for source in &sources {
            let original = self.require(source)?;
            let type_name = original.type_name().to_string();
            let extensions = original.dynamic_extensions().to_vec();
            let proxy = original.proxy.clone();
            let content = original.properties.dump_content(0)?;

            let copy = self.add_object(&type_name, Some(source))?;
            for kind in &extensions {
                self.add_extension(&copy, kind)?;
            }
            self.restore_object_content(&copy, &content)?;
            self.write_property(&copy, "Label", PropertyValue::from(copy.as_str()), Origin::Cascade)
                .or_else(|e| if e.is_attribute_error() { Ok(()) } else { Err(e) })?;
            self.require_mut(&copy)?.proxy = proxy;
            renamed.insert(source.clone(), copy.clone());
            created.push(copy);
        }

        for copy in &created {
            let edits: Vec<(String, PropertyValue)> = self
                .require(copy)?
                .properties
                .iter()
                .filter(|p| p.kind().is_link())
                .filter_map(|p| {
                    let mut value = p.value().clone();
                    relink(&mut value, &renamed).then(|| (p.name().to_string(), value))
                })
                .collect();
            for (property, value) in edits {
                self.write_property(copy, &property, value, Origin::Cascade)?;
            }
        }
        for (source, copy) in sources.iter().zip(&created) {
            let bindings: Vec<(String, String)> = self.expressions(source)?;
            for (path, formula) in bindings {
                self.set_expression(copy, &path, Some(&formula))?;
            }
        }
        Ok(created)
    }

    /// Type tags `add_object` accepts
    #[must_use]
    pub fn supported_types(&self) -> Vec<String> {
        self.registry
            .read()
            .instantiable_types()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Objects referencing `name`
    ///
    /// # Errors
    /// Missing object.
    pub fn in_list(&self, name: &str) -> Result<Vec<&str>> {
        let id = self.require(name)?.id();
        Ok(self.names_of(self.graph.in_list(id)))
    }

    /// Objects `name` references
    ///
    /// # Errors
    /// Missing object.
    pub fn out_list(&self, name: &str) -> Result<Vec<&str>> {
        let id = self.require(name)?.id();
        Ok(self.names_of(self.graph.out_list(id)))
    }

    /// # Errors
    /// Missing object.
    pub fn in_list_recursive(&self, name: &str) -> Result<Vec<&str>> {
        let id = self.require(name)?.id();
        Ok(self.names_of(self.graph.in_list_recursive(id)))
    }

    /// # Errors
    /// Missing object.
    pub fn out_list_recursive(&self, name: &str) -> Result<Vec<&str>> {
        let id = self.require(name)?.id();
        Ok(self.names_of(self.graph.out_list_recursive(id)))
    }

    /// Objects nothing references
    #[must_use]
    pub fn root_objects(&self) -> Vec<&str> {
        self.names_of(self.graph.roots())
    }

    /// Every object, referencing objects before the ones they reference
    #[must_use]
    pub fn topological_sorted_objects(&self) -> Vec<&str> {
        self.names_of(self.graph.topological_order())
    }

    /// True if `from` depends on `to`, directly or transitively
    ///
    /// # Errors
    /// Missing object.
    pub fn depends_on(&self, from: &str, to: &str) -> Result<bool> {
        let from = self.require(from)?.id();
        let to = self.require(to)?.id();
        Ok(self.graph.depends_on(from, to))
    }
}

fn anchored(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{pattern})$"))?)
}

fn relink(value: &mut PropertyValue, renamed: &HashMap<String, String>) -> bool {
    let swap = |name: &mut String| match renamed.get(name.as_str()) {
        Some(new) => {
            new.clone_into(name);
            true
        }
        None => false,
    };
    match value {
        PropertyValue::Link(Some(name)) => swap(name),
        PropertyValue::LinkSub(Some(link)) => swap(&mut link.object),
        PropertyValue::LinkList(names) => names.iter_mut().fold(false, |acc, n| swap(n) | acc),
        PropertyValue::LinkSubList(links) => links
            .iter_mut()
            .fold(false, |acc, l| swap(&mut l.object) | acc),
        _ => false,
    }
}
