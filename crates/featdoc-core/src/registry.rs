//! Object types, extension kinds and proxy factories
//!
//! One [`TypeRegistry`] is shared by every document of an application. Types
//! form a single-parent hierarchy; a type inherits the properties, implied
//! extensions and executor of its ancestors, nearest declaration winning.

use std::collections::HashMap;
use std::sync::Arc;

use featdoc_property::PropertySpec;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{DocumentError, Result};
use crate::exec::{ExecContext, ExecError};
use crate::extension::{self, ExtensionKind};
use crate::proxy::ProxyFactory;

/// Per-type execution callback
pub type Executor = Arc<dyn Fn(&mut ExecContext<'_>) -> Result<(), ExecError> + Send + Sync>;

/// Registry shared between an application and its documents
pub type SharedRegistry = Arc<RwLock<TypeRegistry>>;

/// Declaration of a document object type
#[derive(Clone)]
pub struct ObjectType {
    name: String,
    parent: Option<String>,
    is_abstract: bool,
    properties: Vec<PropertySpec>,
    extensions: Vec<String>,
    executor: Option<Executor>,
}

impl ObjectType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            is_abstract: false,
            properties: Vec::new(),
            extensions: Vec::new(),
            executor: None,
        }
    }

    /// With parent type
    #[inline]
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Cannot be instantiated, only derived from
    #[inline]
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// With a static property
    #[inline]
    #[must_use]
    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    /// With an implied extension
    #[inline]
    #[must_use]
    pub fn extension(mut self, kind: impl Into<String>) -> Self {
        self.extensions.push(kind.into());
        self
    }

    /// With an execution callback
    #[must_use]
    pub fn executor<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ExecContext<'_>) -> Result<(), ExecError> + Send + Sync + 'static,
    {
        self.executor = Some(Arc::new(f));
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }
}

impl std::fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("is_abstract", &self.is_abstract)
            .field("properties", &self.properties.len())
            .field("extensions", &self.extensions)
            .field("executor", &self.executor.is_some())
            .finish()
    }
}

/// Registered types, extension kinds and proxy factories
#[derive(Default)]
pub struct TypeRegistry {
    types: IndexMap<String, ObjectType>,
    extensions: IndexMap<String, ExtensionKind>,
    proxies: HashMap<String, ProxyFactory>,
}

impl TypeRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in extension kinds and object types
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for kind in extension::builtin_kinds() {
            registry.extensions.insert(kind.name().to_string(), kind);
        }
        for ty in crate::features::builtin_types() {
            registry.types.insert(ty.name().to_string(), ty);
        }
        registry
    }

    /// Wrap for sharing
    #[must_use]
    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Register or replace an object type
    ///
    /// # Errors
    /// Fails if the parent or an implied extension is unknown, or the name is
    /// taken by an extension kind.
    pub fn register_type(&mut self, ty: ObjectType) -> Result<()> {
        if self.extensions.contains_key(&ty.name) {
            return Err(DocumentError::NotAnObjectType(ty.name));
        }
        if let Some(parent) = &ty.parent {
            if !self.types.contains_key(parent) {
                return Err(DocumentError::UnknownType(parent.clone()));
            }
        }
        if let Some(missing) = ty.extensions.iter().find(|e| !self.extensions.contains_key(*e)) {
            return Err(DocumentError::UnknownType(missing.clone()));
        }
        tracing::debug!(type_name = %ty.name, "registered object type");
        self.types.insert(ty.name.clone(), ty);
        Ok(())
    }

    /// Register or replace an extension kind
    ///
    /// # Errors
    /// Fails if the parent is unknown or the name is taken by an object type.
    pub fn register_extension(&mut self, kind: ExtensionKind) -> Result<()> {
        if self.types.contains_key(kind.name()) {
            return Err(DocumentError::structural(format!(
                "'{}' is already an object type",
                kind.name()
            )));
        }
        if let Some(parent) = kind.parent_name() {
            if !self.extensions.contains_key(parent) {
                return Err(DocumentError::UnknownType(parent.to_string()));
            }
        }
        self.extensions.insert(kind.name().to_string(), kind);
        Ok(())
    }

    /// Register the factory that rebuilds proxies saved under `name`
    pub fn register_proxy<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Value) -> Arc<dyn crate::proxy::ObjectProxy> + Send + Sync + 'static,
    {
        self.proxies.insert(name.into(), Arc::new(factory));
    }

    #[must_use]
    pub fn proxy_factory(&self, name: &str) -> Option<ProxyFactory> {
        self.proxies.get(name).cloned()
    }

    #[must_use]
    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    #[must_use]
    pub fn extension(&self, name: &str) -> Option<&ExtensionKind> {
        self.extensions.get(name)
    }

    #[inline]
    #[must_use]
    pub fn is_extension(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    /// Type that `add_object` may create
    ///
    /// # Errors
    /// [`DocumentError::UnknownType`] for unregistered names,
    /// [`DocumentError::NotAnObjectType`] for extension kinds and
    /// [`DocumentError::NotInstantiable`] for abstract types.
    pub fn instantiable(&self, name: &str) -> Result<&ObjectType> {
        match self.types.get(name) {
            Some(ty) if !ty.is_abstract => Ok(ty),
            Some(_) => Err(DocumentError::NotInstantiable(name.to_string())),
            None if self.is_extension(name) => Err(DocumentError::NotAnObjectType(name.to_string())),
            None => Err(DocumentError::UnknownType(name.to_string())),
        }
    }

    /// Names of every instantiable type, in registration order
    #[must_use]
    pub fn instantiable_types(&self) -> Vec<&str> {
        self.types
            .values()
            .filter(|t| !t.is_abstract)
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Ancestry of a type, root first
    fn type_chain(&self, name: &str) -> Vec<&ObjectType> {
        let mut chain = Vec::new();
        let mut current = self.types.get(name);
        while let Some(ty) = current {
            if chain.iter().any(|t: &&ObjectType| t.name == ty.name) {
                break;
            }
            chain.push(ty);
            current = ty.parent.as_deref().and_then(|p| self.types.get(p));
        }
        chain.reverse();
        chain
    }

    /// True if `name` is `base` or derives from it
    #[must_use]
    pub fn is_derived_from(&self, name: &str, base: &str) -> bool {
        self.type_chain(name).iter().any(|t| t.name == base)
    }

    /// Ancestry of an extension kind, root first
    #[must_use]
    pub fn extension_chain(&self, kind: &str) -> Vec<&ExtensionKind> {
        let mut chain = Vec::new();
        let mut current = self.extensions.get(kind);
        while let Some(k) = current {
            if chain.iter().any(|c: &&ExtensionKind| c.name() == k.name()) {
                break;
            }
            chain.push(k);
            current = k.parent_name().and_then(|p| self.extensions.get(p));
        }
        chain.reverse();
        chain
    }

    /// True if `kind` is `base` or a more specific variant of it
    #[must_use]
    pub fn extension_is_a(&self, kind: &str, base: &str) -> bool {
        self.extension_chain(kind).iter().any(|k| k.name() == base)
    }

    /// Properties contributed by an extension kind and its ancestors
    #[must_use]
    pub fn extension_properties(&self, kind: &str) -> Vec<PropertySpec> {
        merge_specs(
            self.extension_chain(kind)
                .into_iter()
                .flat_map(|k| k.properties().iter()),
        )
    }

    /// Static properties of a type, including those of its implied extensions
    #[must_use]
    pub fn type_properties(&self, name: &str) -> Vec<PropertySpec> {
        let chain = self.type_chain(name);
        let mut specs: Vec<PropertySpec> = Vec::new();
        for ty in &chain {
            specs.extend(ty.properties.iter().cloned());
            for ext in &ty.extensions {
                specs.extend(self.extension_properties(ext));
            }
        }
        merge_specs(specs.iter())
    }

    /// Extensions implied by a type and its ancestors
    #[must_use]
    pub fn implied_extensions(&self, name: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for ty in self.type_chain(name) {
            for ext in &ty.extensions {
                if !out.contains(ext) {
                    out.push(ext.clone());
                }
            }
        }
        out
    }

    /// Nearest executor in the ancestry of a type
    #[must_use]
    pub fn executor(&self, name: &str) -> Option<Executor> {
        self.type_chain(name)
            .into_iter()
            .rev()
            .find_map(|t| t.executor.clone())
    }
}

/// Later declarations of a name replace earlier ones in place
fn merge_specs<'a>(specs: impl Iterator<Item = &'a PropertySpec>) -> Vec<PropertySpec> {
    let mut merged: IndexMap<String, PropertySpec> = IndexMap::new();
    for spec in specs {
        merged.insert(spec.name.clone(), spec.clone());
    }
    merged.into_values().collect()
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.len())
            .field("extensions", &self.extensions.len())
            .field("proxies", &self.proxies.len())
            .finish()
    }
}
