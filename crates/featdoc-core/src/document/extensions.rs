//! Runtime extensions and proxies

use std::sync::Arc;

use featdoc_property::Property;

use super::{Document, Origin};
use crate::error::{DocumentError, Result};
use crate::notify::DocumentEvent;
use crate::proxy::ObjectProxy;
use crate::transaction::TransactionOp;

impl Document {
    /// Attach an extension kind to an object
    ///
    /// The kind's properties are added as static properties of the object;
    /// names the object already has are left alone.
    ///
    /// # Errors
    /// Unknown or non-attachable kinds are type errors. Attaching a kind the
    /// object already has, directly or through its type, is structural.
    pub fn add_extension(&mut self, object: &str, kind: &str) -> Result<()> {
        self.require(object)?;
        let specs = {
            let registry = self.registry.read();
            let ext = registry
                .extension(kind)
                .ok_or_else(|| DocumentError::UnknownType(kind.to_string()))?;
            if !ext.is_attachable() {
                return Err(DocumentError::NotInstantiable(kind.to_string()));
            }
            registry.extension_properties(kind)
        };
        if self.has_extension(object, kind)? {
            return Err(DocumentError::structural(format!(
                "'{object}' already has extension '{kind}'"
            )));
        }

        // build every contributed property before touching the object
        let fresh = {
            let target = self.require(object)?;
            specs
                .into_iter()
                .filter(|spec| !target.properties.contains(&spec.name))
                .map(|spec| Property::from_spec(spec, false))
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        self.emit(DocumentEvent::BeforeAddExtension {
            document: self.name.clone(),
            object: object.to_string(),
            extension: kind.to_string(),
        });
        let target = self.require_mut(object)?;
        let added: Vec<String> = fresh.iter().map(|p| p.name().to_string()).collect();
        for prop in fresh {
            target.properties.insert(prop);
        }
        target.extensions.push(kind.to_string());

        self.record(
            TransactionOp::ExtensionAdded {
                object: object.to_string(),
                kind: kind.to_string(),
                properties: added,
            },
            Origin::External,
        );
        self.refresh_edges(object)?;
        tracing::debug!(document = %self.name, object, extension = kind, "extension added");
        self.emit(DocumentEvent::ExtensionAdded {
            document: self.name.clone(),
            object: object.to_string(),
            extension: kind.to_string(),
        });
        Ok(())
    }

    /// True if an attached extension is `kind` or derives from it
    ///
    /// # Errors
    /// Missing object.
    pub fn has_extension(&self, object: &str, kind: &str) -> Result<bool> {
        let target = self.require(object)?;
        let registry = self.registry.read();
        Ok(target.extensions().any(|ext| registry.extension_is_a(ext, kind)))
    }

    /// Detach an extension added at runtime, dropping its properties
    ///
    /// Bindings on the dropped properties are cleared first.
    ///
    /// # Errors
    /// Missing object. Detaching an extension implied by the type, or one the
    /// object does not have, is structural.
    pub fn remove_extension(&mut self, object: &str, kind: &str) -> Result<()> {
        let target = self.require(object)?;
        if target.implied_extensions.iter().any(|k| k == kind) {
            return Err(DocumentError::structural(format!(
                "extension '{kind}' is part of the type of '{object}'"
            )));
        }
        if !target.extensions.iter().any(|k| k == kind) {
            return Err(DocumentError::structural(format!(
                "'{object}' has no extension '{kind}'"
            )));
        }
        let type_props: Vec<String> = {
            let registry = self.registry.read();
            registry
                .type_properties(target.type_name())
                .into_iter()
                .map(|s| s.name)
                .collect()
        };
        let contributed: Vec<String> = {
            let registry = self.registry.read();
            registry
                .extension_properties(kind)
                .into_iter()
                .map(|s| s.name)
                .filter(|n| !type_props.contains(n) && target.properties.contains(n))
                .collect()
        };

        let bound: Vec<String> = target
            .expressions
            .iter()
            .filter(|b| contributed.iter().any(|n| n == b.target.property_name()))
            .map(|b| b.target.to_string())
            .collect();
        for path in bound {
            self.set_expression(object, &path, None)?;
        }

        let target = self.require_mut(object)?;
        target.extensions.retain(|k| k != kind);
        let properties = contributed
            .iter()
            .filter_map(|n| target.properties.take(n))
            .collect();
        self.record(
            TransactionOp::ExtensionRemoved {
                object: object.to_string(),
                kind: kind.to_string(),
                properties,
            },
            Origin::External,
        );
        self.refresh_edges(object)?;
        tracing::debug!(document = %self.name, object, extension = kind, "extension removed");
        Ok(())
    }

    /// Install or replace the proxy of an object
    ///
    /// # Errors
    /// Missing object.
    pub fn set_proxy(&mut self, object: &str, proxy: Arc<dyn ObjectProxy>) -> Result<()> {
        tracing::debug!(document = %self.name, object, proxy = proxy.type_name(), "proxy installed");
        self.require_mut(object)?.proxy = Some(proxy);
        Ok(())
    }

    /// Proxy of an object, if any
    ///
    /// # Errors
    /// Missing object.
    pub fn proxy(&self, object: &str) -> Result<Option<&Arc<dyn ObjectProxy>>> {
        Ok(self.require(object)?.proxy())
    }
}
