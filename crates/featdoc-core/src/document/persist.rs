//! Saving and loading documents
//!
//! A saved document is an envelope holding a JSON body and its blake3
//! checksum, optionally wrapped in a zstd frame. Included files travel inside
//! the body as hex strings and are re-materialized into the transient
//! directory of the loading document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use featdoc_graph::{DependencyGraph, ObjectId};
use featdoc_property::{
    dump, load, PropertiesDump, PropertyKind, PropertyPath, PropertyStore, PropertyValue,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::Document;
use crate::error::{DocumentError, Result};
use crate::notify::DocumentEvent;
use crate::object::DocumentObject;
use crate::proxy::ObjectProxy;

const FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    checksum: String,
    body: String,
}

/// Everything needed to rebuild a document
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DocumentFile {
    name: String,
    properties: PropertiesDump,
    objects: Vec<ObjectRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    files: Vec<EmbeddedFile>,
}

impl DocumentFile {
    #[inline]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ObjectRecord {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    id: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extensions: Vec<String>,
    properties: PropertiesDump,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    expressions: Vec<ExpressionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proxy: Option<ProxyRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExpressionRecord {
    path: String,
    formula: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProxyRecord {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    state: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct EmbeddedFile {
    object: String,
    property: String,
    file_name: String,
    content: String,
}

/// Document state set aside while a restore is in progress
struct Content {
    properties: PropertyStore,
    objects: IndexMap<String, DocumentObject>,
    ids: HashMap<ObjectId, String>,
    graph: DependencyGraph,
    next_id: u64,
    active_object: Option<String>,
}

impl Document {
    /// Save to `path` and remember it as the document's file name
    ///
    /// # Errors
    /// I/O and encoding failures.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        self.emit(DocumentEvent::SaveStarted {
            document: self.name.clone(),
            path: path.clone(),
        });
        self.set_document_property(
            "FileName",
            PropertyValue::String(path.to_string_lossy().into_owned()),
        )?;
        self.set_document_property(
            "LastModifiedDate",
            PropertyValue::String(chrono::Utc::now().to_rfc3339()),
        )?;

        let body = serde_json::to_string(&self.snapshot()?)?;
        let envelope = Envelope {
            version: FILE_VERSION,
            checksum: blake3::hash(body.as_bytes()).to_hex().to_string(),
            body,
        };
        let bytes = dump(&envelope, self.config.compression_level)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &bytes)?;

        tracing::info!(document = %self.name, path = %path.display(), bytes = bytes.len(), "document saved");
        self.emit(DocumentEvent::SaveFinished {
            document: self.name.clone(),
            path,
        });
        Ok(())
    }

    /// Save to the remembered file name
    ///
    /// # Errors
    /// [`DocumentError::NoFileName`] if the document was never saved or
    /// opened, otherwise everything [`Self::save_as`] reports.
    pub fn save(&mut self) -> Result<()> {
        let path = self.file_name().to_string();
        if path.is_empty() {
            return Err(DocumentError::NoFileName(self.name.clone()));
        }
        self.save_as(path)
    }

    /// Discard the in-memory state and reload from the remembered file name
    ///
    /// # Errors
    /// [`DocumentError::NoFileName`], I/O failures, and corrupt files.
    pub fn restore(&mut self) -> Result<()> {
        let path = PathBuf::from(self.file_name());
        if path.as_os_str().is_empty() {
            return Err(DocumentError::NoFileName(self.name.clone()));
        }
        let file = read_file(&path)?;
        self.apply(file, Some(&path))
    }

    /// Whole-document dump, compressed when `level > 0`
    ///
    /// # Errors
    /// Encoding failures, or included files that cannot be read.
    pub fn dump_content(&self, level: i32) -> Result<Vec<u8>> {
        Ok(dump(&self.snapshot()?, level)?)
    }

    /// Replace the whole document with a [`Self::dump_content`] dump
    ///
    /// The undo stacks are cleared.
    ///
    /// # Errors
    /// Malformed dumps and values that do not fit.
    pub fn restore_content(&mut self, bytes: &[u8]) -> Result<()> {
        let file: DocumentFile = load(bytes)?;
        self.apply(file, None)
    }

    fn snapshot(&self) -> Result<DocumentFile> {
        let mut files = Vec::new();
        let mut objects = Vec::with_capacity(self.objects.len());
        for object in self.objects.values() {
            for prop in object.properties().iter() {
                if prop.kind() != PropertyKind::FileIncluded {
                    continue;
                }
                let Some(path) = prop.value().as_str() else {
                    continue;
                };
                match std::fs::read(path) {
                    Ok(content) => files.push(EmbeddedFile {
                        object: object.name().to_string(),
                        property: prop.name().to_string(),
                        file_name: Path::new(path)
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                        content: hex::encode(content),
                    }),
                    Err(e) => {
                        tracing::warn!(document = %self.name, object = object.name(), property = prop.name(), error = %e, "included file missing, not saved");
                    }
                }
            }
            objects.push(ObjectRecord {
                name: object.name().to_string(),
                type_name: object.type_name().to_string(),
                id: object.id().get(),
                extensions: object.dynamic_extensions().to_vec(),
                properties: object.properties().to_persisted(),
                expressions: object
                    .expressions()
                    .iter()
                    .map(|b| ExpressionRecord {
                        path: b.target.to_string(),
                        formula: b.expression.source().to_string(),
                    })
                    .collect(),
                proxy: object.proxy().map(|p| ProxyRecord {
                    type_name: p.type_name().to_string(),
                    state: p.dump_state(),
                }),
            });
        }
        Ok(DocumentFile {
            name: self.name.clone(),
            properties: self.properties.to_persisted(),
            objects,
            files,
        })
    }

    /// Rebuild every object from a saved body
    ///
    /// Objects of unknown types and proxies without a registered factory are
    /// dropped with a warning. Restore hooks run once everything is in place.
    /// On failure the previous content is put back unchanged.
    pub(crate) fn apply(&mut self, file: DocumentFile, path: Option<&Path>) -> Result<()> {
        let previous = Content {
            properties: self.properties.clone(),
            objects: std::mem::take(&mut self.objects),
            ids: std::mem::take(&mut self.ids),
            graph: std::mem::take(&mut self.graph),
            next_id: std::mem::replace(&mut self.next_id, 1),
            active_object: self.active_object.take(),
        };
        if let Err(e) = self.apply_body(file, path) {
            tracing::warn!(document = %self.name, error = %e, "restore failed, previous content kept");
            self.properties = previous.properties;
            self.objects = previous.objects;
            self.ids = previous.ids;
            self.graph = previous.graph;
            self.next_id = previous.next_id;
            self.active_object = previous.active_object;
            return Err(e);
        }
        self.undo.clear();

        tracing::info!(document = %self.name, objects = self.objects.len(), "document restored");
        self.emit(DocumentEvent::DocumentRestored {
            document: self.name.clone(),
        });
        Ok(())
    }

    fn apply_body(&mut self, file: DocumentFile, path: Option<&Path>) -> Result<()> {

        for item in file.properties.properties {
            if let Err(e) = self.properties.restore_persisted(item) {
                tracing::warn!(document = %self.name, error = %e, "document property not restored");
            }
        }
        if let Some(path) = path {
            self.set_document_property(
                "FileName",
                PropertyValue::String(path.to_string_lossy().into_owned()),
            )?;
        }

        let mut expressions = Vec::new();
        for record in file.objects {
            let name = record.name.clone();
            match self.restore_record(record) {
                Ok((object, bindings)) => {
                    self.insert_object(object)?;
                    expressions.push((name, bindings));
                }
                Err(e) => {
                    tracing::warn!(document = %self.name, object = %name, error = %e, "object not restored");
                }
            }
        }
        for (object, bindings) in expressions {
            for binding in bindings {
                match binding.path.parse::<PropertyPath>() {
                    Ok(path) => self.rebind(&object, &path, Some(&binding.formula))?,
                    Err(e) => {
                        tracing::warn!(document = %self.name, object = %object, error = %e, "expression path not restored");
                    }
                }
            }
        }
        for embedded in file.files {
            self.restore_embedded(&embedded)?;
        }
        self.rebuild_all_edges()?;

        let hooks: Vec<(String, std::sync::Arc<dyn ObjectProxy>)> = self
            .objects
            .values()
            .filter_map(|o| o.proxy().map(|p| (o.name().to_string(), p.clone())))
            .collect();
        for (name, proxy) in hooks {
            proxy.on_document_restored(self.require_mut(&name)?);
        }
        for object in self.objects.values_mut() {
            object.purge();
        }
        Ok(())
    }

    fn restore_record(&self, record: ObjectRecord) -> Result<(DocumentObject, Vec<ExpressionRecord>)> {
        let registry = self.registry.read();
        registry.instantiable(&record.type_name)?;
        let mut store = PropertyStore::new();
        for spec in registry.type_properties(&record.type_name) {
            store.add(spec, false)?;
        }
        for kind in &record.extensions {
            for spec in registry.extension_properties(kind) {
                if !store.contains(&spec.name) {
                    store.add(spec, false)?;
                }
            }
        }
        for item in record.properties.properties {
            let name = item.name.clone();
            if !store.restore_persisted(item)? {
                tracing::debug!(document = %self.name, object = %record.name, property = %name, "saved property no longer declared");
            }
        }

        let mut object = DocumentObject::new(
            ObjectId::new(record.id),
            record.name,
            record.type_name.clone(),
            store,
        );
        object.implied_extensions = registry.implied_extensions(&record.type_name);
        object.extensions = record.extensions;
        if let Some(proxy) = record.proxy {
            match registry.proxy_factory(&proxy.type_name) {
                Some(factory) => object.proxy = Some(factory(&proxy.state)),
                None => {
                    tracing::warn!(document = %self.name, object = object.name(), proxy = %proxy.type_name, "no factory for proxy, dropped");
                }
            }
        }
        Ok((object, record.expressions))
    }

    fn restore_embedded(&mut self, embedded: &EmbeddedFile) -> Result<()> {
        if self.object(&embedded.object).is_none() {
            return Ok(());
        }
        let content = hex::decode(&embedded.content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let target = self.materialize(Path::new(&embedded.file_name), &content)?;
        self.require_mut(&embedded.object)?
            .properties
            .require_mut(&embedded.property)?
            .replace_value(PropertyValue::FileIncluded(Some(
                target.to_string_lossy().into_owned(),
            )));
        Ok(())
    }
}

/// Read and verify a saved document
pub(crate) fn read_file(path: &Path) -> Result<DocumentFile> {
    let bytes = std::fs::read(path)?;
    let envelope: Envelope = load(&bytes)?;
    if envelope.version != FILE_VERSION {
        return Err(DocumentError::UnsupportedVersion(envelope.version));
    }
    if blake3::hash(envelope.body.as_bytes()).to_hex().as_str() != envelope.checksum {
        return Err(DocumentError::ChecksumMismatch {
            path: path.to_path_buf(),
        });
    }
    Ok(serde_json::from_str(&envelope.body)?)
}
