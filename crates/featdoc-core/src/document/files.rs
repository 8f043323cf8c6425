//! Transient storage for file-included properties

use std::path::{Path, PathBuf};

use featdoc_property::PropertyValue;

use super::Document;
use crate::error::Result;

impl Document {
    /// Per-document scratch directory, created on first use
    ///
    /// Removed with the document.
    ///
    /// # Errors
    /// The directory could not be created.
    pub fn transient_dir(&self) -> Result<&Path> {
        let dir = self.transient.get_or_try_init(|| {
            let root = self
                .config
                .transient_root
                .clone()
                .unwrap_or_else(std::env::temp_dir);
            std::fs::create_dir_all(&root)?;
            let dir = tempfile::Builder::new()
                .prefix(&format!("{}-", self.name))
                .tempdir_in(root)?;
            tracing::debug!(document = %self.name, path = %dir.path().display(), "transient directory created");
            Ok::<_, std::io::Error>(dir)
        })?;
        Ok(dir.path())
    }

    /// Unused file path inside the transient directory
    ///
    /// # Errors
    /// The transient directory could not be created.
    pub fn temp_file_name(&self, prefix: &str) -> Result<PathBuf> {
        let dir = self.transient_dir()?;
        loop {
            let candidate = dir.join(format!("{prefix}{}", uuid::Uuid::new_v4().simple()));
            if !candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    /// Copy an assigned file into a fresh transient slot
    ///
    /// Returns `None` when the assignment names the file the property
    /// already holds, which makes the write a no-op.
    pub(crate) fn include_file(
        &mut self,
        object: &str,
        property: &str,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>> {
        let PropertyValue::FileIncluded(Some(source)) = &value else {
            return Ok(Some(value));
        };
        let current = self.require(object)?.properties.value(property)?;
        if current == &value {
            return Ok(None);
        }
        let target = self.materialize(Path::new(source), &std::fs::read(source)?)?;
        tracing::debug!(document = %self.name, object, property, path = %target.display(), "file included");
        Ok(Some(PropertyValue::FileIncluded(Some(
            target.to_string_lossy().into_owned(),
        ))))
    }

    /// Write `content` under a new numbered slot, keeping the base name
    pub(crate) fn materialize(&mut self, original: &Path, content: &[u8]) -> Result<PathBuf> {
        self.file_slot += 1;
        let slot = self.transient_dir()?.join(self.file_slot.to_string());
        std::fs::create_dir_all(&slot)?;
        let base = original
            .file_name()
            .map_or_else(|| "file".into(), |n| n.to_os_string());
        let target = slot.join(base);
        std::fs::write(&target, content)?;
        Ok(target)
    }
}
