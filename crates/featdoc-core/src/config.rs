//! Application configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, Result};

/// Settings shared by every document of an [`crate::Application`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Undo mode of new documents
    pub undo_enabled: bool,
    /// Oldest transactions are dropped past this depth; 0 means unbounded
    pub max_undo_depth: usize,
    /// zstd level used by content dumps and saved files; 0 disables compression
    pub compression_level: i32,
    /// Parent of per-document transient directories, system temp when unset
    pub transient_root: Option<PathBuf>,
}

impl AppConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With undo mode of new documents
    #[inline]
    #[must_use]
    pub fn with_undo_enabled(mut self, enabled: bool) -> Self {
        self.undo_enabled = enabled;
        self
    }

    /// With maximum undo depth
    #[inline]
    #[must_use]
    pub fn with_max_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo_depth = depth;
        self
    }

    /// With compression level
    #[inline]
    #[must_use]
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// With transient storage root
    #[inline]
    #[must_use]
    pub fn with_transient_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.transient_root = Some(root.into());
        self
    }

    /// Parse TOML text; missing keys keep their defaults
    ///
    /// # Errors
    /// [`DocumentError::Config`] for malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| DocumentError::Config(e.to_string()))
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// I/O failures and everything [`Self::from_toml_str`] rejects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// [`DocumentError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| DocumentError::Config(e.to_string()))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            undo_enabled: true,
            max_undo_depth: 0,
            compression_level: 3,
            transient_root: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str("max_undo_depth = 20").unwrap();
        assert_eq!(config.max_undo_depth, 20);
        assert!(config.undo_enabled);
        assert_eq!(config.compression_level, 3);
    }

    #[test]
    fn toml_round_trip() {
        let config = AppConfig::new()
            .with_undo_enabled(false)
            .with_compression_level(0)
            .with_transient_root("/tmp/featdoc");
        let text = config.to_toml_string().unwrap();
        assert_eq!(AppConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn mistyped_value_is_a_config_error() {
        let err = AppConfig::from_toml_str("undo_enabled = 3").unwrap_err();
        assert!(matches!(err, DocumentError::Config(_)));
    }
}
