//! Loading release documents from local files.

use crate::core::{DocumentValidator, SchemaValidator};
use crate::error::{ReleaseError, Result};
use crate::model::ReleaseConfig;
use serde_json::Value;
use std::path::Path;

/// Format of a release document on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    #[cfg(feature = "yaml")]
    Yaml,
    /// `.toml`
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Detect the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns an error when the path has no extension or the extension is
    /// not supported by the enabled features.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ReleaseError::Parse(format!(
                    "Unable to determine file format for: {}",
                    path.display()
                ))
            })?;

        match extension {
            "json" => Ok(Self::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Ok(Self::Yaml),
            #[cfg(feature = "toml")]
            "toml" => Ok(Self::Toml),
            _ => Err(ReleaseError::Parse(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    /// Parse `text` into a raw, not yet validated document.
    pub fn parse(self, text: &str) -> Result<Value> {
        match self {
            Self::Json => serde_json::from_str(text)
                .map_err(|e| ReleaseError::Parse(format!("Invalid JSON: {}", e))),
            #[cfg(feature = "yaml")]
            Self::Yaml => serde_yaml::from_str(text)
                .map_err(|e| ReleaseError::Parse(format!("Invalid YAML: {}", e))),
            #[cfg(feature = "toml")]
            Self::Toml => toml::from_str(text)
                .map_err(|e| ReleaseError::Parse(format!("Invalid TOML: {}", e))),
        }
    }
}

impl ReleaseConfig {
    /// Load and validate a release document from a local file.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseError::Io`] if the file cannot be read,
    /// [`ReleaseError::Parse`] if it is not a supported format, and
    /// [`ReleaseError::IncorrectConfig`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use feature_release::model::ReleaseConfig;
    ///
    /// # fn example() -> feature_release::error::Result<()> {
    /// let config = ReleaseConfig::from_file("config/releases.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with(path, &SchemaValidator)
    }

    /// Like [`ReleaseConfig::from_file`] with a custom validator.
    pub fn from_file_with(path: impl AsRef<Path>, validator: &dyn DocumentValidator) -> Result<Self> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        let document = format.parse(&text)?;

        tracing::debug!(path = %path.display(), "loaded release document");
        Ok(validator.validate(&document)?)
    }
}
