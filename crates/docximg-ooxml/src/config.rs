//! Configuration settings
//!
//! Settings are read from a TOML file, usually `docximg.toml`:
//!
//! ```toml
//! [fetch]
//! timeout_secs = 10
//! allow_insecure = false
//!
//! [output]
//! path = "out/merged.docx"
//!
//! [images]
//! logo = "https://example.com/logo.png"
//! signature = "local:assets/signature.png"
//! ```
//!
//! Every section and key is optional.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::{ImageContext, ImageRef};

/// Default file name used when saving without an explicit path
pub const DEFAULT_OUTPUT: &str = "./merged.docx";

/// Errors raised while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`]
    #[error("Invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Image retrieval settings
    pub fetch: FetchSettings,
    /// Output settings
    pub output: OutputSettings,
    /// Placeholder name to image reference
    pub images: BTreeMap<String, String>,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Build an insertion context from the `[images]` table
    pub fn image_context(&self) -> ImageContext {
        self.images
            .iter()
            .map(|(name, reference)| (name.clone(), ImageRef::parse(reference)))
            .collect()
    }
}

/// Image retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchSettings {
    /// Request timeout for URL retrieval, in seconds
    pub timeout_secs: u64,
    /// Accept plain `http://` URLs
    pub allow_insecure: bool,
    /// User-Agent header sent with requests
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            allow_insecure: false,
            user_agent: format!("docximg/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// Path used by `save` when no path is given
    pub path: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}
