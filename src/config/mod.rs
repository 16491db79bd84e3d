// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 merlin contributors

//! Configuration loading
//!
//! Load display, validation and export settings from .merlin.yaml

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::document::ExportOptions;
use crate::pipeline::{UnresolvedDetailPolicy, ValidationOptions, DEFAULT_LABEL_SUFFIX_LEN};
use crate::MerlinError;

/// Default configuration file name
pub const CONFIG_FILE: &str = ".merlin.yaml";

/// Configuration from .merlin.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerlinConfig {
    /// Config version
    #[serde(default = "default_version")]
    pub version: String,

    /// Unit labels
    #[serde(default)]
    pub display: DisplayConfig,

    /// Forest validation
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Document export
    #[serde(default)]
    pub export: ExportConfig,
}

fn default_version() -> String {
    "1".to_string()
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Trailing id characters used when a unit has no detail name
    #[serde(default = "default_suffix_len")]
    pub label_suffix_len: usize,
}

fn default_suffix_len() -> usize {
    DEFAULT_LABEL_SUFFIX_LEN
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            label_suffix_len: default_suffix_len(),
        }
    }
}

/// Validation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// How units without a loaded runner detail are reported
    #[serde(default)]
    pub unresolved_detail: UnresolvedDetailPolicy,
}

/// Export configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Where `merlin export` writes when no output is given
    pub default_output: Option<PathBuf>,
}

impl MerlinConfig {
    /// Load from file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, MerlinError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| MerlinError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| MerlinError::Yaml {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Load from a directory (looks for .merlin.yaml)
    pub fn load_from_dir(dir: &Path) -> Result<Self, MerlinError> {
        Self::load(&dir.join(CONFIG_FILE))
    }

    /// Options for forest validation
    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            unresolved_detail: self.validation.unresolved_detail,
        }
    }

    /// Options for document export
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            label_suffix_len: self.display.label_suffix_len,
        }
    }
}

impl Default for MerlinConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            display: DisplayConfig::default(),
            validation: ValidationConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Generate a default .merlin.yaml configuration
pub fn generate_default_config() -> String {
    format!(
        r#"# merlin configuration

version: "1"

display:
  # Trailing id characters in labels of units without a loaded detail
  label_suffix_len: {}

validation:
  # ignore | warn | error
  unresolved_detail: warn

export: {{}}
  # default_output: pipeline.yaml
"#,
        DEFAULT_LABEL_SUFFIX_LEN
    )
}
