//! Validator configuration loaded from TOML.
//!
//! ```toml
//! version = "1.2.0"     # or a raw integer such as 1002000
//! embedded = true
//! stages = ["inputs", "quality_control", "pca"]
//! parallel = true
//! ```

use crate::core::error::StateResult;
use crate::core::version::SchemaVersion;
use crate::validation::stages::STAGE_NAMES;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A version as written in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionSpec {
    Raw(u32),
    Text(String),
}

impl VersionSpec {
    pub fn resolve(&self) -> StateResult<SchemaVersion> {
        match self {
            VersionSpec::Raw(raw) => Ok(SchemaVersion::new(*raw)),
            VersionSpec::Text(text) => SchemaVersion::parse(text),
        }
    }
}

/// Settings for a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Format version of the states. Defaults to the latest.
    #[serde(default)]
    pub version: Option<VersionSpec>,

    /// Whether input files are embedded in the states.
    #[serde(default = "default_embedded")]
    pub embedded: bool,

    /// Stages to run, in order.
    #[serde(default = "default_stages")]
    pub stages: Vec<String>,

    /// Validate several files concurrently.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_embedded() -> bool {
    true
}

fn default_stages() -> Vec<String> {
    STAGE_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_parallel() -> bool {
    true
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            version: None,
            embedded: default_embedded(),
            stages: default_stages(),
            parallel: default_parallel(),
        }
    }
}

impl ValidatorConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> StateResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> StateResult<Self> {
        let path = path.as_ref();
        debug!("loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// The configured version, or the latest when unset.
    pub fn schema_version(&self) -> StateResult<SchemaVersion> {
        match &self.version {
            Some(configured) => configured.resolve(),
            None => Ok(SchemaVersion::LATEST),
        }
    }
}
