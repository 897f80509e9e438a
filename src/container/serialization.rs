//! Loading and saving containers as JSON.
//!
//! The root of a state file is a group. Groups are written as
//! `{"group": {...children...}}` and datasets as
//! `{"dataset": {"dtype": ..., "shape": [...], "data": [...]}}`, with
//! children in enumeration order.

use crate::container::group::Group;
use crate::core::error::StateResult;
use std::fs;
use std::path::Path;

impl Group {
    /// Deserialize a container from a JSON string.
    pub fn from_json(json: &str) -> StateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> StateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to compact JSON (no whitespace).
    pub fn to_json_compact(&self) -> StateResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Read a state file from disk.
pub fn load_state(path: impl AsRef<Path>) -> StateResult<Group> {
    let path = path.as_ref();
    log::debug!("loading state file {}", path.display());
    let text = fs::read_to_string(path)?;
    Group::from_json(&text)
}
