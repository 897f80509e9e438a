//! Schema versions and eras.
//!
//! A state file declares its format version as a single integer,
//! `major * 1_000_000 + minor * 1_000 + patch`. Every layout decision in the
//! validators is a comparison against a small set of fixed thresholds. Those
//! comparisons are resolved once per call into a [`SchemaEra`], and the
//! validators dispatch on the era rather than re-testing raw numbers.
//!
//! Each threshold is the inclusive lower bound of its era. Adding a new era
//! means adding a threshold; existing eras keep their bounds.

use crate::core::error::{StateError, StateResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Integer-encoded format version of a state file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    /// Version 1.0, the oldest format.
    pub const V1_0: Self = Self(1_000_000);
    /// Version 1.1: multi-matrix inputs and blocking methods.
    pub const V1_1: Self = Self(1_001_000);
    /// Version 1.2: feature identities replace permutations.
    pub const V1_2: Self = Self(1_002_000);
    /// Version 2.0: multiple modalities.
    pub const V2_0: Self = Self(2_000_000);
    /// Most recent format understood by this crate.
    pub const LATEST: Self = Self::V2_0;

    /// Wrap a raw integer version.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Build a version from its components.
    ///
    /// Minor and patch numbers occupy three decimal digits each.
    pub fn from_parts(major: u64, minor: u64, patch: u64) -> StateResult<Self> {
        if minor >= 1_000 || patch >= 1_000 {
            return Err(StateError::VersionRange(format!(
                "{}.{}.{}: minor and patch must be below 1000",
                major, minor, patch
            )));
        }
        let raw = major
            .checked_mul(1_000_000)
            .and_then(|v| v.checked_add(minor * 1_000 + patch))
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                StateError::VersionRange(format!("{}.{}.{}: major version too large", major, minor, patch))
            })?;
        Ok(Self(raw))
    }

    /// Parse `"major.minor.patch"`, or a raw integer such as `"1002000"`.
    pub fn parse(text: &str) -> StateResult<Self> {
        let text = text.trim();
        if let Ok(raw) = text.parse::<u32>() {
            return Ok(Self(raw));
        }
        let parsed = semver::Version::parse(text)?;
        Self::from_parts(parsed.major, parsed.minor, parsed.patch)
    }

    /// The raw integer encoding.
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        self.0 / 1_000_000
    }

    pub const fn minor(self) -> u32 {
        (self.0 / 1_000) % 1_000
    }

    pub const fn patch(self) -> u32 {
        self.0 % 1_000
    }

    /// Strictly older than `threshold`.
    pub fn is_before(self, threshold: Self) -> bool {
        self < threshold
    }

    /// At or after `threshold`.
    pub fn is_at_least(self, threshold: Self) -> bool {
        self >= threshold
    }

    /// Within `[lower, upper)`.
    pub fn in_range(self, lower: Self, upper: Self) -> bool {
        self.is_at_least(lower) && self.is_before(upper)
    }

    /// The era this version falls into.
    pub fn era(self) -> SchemaEra {
        SchemaEra::of(self)
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

impl FromStr for SchemaVersion {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A range of versions sharing one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchemaEra {
    /// Everything below 1.1, including pre-release versions below 1.0.
    #[serde(rename = "1.0")]
    V1_0,
    /// `[1.1, 1.2)`
    #[serde(rename = "1.1")]
    V1_1,
    /// `[1.2, 2.0)`
    #[serde(rename = "1.2")]
    V1_2,
    /// `2.0` onwards.
    #[serde(rename = "2.0")]
    V2_0,
}

impl SchemaEra {
    /// All eras, oldest first.
    pub const ALL: [SchemaEra; 4] = [
        SchemaEra::V1_0,
        SchemaEra::V1_1,
        SchemaEra::V1_2,
        SchemaEra::V2_0,
    ];

    /// Resolve the era of a version.
    pub fn of(version: SchemaVersion) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|era| version.is_at_least(era.floor()))
            .unwrap_or(SchemaEra::V1_0)
    }

    /// Inclusive lower bound of this era.
    pub fn floor(self) -> SchemaVersion {
        match self {
            SchemaEra::V1_0 => SchemaVersion::V1_0,
            SchemaEra::V1_1 => SchemaVersion::V1_1,
            SchemaEra::V1_2 => SchemaVersion::V1_2,
            SchemaEra::V2_0 => SchemaVersion::V2_0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SchemaEra::V1_0 => "1.0",
            SchemaEra::V1_1 => "1.1",
            SchemaEra::V1_2 => "1.2",
            SchemaEra::V2_0 => "2.0",
        }
    }

    /// Whether `inputs/parameters/format` may list several matrices.
    pub fn supports_multi_matrix(self) -> bool {
        self >= SchemaEra::V1_1
    }

    /// Whether `pca/parameters/block_method` is recorded.
    pub fn has_block_method(self) -> bool {
        self >= SchemaEra::V1_1
    }

    /// Whether the state is organised per modality.
    pub fn is_multimodal(self) -> bool {
        self >= SchemaEra::V2_0
    }
}

impl fmt::Display for SchemaEra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
