//! Error types for statecheck.
//!
//! Validation failures are always fatal to the current call. A failure is
//! raised at the leaf check that detects it and picks up one context frame
//! per enclosing phase on its way out, so the final message traces the
//! failing path through the container without needing a backtrace.

use crate::core::context::StateSummary;
use crate::core::types::{DataType, NodeKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The leaf cause of a validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("'{name}' does not exist")]
    MissingChild { name: String },

    #[error("'{name}' should be a {expected}")]
    WrongKind { name: String, expected: NodeKind },

    #[error("'{name}' should be a {expected} dataset, got {found}")]
    TypeMismatch {
        name: String,
        expected: DataType,
        found: DataType,
    },

    #[error("'{name}' should have dimensions {expected:?}, got {found:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("'{name}' should be a {expected}-dimensional dataset, got {found} dimensions")]
    Dimensionality {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("stage '{stage}' requires the results of '{requires}'")]
    MissingPrerequisite { stage: String, requires: String },

    #[error("{message}")]
    Invalid { message: String },
}

/// A validation failure plus the breadcrumb trail of enclosing phases.
///
/// Frames are stored innermost first, as they are attached while the error
/// propagates outwards, and rendered outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    violation: Violation,
    context: Vec<String>,
}

impl ValidationError {
    /// Create an error with no context frames.
    pub fn new(violation: Violation) -> Self {
        Self {
            violation,
            context: Vec::new(),
        }
    }

    /// Create an error for a content rule that does not hold.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(Violation::Invalid {
            message: message.into(),
        })
    }

    /// The leaf cause.
    pub fn violation(&self) -> &Violation {
        &self.violation
    }

    /// Context frames, outermost first.
    pub fn frames(&self) -> impl Iterator<Item = &str> {
        self.context.iter().rev().map(String::as_str)
    }

    /// Attach the next enclosing frame.
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.context.push(frame.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames() {
            write!(f, "{}\n  - ", frame)?;
        }
        write!(f, "{}", self.violation)
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.violation)
    }
}

impl From<Violation> for ValidationError {
    fn from(violation: Violation) -> Self {
        Self::new(violation)
    }
}

/// Attach a context frame to the error of a failed validation step.
pub trait Contextualize<T> {
    /// Prepend a frame built by `frame` if this is an error.
    fn context_with<F, S>(self, frame: F) -> ValidationResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> Contextualize<T> for ValidationResult<T> {
    fn context_with<F, S>(self, frame: F) -> ValidationResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.with_frame(frame()))
    }
}

/// Top-level error type for statecheck.
///
/// Covers everything around validation: reading state files and configs,
/// parsing versions, and the validation failure itself.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid version string: {0}")]
    VersionSyntax(#[from] semver::Error),

    #[error("Invalid version: {0}")]
    VersionRange(String),

    #[error("Malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("Unknown stage '{0}'")]
    UnknownStage(String),

    #[error("Invalid path pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for validation steps.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type alias for everything else.
pub type StateResult<T> = Result<T, StateError>;

// ============================================================================
// Validation Report
// ============================================================================

/// Outcome of running a validation pipeline over one container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Whether every stage passed.
    pub success: bool,
    /// Stages that completed, in order.
    pub stages_passed: Vec<String>,
    /// Stage that failed, if any.
    pub failed_stage: Option<String>,
    /// The failure, if any.
    pub error: Option<ValidationError>,
    /// Summaries collected from the stages that passed.
    pub summary: StateSummary,
    /// Time taken for validation in milliseconds.
    pub duration_ms: u64,
}

impl ValidationReport {
    /// Create an empty, successful report.
    pub fn new(summary: StateSummary) -> Self {
        Self {
            success: true,
            stages_passed: Vec::new(),
            failed_stage: None,
            error: None,
            summary,
            duration_ms: 0,
        }
    }

    /// Record a stage that passed.
    pub fn add_passed(&mut self, stage: impl Into<String>) {
        self.stages_passed.push(stage.into());
    }

    /// Record the failing stage.
    pub fn set_failure(&mut self, stage: impl Into<String>, error: ValidationError) {
        self.success = false;
        self.failed_stage = Some(stage.into());
        self.error = Some(error);
    }

    /// Get a human-readable summary.
    pub fn summary_line(&self) -> String {
        match (&self.failed_stage, self.success) {
            (_, true) => format!(
                "✓ state is valid ({} stage(s), version {})",
                self.stages_passed.len(),
                self.summary.version
            ),
            (Some(stage), false) => format!("✗ validation failed in stage '{}'", stage),
            (None, false) => "✗ validation failed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::version::SchemaVersion;

    fn failing_leaf() -> ValidationResult<()> {
        Err(ValidationError::invalid("'permutation' contains out-of-range values"))
    }

    #[test]
    fn test_frames_render_outer_to_inner() {
        let err = failing_leaf()
            .context_with(|| "failed to retrieve results from 'inputs'")
            .unwrap_err()
            .with_frame("failed to validate state");

        let frames: Vec<_> = err.frames().collect();
        assert_eq!(
            frames,
            vec![
                "failed to validate state",
                "failed to retrieve results from 'inputs'"
            ]
        );
        assert_eq!(
            err.to_string(),
            "failed to validate state\n  - failed to retrieve results from 'inputs'\n  - \
             'permutation' contains out-of-range values"
        );
    }

    #[test]
    fn test_context_with_leaves_ok_untouched() {
        let ok: ValidationResult<u32> = Ok(3);
        assert_eq!(ok.context_with(|| "never rendered").unwrap(), 3);
    }

    #[test]
    fn test_violation_messages() {
        let err = ValidationError::new(Violation::TypeMismatch {
            name: "pcs".to_string(),
            expected: DataType::Float,
            found: DataType::Integer,
        });
        assert_eq!(err.to_string(), "'pcs' should be a float dataset, got integer");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_report_failure() {
        let mut report = ValidationReport::new(StateSummary::new(SchemaVersion::LATEST));
        assert!(report.success);

        report.add_passed("inputs");
        report.set_failure("pca", ValidationError::invalid("boom"));
        assert!(!report.success);
        assert_eq!(report.failed_stage.as_deref(), Some("pca"));
        assert!(report.summary_line().contains("pca"));
    }
}
