//! Core types for statecheck.
//!
//! This module contains the foundations shared by every validator:
//! - Dataset element types and shapes
//! - Schema versions and eras
//! - Error types and the context chain
//! - Summaries threaded between stages

pub mod types;
pub mod version;
pub mod error;
pub mod context;

// Re-export commonly used types
pub use types::{DataType, Dataset, NodeKind, Values};
pub use version::{SchemaEra, SchemaVersion};
pub use error::{Contextualize, StateError, ValidationError, ValidationReport, Violation};
pub use context::StateSummary;
