//! # Statecheck - Versioned State Validation
//!
//! Statecheck validates persisted snapshots of a single-cell analysis
//! session. A snapshot is a hierarchical container of named groups and
//! typed datasets, one top-level group per analysis step. Its layout has
//! changed across format versions, and every check here resolves the
//! layout for the version it is given.
//!
//! ## Features
//!
//! - **Version-aware**: layouts from 1.0 to 2.0, selected by era thresholds
//! - **Contextual errors**: every failure carries the path of phases that led to it
//! - **Staged**: steps run in analysis order, each feeding the next
//! - **Configurable**: stage selection and defaults from a TOML file
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use statecheck::prelude::*;
//!
//! let state = load_state("session.json")?;
//! let version = SchemaVersion::parse("1.2.0")?;
//!
//! // Check a single step
//! let details = inputs::validate(&state, true, version)?;
//! println!("{} cells, modalities {:?}", details.num_cells, details.modalities);
//!
//! // Or run every step
//! let report = ValidationPipeline::default().validate(&state, version);
//! println!("{}", report.summary_line());
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Dataset types, versions, errors and stage summaries
//! - [`container`]: Groups, checked readers and the JSON representation
//! - [`validation`]: Per-step validators and the stage pipeline
//! - [`config`]: Validator settings

#![warn(clippy::all)]

pub mod config;
pub mod container;
pub mod core;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use statecheck::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{DataType, Dataset, NodeKind, Values};
    pub use crate::core::version::{SchemaEra, SchemaVersion};
    pub use crate::core::context::StateSummary;

    // Errors
    pub use crate::core::error::{
        Contextualize, StateError, StateResult, ValidationError, ValidationReport, ValidationResult,
        Violation,
    };

    // Container
    pub use crate::container::{load_state, Group, Node, StringField};

    // Step validators
    pub use crate::validation::{combine_embeddings, custom_selections, inputs, pca, quality_control};
    pub use crate::validation::inputs::Details;

    // Pipeline
    pub use crate::validation::pipeline::ValidationPipeline;
    pub use crate::validation::stages::{stage_by_name, ValidationStage, STAGE_NAMES};

    // Config
    pub use crate::config::ValidatorConfig;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
