//! Summaries threaded between validation stages.
//!
//! Each stage reads what earlier stages established about the state (cell
//! counts, modalities, embedding sizes) and records its own findings for
//! the stages after it.

use crate::core::error::{ValidationResult, Violation};
use crate::core::version::{SchemaEra, SchemaVersion};
use crate::validation::combine_embeddings::EmbeddingSummary;
use crate::validation::custom_selections::SelectionSummary;
use crate::validation::inputs::Details;
use crate::validation::pca::PcaSummary;
use serde::{Deserialize, Serialize};

/// Everything learned about a state file so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSummary {
    /// Version the state was validated against.
    pub version: SchemaVersion,
    /// Era resolved from `version`.
    pub era: SchemaEra,
    /// Dataset details from the `inputs` stage.
    pub details: Option<Details>,
    /// Cells retained after quality control.
    pub retained_cells: Option<usize>,
    /// Components from the `pca` stage.
    pub pca: Option<PcaSummary>,
    /// Result of the `combine_embeddings` stage.
    pub embeddings: Option<EmbeddingSummary>,
    /// Result of the `custom_selections` stage.
    pub selections: Option<SelectionSummary>,
}

impl StateSummary {
    /// Create an empty summary for a given version.
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            era: version.era(),
            details: None,
            retained_cells: None,
            pca: None,
            embeddings: None,
            selections: None,
        }
    }

    /// Dataset details, which every downstream stage needs.
    pub fn require_details(&self, stage: &str) -> ValidationResult<&Details> {
        self.details.as_ref().ok_or_else(|| {
            Violation::MissingPrerequisite {
                stage: stage.to_string(),
                requires: "inputs".to_string(),
            }
            .into()
        })
    }

    /// Number of cells seen by stages after quality control.
    ///
    /// Falls back to the loaded cell count when no filtering was validated.
    pub fn analysis_cells(&self, stage: &str) -> ValidationResult<usize> {
        match self.retained_cells {
            Some(cells) => Ok(cells),
            None => Ok(self.require_details(stage)?.num_cells),
        }
    }

    /// Components from the dimensionality reduction stage.
    pub fn require_pca(&self, stage: &str) -> ValidationResult<&PcaSummary> {
        self.pca.as_ref().ok_or_else(|| {
            Violation::MissingPrerequisite {
                stage: stage.to_string(),
                requires: "pca".to_string(),
            }
            .into()
        })
    }
}
