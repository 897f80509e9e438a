//! Individual validation stages.
//!
//! Each stage checks one analysis step of a state file. Stages read what
//! earlier stages established from the [`StateSummary`] and record their own
//! findings in it.

use crate::container::Group;
use crate::core::context::StateSummary;
use crate::core::error::{StateError, StateResult, ValidationResult};
use crate::validation::{combine_embeddings, custom_selections, inputs, pca, quality_control};

/// Names accepted by [`stage_by_name`], in default pipeline order.
pub const STAGE_NAMES: [&str; 5] = [
    inputs::STAGE,
    quality_control::STAGE,
    pca::STAGE,
    combine_embeddings::STAGE,
    custom_selections::STAGE,
];

/// Trait for validation stages.
pub trait ValidationStage: Send + Sync {
    /// Name of this validation stage, matching its group in the state.
    fn name(&self) -> &str;

    /// Validate the stage, recording its findings in `summary`.
    fn validate(&self, root: &Group, summary: &mut StateSummary) -> ValidationResult<()>;
}

/// Input loading: file records, dataset dimensions and feature identities.
///
/// Must run first; every other stage depends on the [`inputs::Details`] it
/// records.
pub struct InputsStage {
    /// Whether input files are embedded in the state rather than linked.
    pub embedded: bool,
}

impl ValidationStage for InputsStage {
    fn name(&self) -> &str {
        inputs::STAGE
    }

    fn validate(&self, root: &Group, summary: &mut StateSummary) -> ValidationResult<()> {
        let details = inputs::validate(root, self.embedded, summary.version)?;
        summary.details = Some(details);
        Ok(())
    }
}

/// Per-cell discard flags.
pub struct QualityControlStage;

impl ValidationStage for QualityControlStage {
    fn name(&self) -> &str {
        quality_control::STAGE
    }

    fn validate(&self, root: &Group, summary: &mut StateSummary) -> ValidationResult<()> {
        let num_cells = summary.require_details(self.name())?.num_cells;
        let retained = quality_control::validate(root, num_cells, summary.version)?;
        summary.retained_cells = Some(retained);
        Ok(())
    }
}

/// Principal components of the RNA modality.
pub struct PcaStage;

impl ValidationStage for PcaStage {
    fn name(&self) -> &str {
        pca::STAGE
    }

    fn validate(&self, root: &Group, summary: &mut StateSummary) -> ValidationResult<()> {
        let num_cells = summary.analysis_cells(self.name())?;
        let components = pca::validate(root, num_cells, summary.version)?;
        summary.pca = Some(components);
        Ok(())
    }
}

/// Combined embedding across every loaded modality.
///
/// Only the RNA embedding has a dimensionality known to the pipeline, so
/// with several modalities the column count of `combined` is checked
/// against a lower bound.
pub struct CombineEmbeddingsStage;

impl ValidationStage for CombineEmbeddingsStage {
    fn name(&self) -> &str {
        combine_embeddings::STAGE
    }

    fn validate(&self, root: &Group, summary: &mut StateSummary) -> ValidationResult<()> {
        let num_cells = summary.analysis_cells(self.name())?;
        let rna_dims = summary.require_pca(self.name())?.num_pcs;
        let modalities = summary.require_details(self.name())?.modalities.clone();
        let embeddings = if modalities.len() > 1 {
            combine_embeddings::validate_with_known_dims(root, num_cells, &modalities, rna_dims, summary.version)?
        } else {
            combine_embeddings::validate(root, num_cells, &modalities, rna_dims, summary.version)?
        };
        summary.embeddings = Some(embeddings);
        Ok(())
    }
}

/// User-defined cell selections and their marker statistics.
pub struct CustomSelectionsStage;

impl ValidationStage for CustomSelectionsStage {
    fn name(&self) -> &str {
        custom_selections::STAGE
    }

    fn validate(&self, root: &Group, summary: &mut StateSummary) -> ValidationResult<()> {
        let num_cells = summary.analysis_cells(self.name())?;
        let details = summary.require_details(self.name())?;
        let selections = custom_selections::validate(root, num_cells, details, summary.version)?;
        summary.selections = Some(selections);
        Ok(())
    }
}

/// Build a stage from its name.
pub fn stage_by_name(name: &str, embedded: bool) -> StateResult<Box<dyn ValidationStage>> {
    let stage: Box<dyn ValidationStage> = match name {
        inputs::STAGE => Box::new(InputsStage { embedded }),
        quality_control::STAGE => Box::new(QualityControlStage),
        pca::STAGE => Box::new(PcaStage),
        combine_embeddings::STAGE => Box::new(CombineEmbeddingsStage),
        custom_selections::STAGE => Box::new(CustomSelectionsStage),
        other => return Err(StateError::UnknownStage(other.to_string())),
    };
    Ok(stage)
}
