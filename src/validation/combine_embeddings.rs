//! Validation of the `combine_embeddings` stage.
//!
//! Only one embedding existed before 2.0, so the stage is absent from older
//! states and validation passes trivially. From 2.0, `parameters` records
//! whether an approximate neighbour search was used and the per-modality
//! weights; `results/combined` holds the concatenated embedding when more
//! than one modality was combined.

use crate::container::Group;
use crate::core::error::{Contextualize, ValidationError, ValidationResult, Violation};
use crate::core::types::DataType;
use crate::core::version::SchemaVersion;
use log::debug;
use serde::{Deserialize, Serialize};

/// Name of the stage group at the container root.
pub const STAGE: &str = "combine_embeddings";

/// Result of the `combine_embeddings` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingSummary {
    /// Total dimensionality across the combined modalities. `None` when only
    /// a lower bound was known, so the column count of `combined` was not
    /// checked exactly.
    pub total_dims: Option<usize>,
    /// Whether a `combined` embedding was checked. When false, downstream
    /// steps use the single modality's PCs directly.
    pub combined: bool,
}

/// Expected column count of `results/combined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinedColumns {
    /// Sum of every modality's dimensionality.
    Exact(usize),
    /// Dimensionality of the modalities known to the caller; the others
    /// add at least one column each.
    AtLeast(usize),
}

/// Check the `combine_embeddings` stage.
///
/// `modalities` are the modalities whose embeddings were combined and
/// `total_dims` the sum of their dimensionalities.
pub fn validate(
    root: &Group,
    num_cells: usize,
    modalities: &[String],
    total_dims: usize,
    version: SchemaVersion,
) -> ValidationResult<EmbeddingSummary> {
    validate_columns(root, num_cells, modalities, CombinedColumns::Exact(total_dims), version)
}

/// Check the `combine_embeddings` stage when only some modalities have a
/// known dimensionality, summing to `known_dims`.
pub fn validate_with_known_dims(
    root: &Group,
    num_cells: usize,
    modalities: &[String],
    known_dims: usize,
    version: SchemaVersion,
) -> ValidationResult<EmbeddingSummary> {
    validate_columns(root, num_cells, modalities, CombinedColumns::AtLeast(known_dims), version)
}

fn validate_columns(
    root: &Group,
    num_cells: usize,
    modalities: &[String],
    columns: CombinedColumns,
    version: SchemaVersion,
) -> ValidationResult<EmbeddingSummary> {
    let total_dims = match columns {
        CombinedColumns::Exact(dims) => Some(dims),
        CombinedColumns::AtLeast(_) => None,
    };

    let era = version.era();
    if !era.is_multimodal() {
        debug!("skipping '{}' for era {}", STAGE, era);
        return Ok(EmbeddingSummary {
            total_dims,
            combined: false,
        });
    }
    debug!("validating '{}' for modalities {:?} ({:?})", STAGE, modalities, columns);

    let handle = root.open_group(STAGE)?;

    validate_parameters(handle, modalities)
        .context_with(|| format!("failed to retrieve parameters from '{}'", STAGE))?;

    let combined = validate_results(handle, num_cells, modalities, columns)
        .context_with(|| format!("failed to retrieve results from '{}'", STAGE))?;

    Ok(EmbeddingSummary { total_dims, combined })
}

/// Check `combine_embeddings/parameters`.
pub fn validate_parameters(handle: &Group, modalities: &[String]) -> ValidationResult<()> {
    let phandle = handle.open_group("parameters")?;
    phandle.open_scalar("approximate", DataType::Integer)?;

    // An empty group means unit weights for every modality.
    let whandle = phandle.open_group("weights")?;
    if !whandle.is_empty() {
        for modality in modalities {
            whandle.open_scalar(modality, DataType::Float)?;
        }
    }
    Ok(())
}

/// Check `combine_embeddings/results`, returning whether `combined` was checked.
pub fn validate_results(
    handle: &Group,
    num_cells: usize,
    modalities: &[String],
    columns: CombinedColumns,
) -> ValidationResult<bool> {
    let rhandle = handle.open_group("results")?;
    if modalities.len() <= 1 {
        return Ok(false);
    }

    match columns {
        CombinedColumns::Exact(total_dims) => {
            rhandle.open_dataset("combined", DataType::Float, Some(&[num_cells, total_dims]))?;
        }
        CombinedColumns::AtLeast(known_dims) => {
            let combined = rhandle.open_dataset("combined", DataType::Float, None)?;
            if combined.ndims() != 2 {
                return Err(Violation::Dimensionality {
                    name: "combined".to_string(),
                    expected: 2,
                    found: combined.ndims(),
                }
                .into());
            }
            let shape = combined.shape();
            if shape[0] != num_cells {
                return Err(ValidationError::invalid(
                    "number of rows in 'combined' should be equal to the number of cells",
                ));
            }
            let minimum = known_dims + (modalities.len() - 1);
            if shape[1] < minimum {
                return Err(ValidationError::invalid(format!(
                    "'combined' has {} columns but the combined modalities need at least {}",
                    shape[1], minimum
                )));
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Dataset;

    fn modalities(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn combine_group(weights: Group, combined: Option<(usize, usize)>) -> Group {
        let parameters = Group::new()
            .with_dataset("approximate", Dataset::integer_scalar(1))
            .with_group("weights", weights);
        let mut results = Group::new();
        if let Some((rows, cols)) = combined {
            results.insert("combined", Dataset::float_matrix(rows, cols));
        }
        Group::new().with_group(
            STAGE,
            Group::new()
                .with_group("parameters", parameters)
                .with_group("results", results),
        )
    }

    #[test]
    fn test_absent_before_2_0() {
        let summary = validate(&Group::new(), 10, &modalities(&["RNA"]), 20, SchemaVersion::V1_2).unwrap();
        assert!(!summary.combined);
    }

    #[test]
    fn test_single_modality_needs_no_combined() {
        let root = combine_group(Group::new(), None);
        let summary = validate(&root, 10, &modalities(&["RNA"]), 20, SchemaVersion::V2_0).unwrap();
        assert!(!summary.combined);
    }

    #[test]
    fn test_multiple_modalities_need_combined_shape() {
        let root = combine_group(Group::new(), Some((10, 30)));
        let mods = modalities(&["RNA", "ADT"]);
        assert!(validate(&root, 10, &mods, 30, SchemaVersion::V2_0).unwrap().combined);

        let err = validate(&root, 10, &mods, 25, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().starts_with("failed to retrieve results from 'combine_embeddings'"));
    }

    #[test]
    fn test_weights_cover_every_modality() {
        let weights = Group::new().with_dataset("RNA", Dataset::float_scalar(1.0));
        let root = combine_group(weights, Some((10, 30)));
        let err = validate(&root, 10, &modalities(&["RNA", "ADT"]), 30, SchemaVersion::V2_0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to retrieve parameters from 'combine_embeddings'\n  - 'ADT' does not exist"
        );
    }

    #[test]
    fn test_weights_must_be_float_scalars() {
        let weights = Group::new().with_dataset("RNA", Dataset::integer_scalar(1));
        let root = combine_group(weights, None);
        assert!(validate(&root, 10, &modalities(&["RNA"]), 20, SchemaVersion::V2_0).is_err());
    }

    #[test]
    fn test_known_dims_lower_bound() {
        let mods = modalities(&["RNA", "ADT"]);

        let root = combine_group(Group::new(), Some((10, 25)));
        let summary = validate_with_known_dims(&root, 10, &mods, 20, SchemaVersion::V2_0).unwrap();
        assert!(summary.combined);
        assert_eq!(summary.total_dims, None);

        // Every other modality adds at least one column.
        let root = combine_group(Group::new(), Some((10, 20)));
        let err = validate_with_known_dims(&root, 10, &mods, 20, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().ends_with("need at least 21"));

        let root = combine_group(Group::new(), Some((9, 25)));
        let err = validate_with_known_dims(&root, 10, &mods, 20, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().contains("number of rows in 'combined'"));

        let root = combine_group(Group::new(), None);
        let err = validate_with_known_dims(&root, 10, &mods, 20, SchemaVersion::V2_0).unwrap_err();
        assert!(err.to_string().ends_with("'combined' does not exist"));
    }
}
