//! Validation of the `custom_selections` stage.
//!
//! Users can select arbitrary sets of cells; each selection is compared
//! against all other cells and the marker statistics are stored.
//!
//! `parameters/selections` has one integer dataset of cell indices per
//! selection. From 2.0, `results/per_selection/<selection>/<modality>`
//! holds the statistics; before that, `results/markers/<selection>` holds
//! them for the single RNA modality.

use crate::container::Group;
use crate::core::error::{Contextualize, ValidationError, ValidationResult};
use crate::core::types::DataType;
use crate::core::version::SchemaVersion;
use crate::validation::inputs::Details;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Name of the stage group at the container root.
pub const STAGE: &str = "custom_selections";

/// Effect sizes reported for every marker comparison.
pub const MARKER_EFFECTS: [&str; 4] = ["lfc", "delta_detected", "cohen", "auc"];

/// Result of the `custom_selections` stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSummary {
    /// Selection names in declaration order.
    pub selections: Vec<String>,
}

/// Check the `custom_selections` stage.
///
/// `num_cells` is the number of cells after quality filtering; selection
/// indices refer to the filtered dataset.
pub fn validate(
    root: &Group,
    num_cells: usize,
    details: &Details,
    version: SchemaVersion,
) -> ValidationResult<SelectionSummary> {
    let era = version.era();
    debug!("validating '{}' (era {}, {} cells)", STAGE, era, num_cells);

    let handle = root.open_group(STAGE)?;

    let selections = validate_parameters(handle, num_cells)
        .context_with(|| format!("failed to retrieve parameters from '{}'", STAGE))?;

    let results = if era.is_multimodal() {
        validate_results(handle, &selections, details)
    } else {
        let num_genes = details
            .num_features
            .first()
            .copied()
            .ok_or_else(|| ValidationError::invalid("no feature count available for the RNA modality"))?;
        validate_legacy_results(handle, &selections, num_genes)
    };
    results.context_with(|| format!("failed to retrieve results from '{}'", STAGE))?;

    Ok(SelectionSummary { selections })
}

/// Check `custom_selections/parameters`, returning the selection names.
pub fn validate_parameters(handle: &Group, num_cells: usize) -> ValidationResult<Vec<String>> {
    let phandle = handle.open_group("parameters")?;
    let shandle = phandle.open_group("selections")?;

    let mut names = Vec::with_capacity(shandle.len());
    for name in shandle.names() {
        let members = shandle.load_integer_vector(name)?;
        let in_range = |&i: &i64| usize::try_from(i).map_or(false, |i| i < num_cells);
        if !members.iter().all(in_range) {
            return Err(ValidationError::invalid(format!(
                "indices out of range for selection '{}'",
                name
            )));
        }
        trace!("selection '{}' has {} cells", name, members.len());
        names.push(name.to_string());
    }
    Ok(names)
}

/// Check the per-modality layout used from 2.0.
pub fn validate_results(handle: &Group, selections: &[String], details: &Details) -> ValidationResult<()> {
    let rhandle = handle.open_group("results")?;
    let mhandle = rhandle.open_group("per_selection")?;
    check_selection_count(mhandle, selections, "per_selection")?;

    for selection in selections {
        mhandle
            .open_group(selection)
            .and_then(|shandle| check_selection_modalities(shandle, details))
            .context_with(|| {
                format!(
                    "failed to retrieve statistics for selection '{}' in 'results/per_selection'",
                    selection
                )
            })?;
    }
    Ok(())
}

/// Check the statistics of one selection for every modality.
fn check_selection_modalities(shandle: &Group, details: &Details) -> ValidationResult<()> {
    for (modality, num_features) in details.modality_features() {
        shandle
            .open_group(modality)
            .and_then(|ahandle| check_marker_statistics(ahandle, num_features))
            .context_with(|| format!("failed to retrieve statistics for modality '{}'", modality))?;
    }
    Ok(())
}

/// Check the single-modality layout used before 2.0.
pub fn validate_legacy_results(handle: &Group, selections: &[String], num_genes: usize) -> ValidationResult<()> {
    let rhandle = handle.open_group("results")?;
    let mhandle = rhandle.open_group("markers")?;
    check_selection_count(mhandle, selections, "markers")?;

    for selection in selections {
        mhandle
            .open_group(selection)
            .and_then(|shandle| check_marker_statistics(shandle, num_genes))
            .context_with(|| {
                format!(
                    "failed to retrieve statistics for selection '{}' in 'results/markers'",
                    selection
                )
            })?;
    }
    Ok(())
}

fn check_selection_count(mhandle: &Group, selections: &[String], field: &str) -> ValidationResult<()> {
    if mhandle.len() != selections.len() {
        return Err(ValidationError::invalid(format!(
            "number of groups in '{}' is not consistent with the expected number of selections",
            field
        )));
    }
    Ok(())
}

/// Every statistic is a float vector with one entry per feature.
pub fn check_marker_statistics(shandle: &Group, num_features: usize) -> ValidationResult<()> {
    let dims = [num_features];
    for statistic in ["means", "detected"].into_iter().chain(MARKER_EFFECTS) {
        shandle.open_dataset(statistic, DataType::Float, Some(&dims))?;
    }
    Ok(())
}
