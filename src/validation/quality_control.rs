//! Validation of the `quality_control` stage.
//!
//! `results/discards` flags every loaded cell as kept (zero) or discarded
//! (non-zero). Later stages only see the kept cells.

use crate::container::Group;
use crate::core::error::{Contextualize, ValidationResult, Violation};
use crate::core::types::DataType;
use crate::core::version::SchemaVersion;
use log::debug;

/// Name of the stage group at the container root.
pub const STAGE: &str = "quality_control";

/// Check the `quality_control` stage, returning the number of retained cells.
pub fn validate(root: &Group, num_cells: usize, version: SchemaVersion) -> ValidationResult<usize> {
    debug!("validating '{}' (era {}, {} cells)", STAGE, version.era(), num_cells);

    let handle = root.open_group(STAGE)?;
    let retained = handle
        .open_group("results")
        .and_then(|rhandle| {
            check_discard_vector(rhandle, num_cells)
                .context_with(|| "failed to retrieve discard information from 'results'")
        })
        .context_with(|| format!("failed to retrieve results from '{}'", STAGE))?;

    debug!("'{}' passed: {} of {} cells retained", STAGE, retained, num_cells);
    Ok(retained)
}

/// Check `discards` and count the cells it keeps.
pub fn check_discard_vector(rhandle: &Group, num_cells: usize) -> ValidationResult<usize> {
    let discards = rhandle.open_vector("discards", DataType::Integer)?;
    if discards.len() != num_cells {
        return Err(Violation::ShapeMismatch {
            name: "discards".to_string(),
            expected: vec![num_cells],
            found: discards.shape().to_vec(),
        }
        .into());
    }
    let values = discards.as_integers().unwrap_or_default();
    Ok(values.iter().filter(|&&flag| flag == 0).count())
}
