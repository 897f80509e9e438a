//! Validation of the `pca` stage (dimensionality reduction on RNA).
//!
//! `parameters` holds `num_hvgs`, `num_pcs` and, from 1.1, `block_method`.
//! `results` holds `var_exp` (one entry per computed PC, at most `num_pcs`)
//! and `pcs`, a cells-by-PCs float matrix. Between 1.1 and 2.0, MNN
//! blocking also stores the corrected coordinates in `corrected`.

use crate::container::Group;
use crate::core::error::{Contextualize, ValidationError, ValidationResult, Violation};
use crate::core::types::DataType;
use crate::core::version::{SchemaEra, SchemaVersion};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the stage group at the container root.
pub const STAGE: &str = "pca";

/// How batch effects were handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMethod {
    None,
    Regress,
    /// Mutual nearest neighbours, before 2.0.
    Mnn,
    /// Per-block weighting, from 2.0.
    Weight,
}

impl BlockMethod {
    /// Parse a recorded method, accepting only values valid in `era`.
    pub fn parse(value: &str, era: SchemaEra) -> ValidationResult<Self> {
        let method = match value {
            "none" => Some(BlockMethod::None),
            "regress" => Some(BlockMethod::Regress),
            "mnn" if !era.is_multimodal() => Some(BlockMethod::Mnn),
            "weight" if era.is_multimodal() => Some(BlockMethod::Weight),
            _ => None,
        };
        method.ok_or_else(|| {
            ValidationError::invalid(format!("unrecognized value '{}' for the 'block_method'", value))
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockMethod::None => "none",
            BlockMethod::Regress => "regress",
            BlockMethod::Mnn => "mnn",
            BlockMethod::Weight => "weight",
        }
    }
}

impl fmt::Display for BlockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared PCA parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcaParameters {
    pub num_hvgs: usize,
    pub num_pcs: usize,
    /// Absent before 1.1.
    pub block_method: Option<BlockMethod>,
}

/// Result of the `pca` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcaSummary {
    /// Number of PCs actually stored, at most the number requested.
    pub num_pcs: usize,
    pub block_method: Option<BlockMethod>,
}

/// Check the `pca` stage.
///
/// `num_cells` is the number of cells after quality filtering.
pub fn validate(root: &Group, num_cells: usize, version: SchemaVersion) -> ValidationResult<PcaSummary> {
    let era = version.era();
    debug!("validating '{}' (era {}, {} cells)", STAGE, era, num_cells);

    let handle = root.open_group(STAGE)?;

    let params = validate_parameters(handle, era)
        .context_with(|| format!("failed to retrieve parameters from '{}'", STAGE))?;

    let num_pcs = validate_results(handle, &params, num_cells, era)
        .context_with(|| format!("failed to retrieve results from '{}'", STAGE))?;
    debug!("'{}' passed: {} PCs", STAGE, num_pcs);

    Ok(PcaSummary {
        num_pcs,
        block_method: params.block_method,
    })
}

/// Check `pca/parameters`.
pub fn validate_parameters(handle: &Group, era: SchemaEra) -> ValidationResult<PcaParameters> {
    let phandle = handle.open_group("parameters")?;

    let num_hvgs = positive(phandle.load_integer_scalar("num_hvgs")?)
        .ok_or_else(|| ValidationError::invalid("number of HVGs must be positive in 'num_hvgs'"))?;

    let num_pcs = positive(phandle.load_integer_scalar("num_pcs")?)
        .ok_or_else(|| ValidationError::invalid("number of PCs must be positive in 'num_pcs'"))?;

    let block_method = if era.has_block_method() {
        let method = phandle.load_string("block_method")?;
        Some(BlockMethod::parse(&method, era)?)
    } else {
        None
    };

    Ok(PcaParameters {
        num_hvgs,
        num_pcs,
        block_method,
    })
}

/// Check `pca/results`, returning the number of stored PCs.
pub fn validate_results(
    handle: &Group,
    params: &PcaParameters,
    num_cells: usize,
    era: SchemaEra,
) -> ValidationResult<usize> {
    let rhandle = handle.open_group("results")?;

    let observed = check_pca_contents(rhandle, params.num_pcs, num_cells)?;

    let mnn_era = era == SchemaEra::V1_1 || era == SchemaEra::V1_2;
    if mnn_era && params.block_method == Some(BlockMethod::Mnn) {
        rhandle.open_dataset("corrected", DataType::Float, Some(&[num_cells, observed]))?;
    }

    Ok(observed)
}

/// Check `var_exp` and `pcs` in a results group holding a PCA, returning
/// the number of stored PCs.
pub fn check_pca_contents(rhandle: &Group, max_pcs: usize, num_cells: usize) -> ValidationResult<usize> {
    let var_exp = rhandle.open_dataset("var_exp", DataType::Float, None)?;
    if var_exp.ndims() != 1 {
        return Err(Violation::Dimensionality {
            name: "var_exp".to_string(),
            expected: 1,
            found: var_exp.ndims(),
        }
        .into());
    }

    let observed = var_exp.shape()[0];
    if observed > max_pcs {
        return Err(ValidationError::invalid(
            "length of 'var_exp' dataset exceeds the requested number of PCs",
        ));
    }

    rhandle.open_dataset("pcs", DataType::Float, Some(&[num_cells, observed]))?;
    Ok(observed)
}

fn positive(value: i64) -> Option<usize> {
    usize::try_from(value).ok().filter(|&v| v > 0)
}
