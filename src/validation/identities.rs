//! Feature identity checks.
//!
//! Every per-feature result in a state file is aligned with the rows of the
//! loaded dataset, and the inputs stage records where each of those rows
//! came from in the original matrix. The encoding changed three times:
//!
//! | era          | layout                                                |
//! |--------------|-------------------------------------------------------|
//! | 2.0          | `identities/<modality>`, injective                    |
//! | 1.2          | flat `identities`, injective                          |
//! | 1.1, multi   | flat `indices`, injective                             |
//! | 1.0, 1.1     | `permutation`, a full permutation of `0..n`           |

use crate::core::error::{ValidationError, ValidationResult};
use crate::core::version::SchemaEra;
use std::collections::HashSet;

/// Which feature identity encoding a state file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityLayout {
    /// One injective sequence per modality under an `identities` group.
    PerModality,
    /// A single injective `identities` sequence.
    Flat,
    /// A single injective `indices` sequence for multi-matrix inputs.
    Indices,
    /// A `permutation` of `0..n`.
    Permutation,
}

impl IdentityLayout {
    /// Pick the layout for an era.
    ///
    /// Multi-matrix inputs only exist from 1.1, so `Indices` is never chosen
    /// for 1.0 states.
    pub fn resolve(era: SchemaEra, multi_matrix: bool) -> Self {
        match era {
            SchemaEra::V2_0 => IdentityLayout::PerModality,
            SchemaEra::V1_2 => IdentityLayout::Flat,
            SchemaEra::V1_1 if multi_matrix => IdentityLayout::Indices,
            SchemaEra::V1_1 | SchemaEra::V1_0 => IdentityLayout::Permutation,
        }
    }

    /// Name of the dataset or group holding the identities.
    pub fn field(self) -> &'static str {
        match self {
            IdentityLayout::PerModality | IdentityLayout::Flat => "identities",
            IdentityLayout::Indices => "indices",
            IdentityLayout::Permutation => "permutation",
        }
    }
}

/// Check that `values` are non-negative and pairwise distinct.
///
/// `what` names the dataset in the error message.
pub fn check_unique(values: &[i64], what: &str) -> ValidationResult<()> {
    let mut used = HashSet::with_capacity(values.len());
    for &value in values {
        if value < 0 {
            return Err(ValidationError::invalid(format!("{} contains negative values", what)));
        }
        if !used.insert(value) {
            return Err(ValidationError::invalid(format!("{} contains duplicate values", what)));
        }
    }
    Ok(())
}

/// Check that `values` is a permutation of `0..values.len()`.
///
/// n distinct values drawn from n slots cover every slot, so a presence
/// bitmap is enough.
pub fn check_permutation(values: &[i64]) -> ValidationResult<()> {
    let n = values.len();
    let mut used = vec![false; n];
    for &value in values {
        let slot = usize::try_from(value)
            .ok()
            .filter(|&slot| slot < n)
            .ok_or_else(|| ValidationError::invalid("'permutation' contains out-of-range values"))?;
        if used[slot] {
            return Err(ValidationError::invalid("duplicated index in 'permutation'"));
        }
        used[slot] = true;
    }
    Ok(())
}
