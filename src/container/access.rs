//! Checked access to groups and datasets.
//!
//! Every reader fails with a [`Violation`] naming the child when it is
//! missing, of the wrong kind, of the wrong element type or of the wrong
//! shape. Readers borrow from the container; nothing here copies buffers
//! except the string readers.

use crate::container::group::{Group, Node};
use crate::core::error::{ValidationError, ValidationResult, Violation};
use crate::core::types::{DataType, Dataset, NodeKind};

/// A string field that may be stored as a scalar or as a 1-D dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringField {
    Scalar(String),
    Vector(Vec<String>),
}

impl Group {
    fn child(&self, name: &str) -> ValidationResult<&Node> {
        self.get(name).ok_or_else(|| {
            Violation::MissingChild {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Open a child group.
    pub fn open_group(&self, name: &str) -> ValidationResult<&Group> {
        self.child(name)?.as_group().ok_or_else(|| {
            Violation::WrongKind {
                name: name.to_string(),
                expected: NodeKind::Group,
            }
            .into()
        })
    }

    /// Open a child dataset of the given type, optionally with an exact shape.
    pub fn open_dataset(
        &self,
        name: &str,
        dtype: DataType,
        shape: Option<&[usize]>,
    ) -> ValidationResult<&Dataset> {
        let dataset = self.child(name)?.as_dataset().ok_or_else(|| {
            ValidationError::from(Violation::WrongKind {
                name: name.to_string(),
                expected: NodeKind::Dataset,
            })
        })?;

        if dataset.dtype() != dtype {
            return Err(Violation::TypeMismatch {
                name: name.to_string(),
                expected: dtype,
                found: dataset.dtype(),
            }
            .into());
        }

        if let Some(expected) = shape {
            if dataset.shape() != expected {
                return Err(Violation::ShapeMismatch {
                    name: name.to_string(),
                    expected: expected.to_vec(),
                    found: dataset.shape().to_vec(),
                }
                .into());
            }
        }

        Ok(dataset)
    }

    /// Open a scalar dataset of the given type.
    pub fn open_scalar(&self, name: &str, dtype: DataType) -> ValidationResult<&Dataset> {
        self.open_dataset(name, dtype, Some(&[]))
    }

    /// Open a 1-dimensional dataset of the given type and any length.
    pub fn open_vector(&self, name: &str, dtype: DataType) -> ValidationResult<&Dataset> {
        let dataset = self.open_dataset(name, dtype, None)?;
        if dataset.ndims() != 1 {
            return Err(Violation::Dimensionality {
                name: name.to_string(),
                expected: 1,
                found: dataset.ndims(),
            }
            .into());
        }
        Ok(dataset)
    }

    /// Read a scalar string.
    pub fn load_string(&self, name: &str) -> ValidationResult<String> {
        let dataset = self.open_scalar(name, DataType::String)?;
        Ok(first_string(dataset))
    }

    /// Read a scalar integer.
    pub fn load_integer_scalar(&self, name: &str) -> ValidationResult<i64> {
        let dataset = self.open_scalar(name, DataType::Integer)?;
        Ok(dataset.as_integers().and_then(|v| v.first().copied()).unwrap_or_default())
    }

    /// Read a scalar float.
    pub fn load_float_scalar(&self, name: &str) -> ValidationResult<f64> {
        let dataset = self.open_scalar(name, DataType::Float)?;
        Ok(dataset.as_floats().and_then(|v| v.first().copied()).unwrap_or_default())
    }

    /// Read a 1-dimensional integer dataset.
    pub fn load_integer_vector(&self, name: &str) -> ValidationResult<&[i64]> {
        let dataset = self.open_vector(name, DataType::Integer)?;
        Ok(dataset.as_integers().unwrap_or_default())
    }

    /// Read a 1-dimensional string dataset.
    pub fn load_string_vector(&self, name: &str) -> ValidationResult<Vec<String>> {
        let dataset = self.open_vector(name, DataType::String)?;
        Ok(dataset.as_strings().map(<[String]>::to_vec).unwrap_or_default())
    }

    /// Read a string field stored either as a scalar or as a 1-D dataset.
    pub fn load_string_or_strings(&self, name: &str) -> ValidationResult<StringField> {
        let dataset = self.open_dataset(name, DataType::String, None)?;
        match dataset.ndims() {
            0 => Ok(StringField::Scalar(first_string(dataset))),
            1 => Ok(StringField::Vector(
                dataset.as_strings().map(<[String]>::to_vec).unwrap_or_default(),
            )),
            found => Err(Violation::Dimensionality {
                name: name.to_string(),
                expected: 1,
                found,
            }
            .into()),
        }
    }
}

fn first_string(dataset: &Dataset) -> String {
    dataset
        .as_strings()
        .and_then(|v| v.first().cloned())
        .unwrap_or_default()
}
