//! Typed datasets stored in a state container.
//!
//! A dataset is a flat buffer of integers, floats or strings plus a shape.
//! Scalars have an empty shape. The element type is a closed set, so it is
//! modelled as an enum and checked with exhaustive matches.

use crate::core::error::StateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a dataset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Float,
    String,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "integer"),
            DataType::Float => write!(f, "float"),
            DataType::String => write!(f, "string"),
        }
    }
}

/// Kind of a node in the container hierarchy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Dataset,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Group => write!(f, "group"),
            NodeKind::Dataset => write!(f, "dataset"),
        }
    }
}

/// Flat element buffer of a dataset, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    String(Vec<String>),
}

impl Values {
    /// Element type of this buffer.
    pub fn dtype(&self) -> DataType {
        match self {
            Values::Integer(_) => DataType::Integer,
            Values::Float(_) => DataType::Float,
            Values::String(_) => DataType::String,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Values::Integer(v) => v.len(),
            Values::Float(v) => v.len(),
            Values::String(v) => v.len(),
        }
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A typed, shaped dataset.
///
/// The element count always equals the product of the shape, which is
/// enforced on construction and on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset", into = "RawDataset")]
pub struct Dataset {
    shape: Vec<usize>,
    values: Values,
}

impl Dataset {
    /// Create a dataset, checking that the buffer fills the shape.
    pub fn new(shape: Vec<usize>, values: Values) -> Result<Self, StateError> {
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| {
                StateError::MalformedDataset(format!("shape {:?} has too many elements", shape))
            })?;
        if expected != values.len() {
            return Err(StateError::MalformedDataset(format!(
                "shape {:?} holds {} elements but {} were supplied",
                shape,
                expected,
                values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    /// Integer scalar.
    pub fn integer_scalar(value: i64) -> Self {
        Self {
            shape: Vec::new(),
            values: Values::Integer(vec![value]),
        }
    }

    /// 1-dimensional integer dataset.
    pub fn integers(values: impl Into<Vec<i64>>) -> Self {
        let values = values.into();
        Self {
            shape: vec![values.len()],
            values: Values::Integer(values),
        }
    }

    /// Float scalar.
    pub fn float_scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            values: Values::Float(vec![value]),
        }
    }

    /// 1-dimensional float dataset.
    pub fn floats(values: impl Into<Vec<f64>>) -> Self {
        let values = values.into();
        Self {
            shape: vec![values.len()],
            values: Values::Float(values),
        }
    }

    /// Zero-filled float matrix of `rows` by `columns`.
    pub fn float_matrix(rows: usize, columns: usize) -> Self {
        Self {
            shape: vec![rows, columns],
            values: Values::Float(vec![0.0; rows * columns]),
        }
    }

    /// String scalar.
    pub fn string_scalar(value: impl Into<String>) -> Self {
        Self {
            shape: Vec::new(),
            values: Values::String(vec![value.into()]),
        }
    }

    /// 1-dimensional string dataset.
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        Self {
            shape: vec![values.len()],
            values: Values::String(values),
        }
    }

    pub fn dtype(&self) -> DataType {
        self.values.dtype()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions; zero for scalars.
    pub fn ndims(&self) -> usize {
        self.shape.len()
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn as_integers(&self) -> Option<&[i64]> {
        match &self.values {
            Values::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match &self.values {
            Values::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match &self.values {
            Values::String(v) => Some(v),
            _ => None,
        }
    }
}

/// On-disk form of a dataset: the element type travels as a tag and the
/// buffer as plain JSON values.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDataset {
    dtype: DataType,
    #[serde(default)]
    shape: Vec<usize>,
    data: Vec<serde_json::Value>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = StateError;

    fn try_from(raw: RawDataset) -> Result<Self, Self::Error> {
        let bad = |index: usize| {
            StateError::MalformedDataset(format!(
                "element {} is not a valid {} value",
                index, raw.dtype
            ))
        };

        let values = match raw.dtype {
            DataType::Integer => Values::Integer(
                raw.data
                    .iter()
                    .enumerate()
                    .map(|(i, v)| v.as_i64().ok_or_else(|| bad(i)))
                    .collect::<Result<_, _>>()?,
            ),
            // Non-finite floats are written as null.
            DataType::Float => Values::Float(
                raw.data
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        v.as_f64()
                            .or_else(|| v.is_null().then_some(f64::NAN))
                            .ok_or_else(|| bad(i))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            DataType::String => Values::String(
                raw.data
                    .iter()
                    .enumerate()
                    .map(|(i, v)| v.as_str().map(str::to_string).ok_or_else(|| bad(i)))
                    .collect::<Result<_, _>>()?,
            ),
        };

        Dataset::new(raw.shape, values)
    }
}

impl From<Dataset> for RawDataset {
    fn from(dataset: Dataset) -> Self {
        let dtype = dataset.dtype();
        let data = match dataset.values {
            Values::Integer(v) => v.into_iter().map(serde_json::Value::from).collect(),
            Values::Float(v) => v.into_iter().map(serde_json::Value::from).collect(),
            Values::String(v) => v.into_iter().map(serde_json::Value::from).collect(),
        };
        Self {
            dtype,
            shape: dataset.shape,
            data,
        }
    }
}
