use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PlotError, PlotResult};

/// Thin handle to one labeled data array.
///
/// Decoding datasets is the host's job; the engine only tracks the name, the
/// dimension layout, the source file the array came from, and (optionally)
/// flat values for in-memory arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataArray {
    name: String,
    #[serde(default)]
    dims: IndexMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<f64>,
}

impl DataArray {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            dims: IndexMap::new(),
            source: None,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_dim(mut self, name: &str, len: usize) -> Self {
        self.dims.insert(name.to_owned(), len);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn dims(&self) -> &IndexMap<String, usize> {
        &self.dims
    }

    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn set_source(&mut self, source: impl Into<PathBuf>) {
        self.source = Some(source.into());
    }

    /// Copy of this array without values, suitable for project persistence.
    #[must_use]
    pub fn handle(&self) -> Self {
        Self {
            name: self.name.clone(),
            dims: self.dims.clone(),
            source: self.source.clone(),
            values: Vec::new(),
        }
    }
}

/// Explicit per-dimension index selection on one array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimSelection {
    indices: IndexMap<String, usize>,
}

impl DimSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn select(mut self, dim: &str, index: usize) -> Self {
        self.indices.insert(dim.to_owned(), index);
        self
    }

    #[must_use]
    pub const fn indices(&self) -> &IndexMap<String, usize> {
        &self.indices
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Checks every selected dimension exists in `array` and every index is
    /// in bounds.
    pub fn validate_against(&self, array: &DataArray) -> PlotResult<()> {
        for (dim, &index) in &self.indices {
            let len = *array
                .dims()
                .get(dim)
                .ok_or_else(|| PlotError::UnknownDimension {
                    array: array.name().to_owned(),
                    dim: dim.clone(),
                })?;
            if index >= len {
                return Err(PlotError::SelectionOutOfBounds {
                    array: array.name().to_owned(),
                    dim: dim.clone(),
                    index,
                    len,
                });
            }
        }
        Ok(())
    }
}

/// Data attached to one plotter: a single array or an ordered list of arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotData {
    Array { array: DataArray },
    List { arrays: Vec<DataArray> },
}

impl PlotData {
    #[must_use]
    pub const fn arity(&self) -> &'static str {
        match self {
            Self::Array { .. } => "a single array",
            Self::List { .. } => "a list of arrays",
        }
    }

    pub fn arrays(&self) -> impl Iterator<Item = &DataArray> {
        match self {
            Self::Array { array } => std::slice::from_ref(array).iter(),
            Self::List { arrays } => arrays.iter(),
        }
    }

    pub fn arrays_mut(&mut self) -> impl Iterator<Item = &mut DataArray> {
        match self {
            Self::Array { array } => std::slice::from_mut(array).iter_mut(),
            Self::List { arrays } => arrays.iter_mut(),
        }
    }

    /// Copy of this attachment without values, for project persistence.
    #[must_use]
    pub fn handle(&self) -> Self {
        match self {
            Self::Array { array } => Self::Array {
                array: array.handle(),
            },
            Self::List { arrays } => Self::List {
                arrays: arrays.iter().map(DataArray::handle).collect(),
            },
        }
    }
}

impl From<DataArray> for PlotData {
    fn from(array: DataArray) -> Self {
        Self::Array { array }
    }
}

impl From<Vec<DataArray>> for PlotData {
    fn from(arrays: Vec<DataArray>) -> Self {
        Self::List { arrays }
    }
}

/// Dimension selection matching the shape of [`PlotData`].
///
/// Multi-variable plot methods take exactly one [`DimSelection`] per array;
/// a flat selection is never implicitly broadcast over a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSelection {
    Array { selection: DimSelection },
    List { selections: Vec<DimSelection> },
}

impl DataSelection {
    #[must_use]
    pub fn none_for(data: &PlotData) -> Self {
        match data {
            PlotData::Array { .. } => Self::Array {
                selection: DimSelection::new(),
            },
            PlotData::List { arrays } => Self::List {
                selections: vec![DimSelection::new(); arrays.len()],
            },
        }
    }

    /// Validates shape compatibility and every per-array selection.
    pub fn validate_against(&self, data: &PlotData) -> PlotResult<()> {
        match (self, data) {
            (Self::Array { selection }, PlotData::Array { array }) => {
                selection.validate_against(array)
            }
            (Self::List { selections }, PlotData::List { arrays }) => {
                if selections.len() != arrays.len() {
                    return Err(PlotError::DataArityMismatch {
                        method: "selection".to_owned(),
                        expected: "one selection per array",
                        got: "a mismatched selection list",
                    });
                }
                for (selection, array) in selections.iter().zip(arrays) {
                    selection.validate_against(array)?;
                }
                Ok(())
            }
            (Self::Array { .. }, PlotData::List { .. }) => Err(PlotError::DataArityMismatch {
                method: "selection".to_owned(),
                expected: "one selection per array",
                got: "a single selection",
            }),
            (Self::List { .. }, PlotData::Array { .. }) => Err(PlotError::DataArityMismatch {
                method: "selection".to_owned(),
                expected: "a single selection",
                got: "a selection list",
            }),
        }
    }
}
