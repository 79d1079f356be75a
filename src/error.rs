use std::path::PathBuf;

use thiserror::Error;

use crate::core::UpdateStage;

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("unknown formatoption key: {key}")]
    UnknownOption { key: String },

    #[error("invalid value for formatoption {key}: expected {expected}, got {got}")]
    InvalidValue {
        key: String,
        expected: String,
        got: String,
    },

    #[error("duplicate formatoption key: {key}")]
    DuplicateOption { key: String },

    #[error("formatoption {key} references unknown key {referenced} in its {relation} list")]
    UnknownReference {
        key: String,
        referenced: String,
        relation: &'static str,
    },

    #[error("cyclic formatoption dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error(
        "formatoption {key} ({stage}) lists {child} ({child_stage}) as a child, \
         but {child_stage} runs after {stage}"
    )]
    StageConflict {
        key: String,
        stage: UpdateStage,
        child: String,
        child_stage: UpdateStage,
    },

    #[error("unknown plot method: {name}")]
    UnknownPlotMethod { name: String },

    #[error("plot method {name} is already registered")]
    DuplicatePlotMethod { name: String },

    #[error("plot method {method} expects {expected} data, got {got}")]
    DataArityMismatch {
        method: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("array {array} has no dimension named {dim}")]
    UnknownDimension { array: String, dim: String },

    #[error(
        "selected index {index} is out of bounds for dimension {dim} of array {array} (length {len})"
    )]
    SelectionOutOfBounds {
        array: String,
        dim: String,
        index: usize,
        len: usize,
    },

    #[error("source file not found: {}", .path.display())]
    MissingSourceFile { path: PathBuf },

    #[error("unsupported project state version {found} (supported: {supported})")]
    UnsupportedStateVersion { found: u32, supported: u32 },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid project state: {0}")]
    State(#[from] serde_json::Error),

    #[error("invalid configuration file: {0}")]
    Config(#[from] toml::de::Error),
}
