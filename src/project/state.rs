use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{DataSelection, OptionValue, PlotData};
use crate::error::{PlotError, PlotResult};

/// Current project state format version.
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Persisted configuration of one plotter.
///
/// Captures option values and source-file references, never raw data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotterState {
    pub plot_method: String,
    /// Data handles with values stripped.
    pub data: PlotData,
    pub selection: DataSelection,
    /// All formatoption values in schema declaration order.
    pub options: IndexMap<String, OptionValue>,
}

impl PlotterState {
    /// Remaps every stored source path through `alternative_paths`, then
    /// checks the resulting paths exist on disk.
    ///
    /// Arrays without a source path are in-memory and skipped.
    pub fn resolve_sources(&mut self, alternative_paths: &HashMap<PathBuf, PathBuf>) -> PlotResult<()> {
        for array in self.data.arrays_mut() {
            let Some(source) = array.source().map(Path::to_path_buf) else {
                continue;
            };
            let resolved = alternative_paths.get(&source).cloned().unwrap_or(source);
            if !resolved.exists() {
                return Err(PlotError::MissingSourceFile { path: resolved });
            }
            array.set_source(resolved);
        }
        Ok(())
    }
}

/// Serialized form of a whole project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub format_version: u32,
    pub created: DateTime<Utc>,
    pub plotters: Vec<PlotterState>,
}

impl ProjectState {
    #[must_use]
    pub fn new(plotters: Vec<PlotterState>) -> Self {
        Self {
            format_version: STATE_FORMAT_VERSION,
            created: Utc::now(),
            plotters,
        }
    }

    pub fn to_json_pretty(&self) -> PlotResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(input: &str) -> PlotResult<Self> {
        let state: Self = serde_json::from_str(input)?;
        if state.format_version > STATE_FORMAT_VERSION {
            return Err(PlotError::UnsupportedStateVersion {
                found: state.format_version,
                supported: STATE_FORMAT_VERSION,
            });
        }
        Ok(state)
    }

    pub fn save_file(&self, path: &Path) -> PlotResult<()> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn load_file(path: &Path) -> PlotResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
