//! plotopt: declarative format-option engine for interactive plotting.
//!
//! Every visual or data-transformation property of a plot is a formatoption:
//! an independently updatable key-value unit with a fixed update stage,
//! dependency relations to other units, and a validator. Plotters own one
//! data array (or list of arrays) plus the formatoption values of one
//! visualization type; the update scheduler decides which units to apply, in
//! which order, and whether the backend must fully replot or only refresh
//! labels.

pub mod config;
pub mod core;
pub mod error;
pub mod project;
pub mod registry;
pub mod render;
pub mod telemetry;

pub use crate::core::{
    DataArray, DataSelection, DimSelection, OptionSpec, OptionValue, PlotData, Plotter,
    PlotterSchema, RenderAction, UpdateReport, UpdateStage, Validator, ValueKind,
};
pub use error::{PlotError, PlotResult};
pub use project::Project;
pub use registry::{PlotMethod, PlotMethodRegistry};
pub use render::{NullBackend, PlotBackend, PlotterSnapshot};
