pub mod data;
pub mod plotter;
pub mod scheduler;
pub mod schema;
pub mod stage;
pub mod value;

pub use data::{DataArray, DataSelection, DimSelection, PlotData};
pub use plotter::Plotter;
pub use scheduler::{RenderAction, UpdatePlan, UpdateReport, UpdateStep};
pub use schema::{OptionSpec, PlotterSchema, SchemaBuilder};
pub use stage::UpdateStage;
pub use value::{OptionValue, Validator, ValueKind};
