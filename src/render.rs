use indexmap::IndexMap;

use crate::core::{DataSelection, OptionValue, PlotData};
use crate::error::PlotResult;

/// Read-only view of a plotter handed to backend callbacks.
#[derive(Debug, Clone, Copy)]
pub struct PlotterSnapshot<'a> {
    /// Current formatoption values in schema declaration order.
    pub values: &'a IndexMap<String, OptionValue>,
    /// Data attached to the plotter.
    pub data: &'a PlotData,
    /// Dimension selection active on the data.
    pub selection: &'a DataSelection,
    /// Keys applied by the update that triggered this callback, in order.
    pub applied: &'a [String],
}

/// Contract implemented by any rendering backend.
///
/// The engine decides *when* to replot or refresh labels; backends decide
/// *how*. Callbacks run synchronously and their errors surface to the caller
/// of the update.
pub trait PlotBackend {
    /// Fully redraws the visual from the snapshot.
    fn replot(&mut self, snapshot: &PlotterSnapshot<'_>) -> PlotResult<()>;

    /// Refreshes titles, axis labels and similar text without redrawing.
    fn refresh_labels(&mut self, snapshot: &PlotterSnapshot<'_>) -> PlotResult<()>;
}

/// No-op backend used by tests and headless usage. Counts invocations so
/// tests can assert how often each callback fired.
#[derive(Debug, Default)]
pub struct NullBackend {
    pub replots: usize,
    pub label_refreshes: usize,
}

impl PlotBackend for NullBackend {
    fn replot(&mut self, _snapshot: &PlotterSnapshot<'_>) -> PlotResult<()> {
        self.replots += 1;
        Ok(())
    }

    fn refresh_labels(&mut self, _snapshot: &PlotterSnapshot<'_>) -> PlotResult<()> {
        self.label_refreshes += 1;
        Ok(())
    }
}

/// Backend recording every callback with the applied keys, for order-sensitive
/// assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Replot { applied: Vec<String> },
    RefreshLabels { applied: Vec<String> },
}

impl PlotBackend for RecordingBackend {
    fn replot(&mut self, snapshot: &PlotterSnapshot<'_>) -> PlotResult<()> {
        self.calls.push(BackendCall::Replot {
            applied: snapshot.applied.to_vec(),
        });
        Ok(())
    }

    fn refresh_labels(&mut self, snapshot: &PlotterSnapshot<'_>) -> PlotResult<()> {
        self.calls.push(BackendCall::RefreshLabels {
            applied: snapshot.applied.to_vec(),
        });
        Ok(())
    }
}
