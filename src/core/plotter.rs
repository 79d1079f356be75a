use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::core::scheduler::{self, RenderAction, UpdateReport};
use crate::core::{DataSelection, OptionValue, PlotData, PlotterSchema};
use crate::error::{PlotError, PlotResult};
use crate::render::{PlotBackend, PlotterSnapshot};

/// One plotter: the per-data-array instance of a visualization type.
///
/// Holds the shared schema, the attached data, the current formatoption
/// values, and the backend receiving replot/relabel callbacks. Updates run
/// synchronously to completion; there is no locking and no concurrency.
#[derive(Debug)]
pub struct Plotter<B: PlotBackend> {
    schema: Arc<PlotterSchema>,
    data: PlotData,
    selection: DataSelection,
    values: IndexMap<String, OptionValue>,
    backend: B,
    auto_update: bool,
    registered: IndexMap<String, OptionValue>,
    dirty: bool,
}

impl<B: PlotBackend> Plotter<B> {
    pub fn new(
        schema: Arc<PlotterSchema>,
        data: impl Into<PlotData>,
        backend: B,
    ) -> PlotResult<Self> {
        let data = data.into();
        let selection = DataSelection::none_for(&data);
        Self::with_selection(schema, data, selection, backend)
    }

    pub fn with_selection(
        schema: Arc<PlotterSchema>,
        data: impl Into<PlotData>,
        selection: DataSelection,
        backend: B,
    ) -> PlotResult<Self> {
        let data = data.into();
        selection.validate_against(&data)?;
        let values = schema.default_values();
        Ok(Self {
            schema,
            data,
            selection,
            values,
            backend,
            auto_update: true,
            registered: IndexMap::new(),
            dirty: true,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<PlotterSchema> {
        &self.schema
    }

    #[must_use]
    pub const fn data(&self) -> &PlotData {
        &self.data
    }

    #[must_use]
    pub const fn selection(&self) -> &DataSelection {
        &self.selection
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// True when the visual must be fully replotted before it is current.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub const fn auto_update(&self) -> bool {
        self.auto_update
    }

    /// Toggles deferred-update mode. With auto-update off, `update` batches
    /// are registered and coalesced until `start_update` flushes them.
    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.auto_update = auto_update;
    }

    #[must_use]
    pub fn has_registered_updates(&self) -> bool {
        !self.registered.is_empty()
    }

    /// Current value of one formatoption.
    pub fn value(&self, key: &str) -> PlotResult<&OptionValue> {
        self.values
            .get(key)
            .ok_or_else(|| PlotError::UnknownOption {
                key: key.to_owned(),
            })
    }

    /// All current values in schema declaration order.
    #[must_use]
    pub const fn values(&self) -> &IndexMap<String, OptionValue> {
        &self.values
    }

    /// Runs the initial plot through the backend and clears the dirty flag.
    pub fn initialize(&mut self) -> PlotResult<()> {
        let keys: Vec<String> = self.schema.keys().map(str::to_owned).collect();
        self.fire(RenderAction::Replot, &keys)?;
        Ok(())
    }

    /// Applies an update batch, or registers it when auto-update is off.
    ///
    /// Returns `None` when the batch was registered for a later
    /// `start_update` call. Unknown keys and invalid values fail before any
    /// value is mutated.
    pub fn update(
        &mut self,
        batch: IndexMap<String, OptionValue>,
    ) -> PlotResult<Option<UpdateReport>> {
        if !self.auto_update {
            debug!(count = batch.len(), "registering deferred update");
            self.registered.extend(batch);
            return Ok(None);
        }
        self.run_update(batch, &[]).map(Some)
    }

    /// Flushes updates registered while auto-update was off.
    ///
    /// Returns `None` when nothing was registered.
    pub fn start_update(&mut self) -> PlotResult<Option<UpdateReport>> {
        if self.registered.is_empty() {
            return Ok(None);
        }
        let batch = std::mem::take(&mut self.registered);
        self.run_update(batch, &[]).map(Some)
    }

    /// Resets the given formatoptions to their schema defaults.
    pub fn update_to_default(&mut self, keys: &[&str]) -> PlotResult<UpdateReport> {
        let mut batch = IndexMap::with_capacity(keys.len());
        for &key in keys {
            let spec = self
                .schema
                .spec(key)
                .ok_or_else(|| PlotError::UnknownOption {
                    key: key.to_owned(),
                })?;
            batch.insert(key.to_owned(), spec.default_value().clone());
        }
        self.run_update(batch, &[])
    }

    /// Resets every formatoption to its schema default.
    pub fn reset_all(&mut self) -> PlotResult<UpdateReport> {
        let batch = self.schema.default_values();
        self.run_update(batch, &[])
    }

    /// Re-applies the given formatoptions with their current values.
    pub fn force_update(&mut self, keys: &[&str]) -> PlotResult<UpdateReport> {
        let force: Vec<String> = keys.iter().map(|&key| key.to_owned()).collect();
        self.run_update(IndexMap::new(), &force)
    }

    fn run_update(
        &mut self,
        batch: IndexMap<String, OptionValue>,
        force: &[String],
    ) -> PlotResult<UpdateReport> {
        let plan = scheduler::plan_update(&self.schema, &self.values, &batch, force)?;
        if plan.is_empty() {
            return Ok(UpdateReport::no_op());
        }

        let mut applied = Vec::with_capacity(plan.steps.len());
        for step in plan.steps {
            self.values.insert(step.key.clone(), step.value);
            applied.push(step.key);
        }
        self.fire(plan.action, &applied)?;
        Ok(UpdateReport {
            applied,
            action: plan.action,
        })
    }

    /// Fires the backend callback for `action` and maintains the dirty flag.
    fn fire(&mut self, action: RenderAction, applied: &[String]) -> PlotResult<()> {
        if matches!(action, RenderAction::Replot) {
            self.dirty = true;
        }
        let Self {
            backend,
            values,
            data,
            selection,
            ..
        } = self;
        let snapshot = PlotterSnapshot {
            values,
            data,
            selection,
            applied,
        };
        match action {
            RenderAction::None => Ok(()),
            RenderAction::RefreshLabels => backend.refresh_labels(&snapshot),
            RenderAction::Replot => {
                backend.replot(&snapshot)?;
                self.dirty = false;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;

    use super::Plotter;
    use crate::core::scheduler::RenderAction;
    use crate::core::{DataArray, OptionSpec, OptionValue, PlotterSchema, UpdateStage};
    use crate::render::NullBackend;

    fn schema() -> Arc<PlotterSchema> {
        Arc::new(
            PlotterSchema::builder()
                .option(OptionSpec::new("cmap", UpdateStage::Plotting, "viridis"))
                .option(OptionSpec::new("title", UpdateStage::Labeling, ""))
                .build()
                .expect("schema"),
        )
    }

    fn plotter() -> Plotter<NullBackend> {
        let mut plotter =
            Plotter::new(schema(), DataArray::new("t2m"), NullBackend::default()).expect("plotter");
        plotter.initialize().expect("initialize");
        plotter
    }

    #[test]
    fn initialize_replots_and_clears_dirty() {
        let plotter = plotter();
        assert!(!plotter.is_dirty());
        assert_eq!(plotter.backend().replots, 1);
    }

    #[test]
    fn deferred_batches_coalesce_per_key() {
        let mut plotter = plotter();
        plotter.set_auto_update(false);

        let mut first = IndexMap::new();
        first.insert("cmap".to_owned(), OptionValue::from("plasma"));
        let mut second = IndexMap::new();
        second.insert("cmap".to_owned(), OptionValue::from("cividis"));

        assert!(plotter.update(first).expect("register").is_none());
        assert!(plotter.update(second).expect("register").is_none());
        assert!(plotter.has_registered_updates());

        let report = plotter
            .start_update()
            .expect("start update")
            .expect("report");
        assert_eq!(report.applied, vec!["cmap"]);
        assert_eq!(plotter.value("cmap").expect("cmap"), &"cividis".into());
        // one replot for the whole flushed batch
        assert_eq!(plotter.backend().replots, 2);
    }

    #[test]
    fn update_to_default_restores_schema_defaults() {
        let mut plotter = plotter();
        let mut batch = IndexMap::new();
        batch.insert("title".to_owned(), OptionValue::from("2m temperature"));
        plotter.update(batch).expect("update");

        let report = plotter.update_to_default(&["title"]).expect("reset");
        assert_eq!(report.action, RenderAction::RefreshLabels);
        assert_eq!(plotter.value("title").expect("title"), &"".into());
    }
}
