//! Project: the ordered collection of open plotters.
//!
//! The project is the unit of deferred updates and persistence. With
//! auto-update off, update batches are registered on each plotter and applied
//! together by `start_update`, one replot per dirty plotter.

mod state;

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::core::{OptionValue, Plotter, UpdateReport};
use crate::error::{PlotError, PlotResult};
use crate::registry::PlotMethodRegistry;
use crate::render::PlotBackend;

pub use state::{PlotterState, ProjectState, STATE_FORMAT_VERSION};

/// One open visualization within a project.
#[derive(Debug)]
pub struct ProjectEntry<B: PlotBackend> {
    plot_method: String,
    plotter: Plotter<B>,
}

impl<B: PlotBackend> ProjectEntry<B> {
    #[must_use]
    pub fn plot_method(&self) -> &str {
        &self.plot_method
    }

    #[must_use]
    pub const fn plotter(&self) -> &Plotter<B> {
        &self.plotter
    }

    pub const fn plotter_mut(&mut self) -> &mut Plotter<B> {
        &mut self.plotter
    }
}

/// Ordered collection of plotters with a shared auto-update flag.
#[derive(Debug)]
pub struct Project<B: PlotBackend> {
    entries: Vec<ProjectEntry<B>>,
    auto_update: bool,
}

impl<B: PlotBackend> Project<B> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            auto_update: true,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn auto_update(&self) -> bool {
        self.auto_update
    }

    /// Toggles deferred-update mode for the whole collection.
    pub fn set_auto_update(&mut self, auto_update: bool) {
        self.auto_update = auto_update;
        for entry in &mut self.entries {
            entry.plotter.set_auto_update(auto_update);
        }
    }

    /// Adds a plotter created from `plot_method`. The plotter inherits the
    /// project's auto-update flag.
    pub fn attach(&mut self, plot_method: &str, mut plotter: Plotter<B>) -> usize {
        plotter.set_auto_update(self.auto_update);
        self.entries.push(ProjectEntry {
            plot_method: plot_method.to_owned(),
            plotter,
        });
        self.entries.len() - 1
    }

    /// Removes and returns the plotter at `index`, releasing its data
    /// reference. Out-of-range indices return `None`.
    pub fn close(&mut self, index: usize) -> Option<ProjectEntry<B>> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&ProjectEntry<B>> {
        self.entries.get(index)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut ProjectEntry<B>> {
        self.entries.get_mut(index)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProjectEntry<B>> {
        self.entries.iter()
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut ProjectEntry<B>> {
        self.entries.iter_mut()
    }

    /// Applies (or registers, with auto-update off) one batch on every
    /// plotter. Every plotter must know every key in the batch.
    pub fn update_all(
        &mut self,
        batch: &IndexMap<String, OptionValue>,
    ) -> PlotResult<Vec<Option<UpdateReport>>> {
        let mut reports = Vec::with_capacity(self.entries.len());
        for entry in &mut self.entries {
            reports.push(entry.plotter.update(batch.clone())?);
        }
        Ok(reports)
    }

    /// Flushes registered updates on every plotter.
    pub fn start_update(&mut self) -> PlotResult<Vec<Option<UpdateReport>>> {
        let mut reports = Vec::with_capacity(self.entries.len());
        for entry in &mut self.entries {
            reports.push(entry.plotter.start_update()?);
        }
        Ok(reports)
    }

    /// Snapshot of the project configuration for persistence.
    #[must_use]
    pub fn state(&self) -> ProjectState {
        let plotters = self
            .entries
            .iter()
            .map(|entry| PlotterState {
                plot_method: entry.plot_method.clone(),
                data: entry.plotter.data().handle(),
                selection: entry.plotter.selection().clone(),
                options: entry.plotter.values().clone(),
            })
            .collect();
        ProjectState::new(plotters)
    }

    /// Saves the project configuration as JSON.
    pub fn save(&self, path: &Path) -> PlotResult<()> {
        self.state().save_file(path)?;
        debug!(path = %path.display(), plotters = self.len(), "saved project");
        Ok(())
    }

    /// Restores a project from a saved state file.
    ///
    /// `alternative_paths` remaps stored source paths before they are checked
    /// on disk; a missing source fails with `MissingSourceFile` and the
    /// caller may retry with a remapping. Every restored plotter is replotted
    /// once through a backend produced by `make_backend`.
    pub fn load(
        path: &Path,
        registry: &PlotMethodRegistry,
        make_backend: impl FnMut() -> B,
        alternative_paths: &HashMap<std::path::PathBuf, std::path::PathBuf>,
    ) -> PlotResult<Self> {
        let state = ProjectState::load_file(path)?;
        Self::from_state(state, registry, make_backend, alternative_paths)
    }

    /// Restores a project from an in-memory state.
    pub fn from_state(
        state: ProjectState,
        registry: &PlotMethodRegistry,
        mut make_backend: impl FnMut() -> B,
        alternative_paths: &HashMap<std::path::PathBuf, std::path::PathBuf>,
    ) -> PlotResult<Self> {
        let mut project = Self::new();
        for mut plotter_state in state.plotters {
            plotter_state.resolve_sources(alternative_paths)?;
            let mut plotter = registry.create_plotter(
                &plotter_state.plot_method,
                plotter_state.data,
                plotter_state.selection,
                make_backend(),
            )?;
            let report = plotter
                .update(plotter_state.options)?
                .unwrap_or_else(UpdateReport::no_op);
            if plotter.is_dirty() {
                plotter.initialize()?;
            }
            debug!(
                plot_method = %plotter_state.plot_method,
                applied = report.applied.len(),
                "restored plotter"
            );
            project.attach(&plotter_state.plot_method, plotter);
        }
        Ok(project)
    }
}
