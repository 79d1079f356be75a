//! Plot-method registry and plugin loading.
//!
//! Plot methods are named visualization types, each carrying the schema its
//! plotters are instantiated from. Plugins contribute plot methods in bulk
//! and can be filtered through environment variables without touching code.

use std::env;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::core::{DataSelection, PlotData, Plotter, PlotterSchema};
use crate::error::{PlotError, PlotResult};
use crate::render::PlotBackend;

/// Environment variable filtering plugins by name.
pub const PLUGINS_ENV_KEY: &str = "PLOTOPT_PLUGINS";
/// Environment variable filtering plot methods by name.
pub const PLOT_METHODS_ENV_KEY: &str = "PLOTOPT_PLOTMETHODS";

/// Expected data shape of a plot method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataArity {
    /// Exactly one data array.
    Single,
    /// An ordered list of data arrays.
    List,
}

impl DataArity {
    const fn describe(self) -> &'static str {
        match self {
            Self::Single => "a single array",
            Self::List => "a list of arrays",
        }
    }

    fn matches(self, data: &PlotData) -> bool {
        matches!(
            (self, data),
            (Self::Single, PlotData::Array { .. }) | (Self::List, PlotData::List { .. })
        )
    }
}

/// One named visualization type.
#[derive(Debug, Clone)]
pub struct PlotMethod {
    name: String,
    description: String,
    schema: Arc<PlotterSchema>,
    arity: DataArity,
}

impl PlotMethod {
    #[must_use]
    pub fn new(name: &str, schema: Arc<PlotterSchema>, arity: DataArity) -> Self {
        Self {
            name: name.to_owned(),
            description: String::new(),
            schema,
            arity,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<PlotterSchema> {
        &self.schema
    }

    #[must_use]
    pub const fn arity(&self) -> DataArity {
        self.arity
    }
}

/// Plugins contribute plot methods to a registry.
pub trait PlotPlugin {
    fn name(&self) -> &str;
    fn plot_methods(&self) -> Vec<PlotMethod>;
}

/// Include/exclude name filter parsed from a `yes:`/`no:` environment list.
///
/// The wire format is `::`-separated entries, each prefixed with `yes:` or
/// `no:`. A non-empty include list turns the filter into an allow-list;
/// excludes always win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl SelectionFilter {
    /// Filter that allows everything.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut filter = Self::default();
        for entry in raw.split("::").filter(|entry| !entry.is_empty()) {
            if let Some(name) = entry.strip_prefix("yes:") {
                filter.include.push(name.to_owned());
            } else if let Some(name) = entry.strip_prefix("no:") {
                filter.exclude.push(name.to_owned());
            } else {
                warn!(entry, "ignoring filter entry without yes:/no: prefix");
            }
        }
        filter
    }

    /// Parses the filter from an environment variable; unset means allow all.
    #[must_use]
    pub fn from_env(key: &str) -> Self {
        match env::var(key) {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Self::default(),
        }
    }

    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        if self.exclude.iter().any(|excluded| excluded == name) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|included| included == name)
    }
}

/// Ordered registry of plot methods, with env-driven filtering.
#[derive(Debug, Default)]
pub struct PlotMethodRegistry {
    methods: IndexMap<String, PlotMethod>,
    plugin_filter: SelectionFilter,
    method_filter: SelectionFilter,
}

impl PlotMethodRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose filters are read from `PLOTOPT_PLUGINS` and
    /// `PLOTOPT_PLOTMETHODS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            methods: IndexMap::new(),
            plugin_filter: SelectionFilter::from_env(PLUGINS_ENV_KEY),
            method_filter: SelectionFilter::from_env(PLOT_METHODS_ENV_KEY),
        }
    }

    #[must_use]
    pub fn with_filters(plugin_filter: SelectionFilter, method_filter: SelectionFilter) -> Self {
        Self {
            methods: IndexMap::new(),
            plugin_filter,
            method_filter,
        }
    }

    /// Registers one plot method.
    ///
    /// Returns `Ok(false)` when the method is excluded by the method filter;
    /// duplicates are an error.
    pub fn register(&mut self, method: PlotMethod) -> PlotResult<bool> {
        if !self.method_filter.allows(method.name()) {
            debug!(name = method.name(), "plot method excluded by filter");
            return Ok(false);
        }
        if self.methods.contains_key(method.name()) {
            return Err(PlotError::DuplicatePlotMethod {
                name: method.name().to_owned(),
            });
        }
        self.methods.insert(method.name().to_owned(), method);
        Ok(true)
    }

    /// Registers every plot method of a plugin, honoring both filters.
    ///
    /// Returns the number of methods registered.
    pub fn load_plugin(&mut self, plugin: &dyn PlotPlugin) -> PlotResult<usize> {
        if !self.plugin_filter.allows(plugin.name()) {
            debug!(name = plugin.name(), "plugin excluded by filter");
            return Ok(0);
        }
        let mut registered = 0;
        for method in plugin.plot_methods() {
            if self.register(method)? {
                registered += 1;
            }
        }
        debug!(
            name = plugin.name(),
            registered, "loaded plot-method plugin"
        );
        Ok(registered)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PlotMethod> {
        self.methods.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Instantiates a plotter for `name` over `data`.
    pub fn create_plotter<B: PlotBackend>(
        &self,
        name: &str,
        data: impl Into<PlotData>,
        selection: DataSelection,
        backend: B,
    ) -> PlotResult<Plotter<B>> {
        let method = self.get(name).ok_or_else(|| PlotError::UnknownPlotMethod {
            name: name.to_owned(),
        })?;
        let data = data.into();
        if !method.arity().matches(&data) {
            return Err(PlotError::DataArityMismatch {
                method: name.to_owned(),
                expected: method.arity().describe(),
                got: data.arity(),
            });
        }
        Plotter::with_selection(Arc::clone(method.schema()), data, selection, backend)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{DataArity, PlotMethod, PlotMethodRegistry, PlotPlugin, SelectionFilter};
    use crate::core::{DataArray, DataSelection, OptionSpec, PlotData, PlotterSchema, UpdateStage};
    use crate::error::PlotError;
    use crate::render::NullBackend;

    fn line_schema() -> Arc<PlotterSchema> {
        Arc::new(
            PlotterSchema::builder()
                .option(OptionSpec::new("color", UpdateStage::Plotting, "k"))
                .build()
                .expect("schema"),
        )
    }

    struct DemoPlugin;

    impl PlotPlugin for DemoPlugin {
        fn name(&self) -> &str {
            "demo"
        }

        fn plot_methods(&self) -> Vec<PlotMethod> {
            vec![
                PlotMethod::new("lineplot", line_schema(), DataArity::Single),
                PlotMethod::new("combined", line_schema(), DataArity::List),
            ]
        }
    }

    #[test]
    fn filter_parses_yes_no_entries() {
        let filter = SelectionFilter::parse("yes:lineplot::no:combined");
        assert!(filter.allows("lineplot"));
        assert!(!filter.allows("combined"));
        // allow-list mode: anything unlisted is rejected
        assert!(!filter.allows("maps"));
    }

    #[test]
    fn exclude_only_filter_keeps_the_rest() {
        let filter = SelectionFilter::parse("no:combined");
        assert!(filter.allows("lineplot"));
        assert!(!filter.allows("combined"));
    }

    #[test]
    fn excluded_methods_are_skipped_not_errors() {
        let mut registry = PlotMethodRegistry::with_filters(
            SelectionFilter::allow_all(),
            SelectionFilter::parse("no:combined"),
        );
        let loaded = registry.load_plugin(&DemoPlugin).expect("load");
        assert_eq!(loaded, 1);
        assert!(registry.get("lineplot").is_some());
        assert!(registry.get("combined").is_none());
    }

    #[test]
    fn excluded_plugins_register_nothing() {
        let mut registry = PlotMethodRegistry::with_filters(
            SelectionFilter::parse("no:demo"),
            SelectionFilter::allow_all(),
        );
        assert_eq!(registry.load_plugin(&DemoPlugin).expect("load"), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let mut registry = PlotMethodRegistry::new();
        registry
            .register(PlotMethod::new("combined", line_schema(), DataArity::List))
            .expect("register");
        let data = DataArray::new("t2m");
        let plot_data = PlotData::from(data.clone());
        let selection = DataSelection::none_for(&plot_data);
        let err = registry
            .create_plotter("combined", data, selection, NullBackend::default())
            .unwrap_err();
        assert!(matches!(err, PlotError::DataArityMismatch { .. }));
    }
}
