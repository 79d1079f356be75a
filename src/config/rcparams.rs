use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use tracing::{debug, warn};

use crate::config::paths;
use crate::core::OptionValue;
use crate::error::PlotResult;

/// Ordered key-value settings store loaded at startup.
///
/// Keys are dotted paths (`project.auto_update`); nested TOML tables flatten
/// into them. Unknown keys are kept so plugins can ship their own defaults,
/// but they are logged once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct RcParams {
    values: IndexMap<String, OptionValue>,
}

impl Default for RcParams {
    fn default() -> Self {
        let mut values = IndexMap::new();
        values.insert("auto_draw".to_owned(), OptionValue::Bool(true));
        values.insert("auto_show".to_owned(), OptionValue::Bool(false));
        values.insert("project.auto_update".to_owned(), OptionValue::Bool(true));
        Self { values }
    }
}

impl RcParams {
    /// Defaults merged with the rc file found through
    /// [`paths::config_file`], when one exists.
    pub fn load_default() -> PlotResult<Self> {
        let mut params = Self::default();
        if let Some(path) = paths::config_file() {
            params.merge_file(&path)?;
        }
        Ok(params)
    }

    /// Defaults merged with one explicit rc file.
    pub fn load_file(path: &Path) -> PlotResult<Self> {
        let mut params = Self::default();
        params.merge_file(path)?;
        Ok(params)
    }

    /// Parses a TOML file and merges its settings over the current ones.
    pub fn merge_file(&mut self, path: &Path) -> PlotResult<()> {
        let raw = fs::read_to_string(path)?;
        let table: toml::Table = raw.parse()?;
        let mut incoming = IndexMap::new();
        flatten_table(&table, "", &mut incoming);
        for (key, value) in incoming {
            if !self.values.contains_key(&key) {
                warn!(key, "unknown rc setting (kept)");
            }
            self.values.insert(key, value);
        }
        debug!(path = %path.display(), "merged rc settings");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    /// Boolean setting, falling back to `default` when absent or mistyped.
    #[must_use]
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(OptionValue::as_bool).unwrap_or(default)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.values.insert(key.to_owned(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

fn flatten_table(table: &toml::Table, prefix: &str, out: &mut IndexMap<String, OptionValue>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten_table(nested, &full_key, out),
            other => {
                out.insert(full_key, toml_to_option(other));
            }
        }
    }
}

fn toml_to_option(value: &toml::Value) -> OptionValue {
    match value {
        toml::Value::String(text) => OptionValue::Text(text.clone()),
        toml::Value::Integer(int) => OptionValue::Int(*int),
        toml::Value::Float(float) => OptionValue::Float(OrderedFloat(*float)),
        toml::Value::Boolean(boolean) => OptionValue::Bool(*boolean),
        toml::Value::Datetime(datetime) => OptionValue::Text(datetime.to_string()),
        toml::Value::Array(items) => {
            OptionValue::List(items.iter().map(toml_to_option).collect())
        }
        toml::Value::Table(_) => OptionValue::Null,
    }
}
