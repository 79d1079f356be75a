use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Dynamic value of a single formatoption.
///
/// Equality is total (floats compare through [`OrderedFloat`]) so the update
/// scheduler can reliably detect no-op assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    List(Vec<OptionValue>),
}

impl OptionValue {
    #[must_use]
    pub fn float(value: f64) -> Self {
        Self::Float(OrderedFloat(value))
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric accessor; integers widen to `f64`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(value.into_inner()),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[OptionValue]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value:?}"),
            Self::List(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<OptionValue>> for OptionValue {
    fn from(values: Vec<OptionValue>) -> Self {
        Self::List(values)
    }
}

/// Kind tag of an [`OptionValue`], used in validator descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    List,
}

impl ValueKind {
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "a boolean",
            Self::Int => "an integer",
            Self::Float => "a number",
            Self::Text => "a string",
            Self::List => "a list",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Declarative per-formatoption validator.
///
/// Validators run before a value enters the update scheduler; a failing check
/// surfaces as `PlotError::InvalidValue` carrying [`Validator::describe`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Validator {
    /// Accepts any value.
    Any,
    /// Accepts values of exactly this kind. `Float` also accepts integers.
    Kind(ValueKind),
    /// Accepts integers within the inclusive range.
    IntRange { min: i64, max: i64 },
    /// Accepts numbers within the inclusive range.
    FloatRange { min: f64, max: f64 },
    /// Accepts exactly one of the listed values.
    OneOf(Vec<OptionValue>),
    /// Accepts exactly one of the listed strings.
    TextOneOf(Vec<String>),
    /// Accepts lists whose elements all have the given kind.
    ListOf(ValueKind),
}

impl Validator {
    /// Human-readable expectation used in validation error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any value".to_owned(),
            Self::Kind(kind) => kind.describe().to_owned(),
            Self::IntRange { min, max } => format!("an integer in {min}..={max}"),
            Self::FloatRange { min, max } => format!("a number in {min}..={max}"),
            Self::OneOf(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                format!("one of {}", rendered.join(", "))
            }
            Self::TextOneOf(names) => format!("one of {}", names.join(", ")),
            Self::ListOf(kind) => format!("a list of {} values", kind.describe()),
        }
    }

    /// Coerces a value into the shape this validator compares against.
    ///
    /// Integers widen to floats for float-typed validators so that `5` and
    /// `5.0` count as the same assignment during change detection.
    #[must_use]
    pub fn normalize(&self, value: &OptionValue) -> OptionValue {
        let widen = matches!(
            self,
            Self::Kind(ValueKind::Float) | Self::FloatRange { .. } | Self::ListOf(ValueKind::Float)
        );
        if !widen {
            return value.clone();
        }
        match value {
            OptionValue::Int(int) => OptionValue::float(*int as f64),
            OptionValue::List(values) => OptionValue::List(
                values
                    .iter()
                    .map(|item| match item {
                        OptionValue::Int(int) => OptionValue::float(*int as f64),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Checks a (normalized) value, returning `Ok(())` or the expectation text.
    pub fn check(&self, value: &OptionValue) -> Result<(), String> {
        let ok = match self {
            Self::Any => true,
            Self::Kind(kind) => value.kind() == *kind,
            Self::IntRange { min, max } => {
                value.as_int().is_some_and(|int| int >= *min && int <= *max)
            }
            Self::FloatRange { min, max } => value
                .as_float()
                .is_some_and(|float| float >= *min && float <= *max),
            Self::OneOf(values) => values.contains(value),
            Self::TextOneOf(names) => value
                .as_text()
                .is_some_and(|text| names.iter().any(|name| name == text)),
            Self::ListOf(kind) => value
                .as_list()
                .is_some_and(|items| items.iter().all(|item| item.kind() == *kind)),
        };
        if ok { Ok(()) } else { Err(self.describe()) }
    }
}
