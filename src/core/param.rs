//! Parameter schemas and resolved parameter maps.
//!
//! Each filter declares the parameters it consumes. A declaration carries a
//! numeric kind, a default, and an optional clamp range; callers never see a
//! parameter error, values outside the schema are defaulted or clamped.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric kind of a parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Whole numbers. Real input is truncated toward zero.
    Integer,
    /// Floating point.
    Real,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Integer => write!(f, "Integer"),
            ParamKind::Real => write!(f, "Real"),
        }
    }
}

/// A coerced parameter value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    Integer(i64),
    Real(f64),
}

impl ParamValue {
    /// Value as a float. Integers are widened.
    pub fn as_real(&self) -> f64 {
        match self {
            ParamValue::Integer(i) => *i as f64,
            ParamValue::Real(r) => *r,
        }
    }

    /// Value as an integer. Reals are truncated toward zero.
    pub fn as_integer(&self) -> i64 {
        match self {
            ParamValue::Integer(i) => *i,
            ParamValue::Real(r) => r.trunc() as i64,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(i) => write!(f, "{}", i),
            ParamValue::Real(r) => write!(f, "{:.4}", r),
        }
    }
}

/// Declaration of one filter parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Name as submitted by callers (e.g. "blockSize").
    pub name: String,
    /// Numeric kind used for coercion.
    pub kind: ParamKind,
    /// Value used when the caller omits the parameter or sends garbage.
    pub default_value: ParamValue,
    /// Description for documentation.
    pub description: String,
    /// Inclusive clamp range.
    pub range: Option<(f64, f64)>,
    /// Integer values are bumped to the next odd number (kernel sizes).
    pub odd: bool,
}

impl ParameterDefinition {
    /// Declare an integer parameter.
    pub fn integer(name: impl Into<String>, default: i64) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Integer,
            default_value: ParamValue::Integer(default),
            description: String::new(),
            range: None,
            odd: false,
        }
    }

    /// Declare a real parameter.
    pub fn real(name: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Real,
            default_value: ParamValue::Real(default),
            description: String::new(),
            range: None,
            odd: false,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an inclusive clamp range.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// Force integer values to be odd.
    pub fn odd(mut self) -> Self {
        self.odd = true;
        self
    }

    /// Bring a value into this parameter's kind and range.
    pub fn clamp(&self, value: ParamValue) -> ParamValue {
        let mut real = value.as_real();
        if let Some((min, max)) = self.range {
            real = real.clamp(min, max);
        }
        match self.kind {
            ParamKind::Real => ParamValue::Real(real),
            ParamKind::Integer => {
                let mut int = real.trunc() as i64;
                if self.odd && int % 2 == 0 {
                    int += 1;
                    if let Some((_, max)) = self.range {
                        if int as f64 > max {
                            int -= 2;
                        }
                    }
                }
                ParamValue::Integer(int)
            }
        }
    }
}

/// Parameters resolved against a schema: every declared name has a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamMap {
    values: IndexMap<String, ParamValue>,
}

impl ParamMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map holding every declared default.
    pub fn defaults(schema: &[ParameterDefinition]) -> Self {
        let values = schema
            .iter()
            .map(|def| (def.name.clone(), def.default_value))
            .collect();
        Self { values }
    }

    /// Set a value.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Get a value by name.
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.values.get(name).copied()
    }

    /// Get a value as a float, or `fallback` when absent.
    pub fn real(&self, name: &str, fallback: f64) -> f64 {
        self.get(name).map(|v| v.as_real()).unwrap_or(fallback)
    }

    /// Get a value as an integer, or `fallback` when absent.
    pub fn integer(&self, name: &str, fallback: i64) -> i64 {
        self.get(name).map(|v| v.as_integer()).unwrap_or(fallback)
    }

    /// Iterate over entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
