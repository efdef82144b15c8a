//! Running name → value mapping threaded across the steps of one solve.

use std::collections::BTreeMap;
use std::fmt::Write;

/// Placeholder values recorded by assignment snippets.
///
/// Created empty per solve and discarded with the response. Iteration order is
/// lexicographic by name so debug output stays stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableMap {
    values: BTreeMap<String, f64>,
}

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or overwrite a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Plain textual rendering of a stored value, if present.
    pub fn formatted(&self, name: &str) -> Option<String> {
        self.get(name).map(format_number)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Format a number the way it should read in a step description.
///
/// Integral values drop the fractional part, `-0` reads as `0`, everything
/// else uses the shortest decimal that round-trips.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let mut out = String::new();
    // f64 Display never uses exponent notation and omits `.0` for integers.
    let _ = write!(out, "{}", value);
    out
}
