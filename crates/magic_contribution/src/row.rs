//! A single contribution row.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Column name to value mapping for one row of a table.
///
/// Values are never empty: inserting an empty string is a no-op and empty
/// values are dropped when deserializing. Columns are kept sorted, so two rows
/// are equal exactly when they hold the same column/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: BTreeMap<String, String>,
}

/// Two rows disagree on a shared column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowConflict {
    pub column: String,
    pub left: String,
    pub right: String,
}

impl fmt::Display for RowConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "column \"{}\" holds \"{}\" and \"{}\"",
            self.column, self.left, self.right
        )
    }
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning false (and storing nothing) when it is empty.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() {
            return false;
        }
        self.values.insert(column.into(), value);
        true
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<String> {
        self.values.remove(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// First column present in both rows with different values, if any.
    pub fn conflict_with(&self, other: &Row) -> Option<RowConflict> {
        // Walk the smaller row; lookups go into the larger one.
        let (small, large, swapped) = if self.len() <= other.len() {
            (self, other, false)
        } else {
            (other, self, true)
        };

        small.values.iter().find_map(|(column, value)| {
            let theirs = large.values.get(column)?;
            if theirs == value {
                return None;
            }
            let (left, right) = if swapped {
                (theirs.clone(), value.clone())
            } else {
                (value.clone(), theirs.clone())
            };
            Some(RowConflict {
                column: column.clone(),
                left,
                right,
            })
        })
    }

    /// Rows are compatible when no shared column holds two different values.
    pub fn is_compatible(&self, other: &Row) -> bool {
        self.conflict_with(other).is_none()
    }

    /// Absorb the columns of `other`. On conflict nothing is changed.
    pub fn merge(&mut self, other: &Row) -> Result<(), RowConflict> {
        if let Some(conflict) = self.conflict_with(other) {
            return Err(conflict);
        }
        for (column, value) in &other.values {
            self.values
                .entry(column.clone())
                .or_insert_with(|| value.clone());
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Row {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = BTreeMap::<String, String>::deserialize(deserializer)?;
        Ok(values.into_iter().collect())
    }
}
