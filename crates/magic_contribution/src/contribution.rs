//! The table -> rows structure of one dataset.

use crate::row::Row;
use indexmap::IndexMap;
use magic_protocol::{METADATA_TABLE, VERSION_COLUMN};
use serde::{Deserialize, Serialize};

/// A MagIC contribution: named tables, each an ordered sequence of rows.
///
/// Tables keep insertion order for display and serialization. Equality
/// ignores table order but not row order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contribution {
    tables: IndexMap<String, Vec<Row>>,
}

impl Contribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables (including empty ones).
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table(&self, table: &str) -> Option<&[Row]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn table_mut(&mut self, table: &str) -> Option<&mut Vec<Row>> {
        self.tables.get_mut(table)
    }

    /// Register a table, leaving existing rows alone.
    pub fn ensure_table(&mut self, table: &str) -> &mut Vec<Row> {
        self.tables.entry(table.to_string()).or_default()
    }

    pub fn push_row(&mut self, table: &str, row: Row) {
        self.ensure_table(table).push(row);
    }

    /// Replace a table's rows, keeping its position if it already exists.
    pub fn insert_table(&mut self, table: impl Into<String>, rows: Vec<Row>) -> Option<Vec<Row>> {
        self.tables.insert(table.into(), rows)
    }

    /// Remove a table; later tables keep their relative order.
    pub fn remove_table(&mut self, table: &str) -> Option<Vec<Row>> {
        self.tables.shift_remove(table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// The version tag of the metadata row, when there is exactly one
    /// metadata row and it carries a tag.
    pub fn version_tag(&self) -> Option<&str> {
        match self.table(METADATA_TABLE) {
            Some([row]) => row.get(VERSION_COLUMN),
            _ => None,
        }
    }
}

impl PartialEq for Contribution {
    fn eq(&self, other: &Self) -> bool {
        self.tables.len() == other.tables.len()
            && self
                .tables
                .iter()
                .all(|(name, rows)| other.tables.get(name) == Some(rows))
    }
}

impl Eq for Contribution {}

impl<K: Into<String>> FromIterator<(K, Vec<Row>)> for Contribution {
    fn from_iter<I: IntoIterator<Item = (K, Vec<Row>)>>(iter: I) -> Self {
        Self {
            tables: iter.into_iter().map(|(name, rows)| (name.into(), rows)).collect(),
        }
    }
}

impl IntoIterator for Contribution {
    type Item = (String, Vec<Row>);
    type IntoIter = indexmap::map::IntoIter<String, Vec<Row>>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order_is_insertion_order() {
        let mut c = Contribution::new();
        c.push_row("sites", Row::from([("site", "a")]));
        c.ensure_table("locations");
        c.push_row("sites", Row::from([("site", "b")]));
        assert_eq!(c.table_names().collect::<Vec<_>>(), vec!["sites", "locations"]);
        assert_eq!(c.table("sites").map(|rows| rows.len()), Some(2));
        assert_eq!(c.row_count(), 2);
    }

    #[test]
    fn test_equality_ignores_table_order() {
        let a: Contribution = [
            ("sites", vec![Row::from([("site", "a")])]),
            ("samples", vec![]),
        ]
        .into_iter()
        .collect();
        let b: Contribution = [
            ("samples", vec![]),
            ("sites", vec![Row::from([("site", "a")])]),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_respects_row_order() {
        let a: Contribution = [("t", vec![Row::from([("x", "1")]), Row::from([("x", "2")])])]
            .into_iter()
            .collect();
        let b: Contribution = [("t", vec![Row::from([("x", "2")]), Row::from([("x", "1")])])]
            .into_iter()
            .collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"contribution":[{"magic_version":"2.5"}],"er_sites":[{"er_site_name":"s1","site_lat":""}]}"#;
        let c: Contribution = serde_json::from_str(json).unwrap();
        assert_eq!(c.version_tag(), Some("2.5"));
        assert_eq!(c.table("er_sites").unwrap()[0], Row::from([("er_site_name", "s1")]));
        assert_eq!(
            serde_json::to_string(&c).unwrap(),
            r#"{"contribution":[{"magic_version":"2.5"}],"er_sites":[{"er_site_name":"s1"}]}"#
        );
    }

    #[test]
    fn test_json_table_order_survives_edits() {
        let json = r#"{"sites":[{"site":"a"}],"contribution":[{"magic_version":"3.0"}],"locations":[{"location":"x"}],"ages":[{"age":"1"}]}"#;
        let mut c: Contribution = serde_json::from_str(json).unwrap();
        assert_eq!(
            c.table_names().collect::<Vec<_>>(),
            vec!["sites", "contribution", "locations", "ages"]
        );

        assert!(c.remove_table("contribution").is_some());
        let replaced = c.insert_table("sites", vec![Row::from([("site", "b")])]);
        assert_eq!(replaced, Some(vec![Row::from([("site", "a")])]));
        assert_eq!(c.table_names().collect::<Vec<_>>(), vec!["sites", "locations", "ages"]);
        assert_eq!(
            serde_json::to_string(&c).unwrap(),
            r#"{"sites":[{"site":"b"}],"locations":[{"location":"x"}],"ages":[{"age":"1"}]}"#
        );
    }

    #[test]
    fn test_version_tag_requires_singleton() {
        let c: Contribution = [(
            METADATA_TABLE,
            vec![
                Row::from([(VERSION_COLUMN, "2.5")]),
                Row::from([(VERSION_COLUMN, "3.0")]),
            ],
        )]
        .into_iter()
        .collect();
        assert_eq!(c.version_tag(), None);
    }
}
