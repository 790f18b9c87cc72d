//! Old -> new column routing for one version step.
//!
//! A data model records lineage backwards: each new column lists the old
//! columns it came from. Upgrading needs the opposite direction, so the
//! lineage of the target release is inverted into
//! `old table -> old column -> [new table.column, ...]`.

use crate::model::{ColumnRef, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Routing for one version step, keyed by old table name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeMap {
    tables: BTreeMap<String, TableUpgradeMap>,
}

/// Routing for one old table, keyed by old column name.
///
/// Destinations keep the declaration order of the target release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableUpgradeMap {
    columns: BTreeMap<String, Vec<ColumnRef>>,
}

impl UpgradeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, old_table: &str) -> Option<&TableUpgradeMap> {
        self.tables.get(old_table)
    }

    pub fn contains_table(&self, old_table: &str) -> bool {
        self.tables.contains_key(old_table)
    }

    /// Destinations of one old column.
    pub fn destinations(&self, old_table: &str, old_column: &str) -> Option<&[ColumnRef]> {
        self.table(old_table)?.destinations(old_column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableUpgradeMap)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Add one destination for `old`.
    pub fn route(&mut self, old: &ColumnRef, new: ColumnRef) {
        self.tables
            .entry(old.table.clone())
            .or_default()
            .columns
            .entry(old.column.clone())
            .or_default()
            .push(new);
    }
}

impl TableUpgradeMap {
    pub fn destinations(&self, old_column: &str) -> Option<&[ColumnRef]> {
        self.columns.get(old_column).map(Vec::as_slice)
    }

    pub fn contains_column(&self, old_column: &str) -> bool {
        self.columns.contains_key(old_column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ColumnRef])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Invert the lineage of `next` into an upgrade map from the release before
/// it.
///
/// Walks tables, then columns, then lineage entries in declaration order, so
/// a split column lists its destinations in the order the new columns are
/// declared. Columns without lineage contribute nothing.
pub fn build_upgrade_map(next: &SchemaVersion) -> UpgradeMap {
    let mut map = UpgradeMap::new();
    for (table, table_def) in next.tables.iter() {
        for (column, column_def) in table_def.columns.iter() {
            for previous in &column_def.previous_columns {
                map.route(previous, ColumnRef::new(table, column));
            }
        }
    }
    map
}
