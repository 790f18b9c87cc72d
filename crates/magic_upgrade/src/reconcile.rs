//! Routing old rows through an upgrade map and merging the results.
//!
//! One old row can feed several new tables (a results row carries sample,
//! site and specimen names) and several old rows can describe the same new
//! row (a specimen from `er_specimens` and the same specimen from
//! `pmag_results`). Routing produces drafts; [`ReconciledTables`] folds the
//! drafts into the output contribution.

use magic_contribution::{Contribution, Row};
use indexmap::IndexMap;
use magic_schema::TableUpgradeMap;
use tracing::debug;

/// An old row split into per-table drafts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedRow {
    /// `(new table, draft row)` in first-destination order.
    pub drafts: Vec<(String, Row)>,
    /// Old columns with no destination in the map, in row order.
    pub unmapped: Vec<String>,
    /// Destinations discarded because they fall outside the allowed table.
    pub dropped: usize,
}

impl StagedRow {
    /// True when no value of the old row reached any new table.
    pub fn is_deleted(&self) -> bool {
        self.drafts.is_empty()
    }
}

/// Route every value of `row` to its destinations.
///
/// With `only_table` set, destinations in any other table are dropped. When
/// two old columns land on the same new column with different values the
/// draft forks and both variants are kept. Identical values collapse.
pub fn stage_row(row: &Row, map: &TableUpgradeMap, only_table: Option<&str>) -> StagedRow {
    let mut staged = StagedRow::default();
    let mut variants: IndexMap<&str, Vec<Row>> = IndexMap::new();

    for (column, value) in row.iter() {
        let Some(destinations) = map.destinations(column) else {
            staged.unmapped.push(column.to_string());
            continue;
        };

        for dest in destinations {
            if only_table.is_some_and(|table| table != dest.table) {
                staged.dropped += 1;
                continue;
            }
            let table_variants = variants
                .entry(dest.table.as_str())
                .or_insert_with(|| vec![Row::new()]);
            place_value(table_variants, &dest.column, value);
        }
    }

    for (table, rows) in variants {
        if rows.len() > 1 {
            debug!(table = %table, variants = rows.len(), "conflicting values forked a draft row");
        }
        staged
            .drafts
            .extend(rows.into_iter().map(|draft| (table.to_string(), draft)));
    }
    staged
}

fn place_value(variants: &mut Vec<Row>, column: &str, value: &str) {
    let mut forks = Vec::new();
    for variant in variants.iter_mut() {
        match variant.get(column).map(|existing| existing == value) {
            None => {
                variant.insert(column, value);
            }
            Some(true) => {}
            Some(false) => {
                let mut fork = variant.clone();
                fork.insert(column, value);
                forks.push(fork);
            }
        }
    }
    for fork in forks {
        if !variants.contains(&fork) {
            variants.push(fork);
        }
    }
}

/// Where a draft ended up in its output table (0-based index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Merged(usize),
    Appended(usize),
}

/// Output tables of one upgrade step.
#[derive(Debug, Clone, Default)]
pub struct ReconciledTables {
    tables: Contribution,
}

impl ReconciledTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table up front so it keeps its position in the output.
    pub fn reserve(&mut self, table: &str) {
        self.tables.ensure_table(table);
    }

    /// Merge `draft` into the first compatible row of `table`, or append it.
    pub fn add(&mut self, table: &str, draft: Row) -> Placement {
        let rows = self.tables.ensure_table(table);
        for (index, existing) in rows.iter_mut().enumerate() {
            if existing.merge(&draft).is_ok() {
                return Placement::Merged(index);
            }
        }
        rows.push(draft);
        Placement::Appended(rows.len() - 1)
    }

    pub fn table(&self, table: &str) -> Option<&[Row]> {
        self.tables.table(table)
    }

    pub fn table_mut(&mut self, table: &str) -> Option<&mut Vec<Row>> {
        self.tables.table_mut(table)
    }

    /// The output contribution, without tables that received no rows.
    pub fn into_contribution(self) -> Contribution {
        self.tables
            .into_iter()
            .filter(|(_, rows)| !rows.is_empty())
            .collect()
    }
}
