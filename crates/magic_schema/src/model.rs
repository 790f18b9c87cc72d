//! Data model definition types.
//!
//! Only the structural part of a data model file is modelled here. Descriptive
//! keys (`label`, `type`, `validations`, `examples`, ...) are accepted and
//! ignored.

use indexmap::IndexMap;
use magic_protocol::DataModelVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One data model release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Release tag. Optional in the file; the registry fills it in from the
    /// file name when absent.
    #[serde(rename = "magic_version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<DataModelVersion>,

    /// Tables in declaration order.
    #[serde(default)]
    pub tables: IndexMap<String, TableDef>,
}

impl SchemaVersion {
    pub fn new(version: DataModelVersion) -> Self {
        Self {
            version: Some(version),
            tables: IndexMap::new(),
        }
    }

    /// Add a table definition, replacing any previous one with the same name
    pub fn with_table(mut self, name: impl Into<String>, table: TableDef) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.table(table).is_some_and(|t| t.has_column(column))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }
}

/// Column definitions of one table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default)]
    pub columns: IndexMap<String, ColumnDef>,
}

impl TableDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_column(mut self, name: impl Into<String>, column: ColumnDef) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }
}

/// A column and where its values came from in the previous release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Empty for a column introduced in this release.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_columns: Vec<ColumnRef>,
}

impl ColumnDef {
    /// A column with no lineage
    pub fn new() -> Self {
        Self::default()
    }

    /// A column fed by the given previous columns, in order
    pub fn from_previous(previous: impl IntoIterator<Item = ColumnRef>) -> Self {
        Self {
            previous_columns: previous.into_iter().collect(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.previous_columns.is_empty()
    }
}

/// A `{table, column}` location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
