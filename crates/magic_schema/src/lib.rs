//! MagIC data models
//!
//! A data model release (`2.5`, `3.0`, ...) declares its tables and columns.
//! Each column may point back at the column(s) it came from in the previous
//! release; those lineage pointers are all an upgrade needs to know.
//!
//! Data models are authored elsewhere and shipped as JSON files. This crate
//! only reads them.
//!
//! # Modules
//!
//! - [`model`]: one release's table and column definitions
//! - [`registry`]: every known release, ordered by version
//! - [`upgrade_map`]: lineage inverted into an old -> new routing table

pub mod model;
pub mod registry;
pub mod upgrade_map;

pub use model::{ColumnDef, ColumnRef, SchemaVersion, TableDef};
pub use registry::{SchemaError, SchemaRegistry};
pub use upgrade_map::{build_upgrade_map, TableUpgradeMap, UpgradeMap};
