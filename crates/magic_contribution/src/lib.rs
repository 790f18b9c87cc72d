//! MagIC contributions
//!
//! A contribution is one dataset: a set of named tables (`er_sites`,
//! `pmag_results`, `specimens`, ...) each holding rows of string values. This
//! crate owns the in-memory shape of a contribution and the parser for the
//! tab-delimited upload text format.
//!
//! Values stay opaque strings here. Nothing is converted to numbers or
//! booleans; that belongs to validation against a data model.
//!
//! # Modules
//!
//! - [`row`]: a single row, with the merge/conflict primitive used by upgrades
//! - [`contribution`]: the table -> rows structure
//! - [`diagnostics`]: warnings and errors collected during a run
//! - [`parser`]: text -> [`Contribution`]

pub mod contribution;
pub mod diagnostics;
pub mod parser;
pub mod row;

pub use contribution::Contribution;
pub use diagnostics::{Diagnostic, DiagnosticContext, Diagnostics, Severity};
pub use parser::{parse_contribution, ContributionParser};
pub use row::{Row, RowConflict};
