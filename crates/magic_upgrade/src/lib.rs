//! MagIC contribution upgrades
//!
//! Moves a [`Contribution`](magic_contribution::Contribution) from the data
//! model release it was written against to a newer one, one release at a
//! time. Each step builds the routing map for the next release, applies the
//! step rules bound to that release pair, routes every row and folds rows that
//! describe the same thing back together.
//!
//! # Modules
//!
//! - [`reconcile`]: staging old rows into drafts and merging drafts
//! - [`rules`]: row transforms bound to one version step
//! - [`upgrader`]: the version chain loop and its diagnostics

pub mod reconcile;
pub mod rules;
pub mod upgrader;

pub use reconcile::{stage_row, Placement, ReconciledTables, StagedRow};
pub use rules::{ContributionLevelResults, ResultLevel, RowDirective, StepRule, StepRuleSet};
pub use upgrader::{upgrade_contribution, ContributionUpgrader};
