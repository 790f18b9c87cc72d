//! Shared primitives for MagIC contributions.
//!
//! Everything here is used by more than one crate in the workspace:
//!
//! - [`version`]: the data model release tag (`2.5`, `3.0`, ...) and its ordering
//! - [`paths`]: resolution of the MagIC home, config and log locations

pub mod paths;
pub mod version;

pub use version::{DataModelVersion, VersionError};

/// Name of the metadata table that carries the contribution's version tag.
pub const METADATA_TABLE: &str = "contribution";

/// Column of the metadata row holding the data model version tag.
pub const VERSION_COLUMN: &str = "magic_version";
