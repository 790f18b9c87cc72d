//! CLI command handlers for the magic binary.

pub mod config;
pub mod error;
pub mod map;
pub mod output;
pub mod parse;
pub mod upgrade;
pub mod versions;
