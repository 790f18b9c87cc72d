//! `magic map`: show where columns of the previous release end up.

use anyhow::{Context, Result};
use magic_schema::build_upgrade_map;
use std::path::PathBuf;

use super::config::{load_config, load_registry};
use super::error::HelpfulError;
use super::output::print_table;

/// Arguments for the map command
#[derive(Debug, clap::Args)]
pub struct MapArgs {
    /// Release to map into (e.g. 3.0)
    pub version: String,

    /// Directory of data model definitions
    #[arg(long, value_name = "DIR", env = "MAGIC_DATA_MODELS")]
    pub models: Option<PathBuf>,
}

pub fn run(args: MapArgs) -> Result<()> {
    let config = load_config()?;
    let registry = load_registry(args.models.as_deref(), &config)?;

    let Some(version) = registry.resolve(&args.version) else {
        let known: Vec<String> = registry.versions().map(|v| v.as_str().to_string()).collect();
        return Err(HelpfulError::unknown_version(&args.version, &known).into());
    };
    let schema = registry
        .get(version)
        .with_context(|| format!("Data model {} is registered without a definition", version))?;
    let map = build_upgrade_map(schema);

    let from = registry
        .previous(version)
        .map(|v| v.as_str())
        .unwrap_or("(none)");
    println!("Upgrade map {} -> {}", from, version);
    println!();

    if map.is_empty() {
        println!("No column of an earlier release moves into {}.", version);
        return Ok(());
    }

    let rows = map
        .iter()
        .flat_map(|(table, columns)| {
            columns.iter().map(move |(column, destinations)| {
                let targets: Vec<String> = destinations.iter().map(|d| d.to_string()).collect();
                vec![table.to_string(), column.to_string(), targets.join(", ")]
            })
        })
        .collect();
    print_table(&["Old table", "Old column", "Destinations"], rows);

    Ok(())
}
