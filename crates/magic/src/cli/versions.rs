//! `magic versions`: list the loaded data model releases.

use anyhow::Result;
use std::path::PathBuf;

use super::config::{load_config, load_registry};
use super::output::print_table;

/// Arguments for the versions command
#[derive(Debug, clap::Args)]
pub struct VersionsArgs {
    /// Directory of data model definitions
    #[arg(long, value_name = "DIR", env = "MAGIC_DATA_MODELS")]
    pub models: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: VersionsArgs) -> Result<()> {
    let config = load_config()?;
    let registry = load_registry(args.models.as_deref(), &config)?;
    let latest = registry.latest().map(|v| v.as_str().to_string());

    let entries: Vec<(String, usize, usize)> = registry
        .versions()
        .filter_map(|version| {
            registry.get(version).map(|schema| {
                (
                    version.as_str().to_string(),
                    schema.table_names().count(),
                    schema.column_count(),
                )
            })
        })
        .collect();

    if args.json {
        let versions: Vec<serde_json::Value> = entries
            .iter()
            .map(|(version, tables, columns)| {
                serde_json::json!({
                    "version": version,
                    "tables": tables,
                    "columns": columns,
                })
            })
            .collect();
        let value = serde_json::json!({
            "latest": latest,
            "versions": versions,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let rows = entries
        .into_iter()
        .map(|(version, tables, columns)| {
            let marker = if latest.as_deref() == Some(version.as_str()) {
                "latest"
            } else {
                ""
            };
            vec![version, tables.to_string(), columns.to_string(), marker.to_string()]
        })
        .collect();
    print_table(&["Version", "Tables", "Columns", ""], rows);

    Ok(())
}
