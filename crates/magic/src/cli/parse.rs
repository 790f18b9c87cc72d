//! `magic parse`: read a contribution file and report what it holds.

use anyhow::{Context, Result};
use magic_contribution::{parse_contribution, Contribution, Diagnostics};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use super::error::HelpfulError;
use super::output::{print_diagnostics, print_table};

/// Arguments for the parse command
#[derive(Debug, clap::Args)]
pub struct ParseArgs {
    /// Tab-delimited contribution file
    pub file: PathBuf,

    /// Print the contribution and diagnostics as JSON
    #[arg(long)]
    pub json: bool,
}

/// Read a contribution from a `.json` dump or a tab-delimited text file.
pub fn read_contribution(path: &Path) -> Result<(Contribution, Diagnostics)> {
    if !path.exists() {
        return Err(HelpfulError::file_not_found(path).into());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|err| HelpfulError::cannot_read_file(path, &err.to_string()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let contribution: Contribution = serde_json::from_str(&text)
            .with_context(|| format!("Failed to read contribution JSON: {}", path.display()))?;
        info!(path = %path.display(), tables = contribution.len(), "loaded contribution JSON");
        return Ok((contribution, Diagnostics::new()));
    }

    let (contribution, diagnostics) = parse_contribution(&text);
    info!(
        path = %path.display(),
        tables = contribution.len(),
        rows = contribution.row_count(),
        warnings = diagnostics.warnings().len(),
        errors = diagnostics.errors().len(),
        "parsed contribution"
    );
    Ok((contribution, diagnostics))
}

/// Table name, row count and distinct column count per table.
pub fn table_summary(contribution: &Contribution) -> Vec<Vec<String>> {
    contribution
        .tables()
        .map(|(name, rows)| {
            let columns: BTreeSet<&str> = rows.iter().flat_map(|row| row.columns()).collect();
            vec![name.to_string(), rows.len().to_string(), columns.len().to_string()]
        })
        .collect()
}

pub fn exit_code(diagnostics: &Diagnostics) -> ExitCode {
    if diagnostics.has_errors() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

pub fn run(args: ParseArgs) -> Result<ExitCode> {
    let (contribution, diagnostics) = read_contribution(&args.file)?;

    if args.json {
        let value = serde_json::json!({
            "version": contribution.version_tag(),
            "contribution": contribution,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{}: {} table(s), {} row(s), data model {}",
            args.file.display(),
            contribution.len(),
            contribution.row_count(),
            contribution.version_tag().unwrap_or("unknown")
        );
        println!();
        print_table(&["Table", "Rows", "Columns"], table_summary(&contribution));
        print_diagnostics(&diagnostics);
    }

    Ok(exit_code(&diagnostics))
}
