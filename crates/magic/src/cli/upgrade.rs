//! `magic upgrade`: move a contribution to a newer data model release.

use anyhow::{Context, Result};
use magic_contribution::Contribution;
use magic_upgrade::ContributionUpgrader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use super::config::{load_config, load_registry};
use super::output::{print_diagnostics, print_table};
use super::parse::{exit_code, read_contribution, table_summary};

/// Arguments for the upgrade command
#[derive(Debug, clap::Args)]
pub struct UpgradeArgs {
    /// Contribution file (tab-delimited text, or JSON with a .json extension)
    pub file: PathBuf,

    /// Highest release to upgrade to (default: config max_version, else latest)
    #[arg(long = "to", value_name = "VERSION")]
    pub to: Option<String>,

    /// Directory of data model definitions
    #[arg(long, value_name = "DIR", env = "MAGIC_DATA_MODELS")]
    pub models: Option<PathBuf>,

    /// Write the upgraded contribution here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the contribution and diagnostics as one JSON document
    #[arg(long)]
    pub json: bool,
}

fn write_output(path: &Path, contribution: &Contribution) -> Result<()> {
    let body = serde_json::to_string_pretty(contribution)?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write upgraded contribution: {}", path.display()))?;
    info!(path = %path.display(), "wrote upgraded contribution");
    Ok(())
}

pub fn run(args: UpgradeArgs) -> Result<ExitCode> {
    let config = load_config()?;
    let registry = load_registry(args.models.as_deref(), &config)?;
    let (contribution, mut diagnostics) = read_contribution(&args.file)?;
    let from = contribution.version_tag().map(str::to_string);

    let mut upgrader = ContributionUpgrader::new(&registry);
    let target = args.to.or(config.max_version);
    let upgraded = match target.as_deref() {
        Some(max_version) => upgrader.upgrade(contribution, max_version),
        None => upgrader.upgrade_to_latest(contribution),
    };
    diagnostics.extend(upgrader.into_diagnostics());

    info!(
        from = from.as_deref().unwrap_or("unknown"),
        to = upgraded.version_tag().unwrap_or("unknown"),
        warnings = diagnostics.warnings().len(),
        errors = diagnostics.errors().len(),
        "upgrade finished"
    );

    if let Some(ref path) = args.output {
        write_output(path, &upgraded)?;
    }

    if args.json {
        let value = serde_json::json!({
            "from_version": from,
            "version": upgraded.version_tag(),
            "contribution": upgraded,
            "diagnostics": diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else if let Some(ref path) = args.output {
        println!(
            "Upgraded {} from {} to {} -> {}",
            args.file.display(),
            from.as_deref().unwrap_or("unknown"),
            upgraded.version_tag().unwrap_or("unknown"),
            path.display()
        );
        println!();
        print_table(&["Table", "Rows", "Columns"], table_summary(&upgraded));
        print_diagnostics(&diagnostics);
    } else {
        // stdout carries the contribution, so diagnostics go to stderr
        println!("{}", serde_json::to_string_pretty(&upgraded)?);
        for diagnostic in diagnostics.iter() {
            eprintln!("{}: {}", diagnostic.severity, diagnostic);
        }
    }

    Ok(exit_code(&diagnostics))
}
