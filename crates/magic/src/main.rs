//! MagIC command-line tool
//!
//! Parses tab-delimited MagIC upload files and upgrades contributions between
//! data model releases:
//!
//! ```text
//! magic parse upload.txt
//! magic upgrade upload.txt --to 3.0 --output upgraded.json
//! magic map 3.0
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use magic_logging::LogConfig;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "magic", about = "Parse and upgrade MagIC contributions", version)]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a tab-delimited contribution file and report its tables
    Parse(cli::parse::ParseArgs),

    /// Upgrade a contribution to a newer data model release
    Upgrade(cli::upgrade::UpgradeArgs),

    /// Show how columns move into a data model release
    Map(cli::map::MapArgs),

    /// List the available data model releases
    Versions(cli::versions::VersionsArgs),

    /// Show configuration and resolved paths
    Config(cli::config::ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = magic_logging::init_logging(LogConfig {
        app_name: "magic",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    let json_mode = command_wants_json(&cli.command);
    match run_command(cli.command) {
        Ok(code) => code,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Parse(args) => args.json,
        Commands::Upgrade(args) => args.json,
        Commands::Map(_) => false,
        Commands::Versions(args) => args.json,
        Commands::Config(args) => args.json,
    }
}

fn run_command(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Parse(args) => cli::parse::run(args),
        Commands::Upgrade(args) => cli::upgrade::run(args),
        Commands::Map(args) => cli::map::run(args).map(|_| ExitCode::SUCCESS),
        Commands::Versions(args) => cli::versions::run(args).map(|_| ExitCode::SUCCESS),
        Commands::Config(args) => cli::config::run(args).map(|_| ExitCode::SUCCESS),
    }
}
