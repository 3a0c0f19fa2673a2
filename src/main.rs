// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repocensus CLI - commit history census and contributor identities

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use repocensus::commands;
use repocensus::commands::ingest::IngestArgs;
use repocensus::commands::scan::ScanArgs;
use repocensus::config;
use repocensus::export::TableFormat;

#[derive(Parser)]
#[command(name = "repocensus")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "REPOCENSUS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, env = "REPOCENSUS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true, value_parser = clap::builder::FalseyValueParser::new())]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a repository's history into a categorized commit table
    Ingest {
        /// Repository to read
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Output directory (defaults to the data directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Table format (csv, json, jsonl)
        #[arg(short, long, value_enum, default_value = "csv")]
        format: TableFormat,

        /// Read captured `git log` output instead of running git
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Only follow HEAD instead of every ref
        #[arg(long)]
        head_only: bool,

        /// Skip the working-tree footprint scan
        #[arg(long)]
        no_scan: bool,
    },

    /// Measure the current category footprint of a checkout
    Scan {
        /// Path to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to <data-dir>/category_metadata.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum directory depth (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_depth: usize,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,

        /// Print the snapshot as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Show how the category rules split a set of paths
    Classify {
        /// Repository whose tracked files are classified
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Paths to classify (defaults to `git ls-files`)
        paths: Vec<String>,
    },

    /// Show the effective configuration
    Config {
        /// Dotted key to print (e.g. ingest.timeout_secs)
        key: Option<String>,

        /// Print the default configuration file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        cfg.data_dir = dir;
    }

    // Initialize logging
    let level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => cfg.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Ingest { repo, output, format, log_file, head_only, no_scan } => {
            commands::ingest::run(
                &cfg,
                IngestArgs { repo, output, format, log_file, head_only, no_scan },
            )
        }
        Commands::Scan { path, output, max_depth, follow_symlinks, json } => {
            commands::scan::run(
                &cfg,
                ScanArgs { path, output, max_depth, follow_symlinks, json },
            )
        }
        Commands::Classify { repo, paths } => {
            commands::classify::run(&cfg, &repo, paths, !cli.no_color)
        }
        Commands::Config { key, path } => {
            commands::config::run(&cfg, key.as_deref(), path)
        }
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
