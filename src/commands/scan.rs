// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Scan command - point-in-time category footprint of a checkout

use crate::classifier::CategoryClassifier;
use crate::config::Config;
use crate::export;
use crate::scanner::{scan_path, ScanConfig, ScanSnapshot};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// File name of the scan artifact
pub const SCAN_ARTIFACT: &str = "category_metadata.json";

/// Arguments for the scan command
#[derive(Debug, Clone)]
pub struct ScanArgs {
    /// Checkout to walk
    pub path: PathBuf,
    /// Output file (defaults to `<data_dir>/category_metadata.json`)
    pub output: Option<PathBuf>,
    /// Maximum depth (0 = unlimited)
    pub max_depth: usize,
    /// Follow symbolic links
    pub follow_symlinks: bool,
    /// Print JSON to stdout instead of writing a file
    pub json: bool,
}

/// Run the scan command
pub fn run(cfg: &Config, args: ScanArgs) -> Result<()> {
    info!("Scanning: {:?}", args.path);

    let classifier =
        CategoryClassifier::from_config(&cfg.categories).context("Invalid category rules")?;
    let scan_config = ScanConfig {
        max_depth: args.max_depth,
        follow_symlinks: args.follow_symlinks,
    };

    let snapshot = scan_path(&args.path, &classifier, &scan_config)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;

    if args.json {
        let mut stdout = std::io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &snapshot.categories)?;
        stdout.write_all(b"\n")?;
        return Ok(());
    }

    let output = args
        .output
        .unwrap_or_else(|| cfg.data_dir.join(SCAN_ARTIFACT));
    export::write_json(&snapshot.categories, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    print_summary(&snapshot);
    println!();
    println!("Snapshot saved to {}", output.display());
    Ok(())
}

/// Print categories by descending line count
pub fn print_summary(snapshot: &ScanSnapshot) {
    println!(
        "Scanned {} files, {} lines:",
        snapshot.total_files, snapshot.total_lines
    );
    println!();

    let mut categories: Vec<_> = snapshot.categories.iter().collect();
    categories.sort_by(|a, b| b.1.lines.cmp(&a.1.lines).then_with(|| a.0.cmp(b.0)));

    for (label, footprint) in categories {
        println!(
            "  {:<32} {:>8} files {:>10} lines",
            label, footprint.files, footprint.lines
        );
    }

    if snapshot.unreadable_files > 0 {
        println!();
        println!("  ({} files could not be read)", snapshot.unreadable_files);
    }
}
