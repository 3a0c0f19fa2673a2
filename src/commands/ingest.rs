// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Ingest command - history to resolved commit table

use crate::classifier::CategoryClassifier;
use crate::config::Config;
use crate::export::{self, TableFormat};
use crate::identity;
use crate::ingest::{ingest_reader, ingest_repository};
use crate::scanner::{scan_path, ScanConfig};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;

use super::scan::SCAN_ARTIFACT;

/// Arguments for the ingest command
#[derive(Debug, Clone)]
pub struct IngestArgs {
    /// Repository to read
    pub repo: PathBuf,
    /// Output directory (defaults to the configured data directory)
    pub output: Option<PathBuf>,
    /// Table format
    pub format: TableFormat,
    /// Read a captured log instead of running git
    pub log_file: Option<PathBuf>,
    /// Only walk HEAD instead of every ref
    pub head_only: bool,
    /// Skip the working-tree scan
    pub no_scan: bool,
}

/// Run the ingest command
pub fn run(cfg: &Config, args: IngestArgs) -> Result<()> {
    info!("Ingesting: {:?}", args.repo);

    let classifier =
        CategoryClassifier::from_config(&cfg.categories).context("Invalid category rules")?;

    let (mut records, mut report) = match &args.log_file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            ingest_reader(BufReader::new(file), &classifier)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => {
            let mut ingest_cfg = cfg.ingest.clone();
            if args.head_only {
                ingest_cfg.all_refs = false;
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to start runtime")?;
            runtime
                .block_on(ingest_repository(&args.repo, &ingest_cfg, &classifier))
                .with_context(|| format!("Failed to read history of {}", args.repo.display()))?
        }
    };

    let resolution = identity::resolve_records(&mut records, &cfg.identity);
    let unresolved = records.iter().filter(|r| r.canonical_id < 0).count();
    report.identity = resolution.graph_stats();

    let out_dir = args.output.unwrap_or_else(|| cfg.data_dir.clone());
    let table_path = out_dir.join(format!("commits.{}", args.format.extension()));
    export::write_records_file(&records, args.format, &table_path)
        .with_context(|| format!("Failed to write {}", table_path.display()))?;
    export::write_json(resolution.groups(), &out_dir.join("identities.json"))
        .context("Failed to write identities")?;
    export::write_json(&report, &out_dir.join("ingest_report.json"))
        .context("Failed to write ingest report")?;

    println!(
        "Parsed {} commits into {} records ({} repeated blocks skipped)",
        report.commits, report.records, report.duplicate_blocks
    );
    println!(
        "Resolved {} identities ({} records unresolved)",
        resolution.len(),
        unresolved
    );

    if !args.no_scan {
        let snapshot = scan_path(&args.repo, &classifier, &ScanConfig::default())
            .with_context(|| format!("Failed to scan {}", args.repo.display()))?;
        export::write_json(&snapshot.categories, &out_dir.join(SCAN_ARTIFACT))
            .context("Failed to write scan snapshot")?;
        println!(
            "Scanned {} files, {} lines",
            snapshot.total_files, snapshot.total_lines
        );
    }

    println!("Output saved to {}", out_dir.display());
    Ok(())
}
