// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Repository scanning
//!
//! Point-in-time footprint of the working tree per category and extension,
//! independent of history replay.

use crate::classifier::CategoryClassifier;
use crate::error::{Error, Result};
use crate::records::extension_of;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Scan options
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Maximum directory depth (0 = unlimited)
    pub max_depth: usize,
    /// Follow symbolic links
    pub follow_symlinks: bool,
}

/// File and line count
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    /// Number of files
    pub files: u64,
    /// Number of lines
    #[serde(rename = "loc")]
    pub lines: u64,
}

/// Footprint of one category with its per-extension breakdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFootprint {
    /// Number of files
    pub files: u64,
    /// Number of lines
    #[serde(rename = "loc")]
    pub lines: u64,
    /// Breakdown by lower-cased extension
    #[serde(rename = "languages")]
    pub extensions: BTreeMap<String, Footprint>,
}

/// Contents of the scan artifact: footprints keyed by category label
pub type CategoryMetadata = BTreeMap<String, CategoryFootprint>;

/// Snapshot of a checkout
///
/// Only [`ScanSnapshot::categories`] is persisted; the totals feed logs and
/// summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSnapshot {
    /// Per-category footprint
    pub categories: CategoryMetadata,
    /// Files scanned
    pub total_files: u64,
    /// Lines scanned
    pub total_lines: u64,
    /// Files whose lines could not be read (counted with 0 lines)
    pub unreadable_files: u64,
}

impl ScanSnapshot {
    fn record(&mut self, category: &str, extension: String, lines: u64) {
        let cat = self.categories.entry(category.to_string()).or_default();
        cat.files += 1;
        cat.lines += lines;
        let ext = cat.extensions.entry(extension).or_default();
        ext.files += 1;
        ext.lines += lines;
        self.total_files += 1;
        self.total_lines += lines;
    }
}

/// Walk `root` and tally every file, skipping `.git` directories
pub fn scan_path(
    root: &Path,
    classifier: &CategoryClassifier,
    config: &ScanConfig,
) -> Result<ScanSnapshot> {
    if !root.is_dir() {
        return Err(Error::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    if config.max_depth > 0 {
        walker = walker.max_depth(config.max_depth);
    }

    let mut snapshot = ScanSnapshot::default();
    let entries = walker
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"));

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = relative_path(root, entry.path());
        let lines = match count_lines(entry.path()) {
            Ok(n) => n,
            Err(e) => {
                warn!("Counting {} as 0 lines: {}", rel, e);
                snapshot.unreadable_files += 1;
                0
            }
        };
        snapshot.record(classifier.classify(&rel), extension_of(&rel), lines);
    }

    info!(
        "Scanned {} files, {} lines in {} categories",
        snapshot.total_files,
        snapshot.total_lines,
        snapshot.categories.len()
    );
    Ok(snapshot)
}

/// `/`-separated path of `path` below `root`
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Number of lines, counting a final line without a newline
fn count_lines(path: &Path) -> std::io::Result<u64> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; 64 * 1024];
    let mut lines = 0u64;
    let mut last = b'\n';
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        lines += buf[..n].iter().filter(|&&b| b == b'\n').count() as u64;
        last = buf[n - 1];
    }
    if last != b'\n' {
        lines += 1;
    }
    Ok(lines)
}
