// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Classify command - diagnose how category rules split a file list

use crate::classifier::CategoryClassifier;
use crate::config::Config;
use crate::git;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Number of entries shown in each fallback listing
pub const TOP_N: usize = 20;

/// Directory label for files at the repository root
pub const ROOT_DIR: &str = "root";

/// Directory whose direct children are listed when they fall through
pub const SOURCE_ROOT: &str = "src";

/// Category distribution for a set of paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationReport {
    /// Number of paths classified
    pub total: usize,
    /// `(label, count)` by descending count, ties by label
    pub distribution: Vec<(String, usize)>,
    /// Directories of fallback paths by descending count, at most [`TOP_N`]
    pub fallback_dirs: Vec<(String, usize)>,
    /// Fallback paths directly under [`SOURCE_ROOT`], at most [`TOP_N`]
    pub fallback_source_files: Vec<String>,
}

impl ClassificationReport {
    /// Classify every path and tally the results
    pub fn build<S: AsRef<str>>(classifier: &CategoryClassifier, paths: &[S]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut dir_counts: HashMap<&str, usize> = HashMap::new();
        let mut fallback_source_files = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let label = classifier.classify(path);
            *counts.entry(label).or_default() += 1;

            if label == classifier.fallback() {
                let dir = parent_dir(path);
                *dir_counts.entry(dir).or_default() += 1;
                if dir == SOURCE_ROOT && fallback_source_files.len() < TOP_N {
                    fallback_source_files.push(path.to_string());
                }
            }
        }

        let mut fallback_dirs = ranked(dir_counts);
        fallback_dirs.truncate(TOP_N);

        Self {
            total: paths.len(),
            distribution: ranked(counts),
            fallback_dirs,
            fallback_source_files,
        }
    }

    /// Percentage of all paths that landed in `count`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn share(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => ROOT_DIR,
        Some(idx) => &path[..idx],
    }
}

fn ranked(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Run the classify command
pub fn run(cfg: &Config, repo: &Path, paths: Vec<String>, color: bool) -> Result<()> {
    let classifier =
        CategoryClassifier::from_config(&cfg.categories).context("Invalid category rules")?;

    let paths = if paths.is_empty() {
        info!("Listing tracked files in {:?}", repo);
        git::ls_files(repo)
            .with_context(|| format!("Failed to list files in {}", repo.display()))?
    } else {
        paths
    };

    let report = ClassificationReport::build(&classifier, &paths);
    let heading = |text: &str| {
        if color {
            println!("\n{}", text.bold());
        } else {
            println!("\n{text}");
        }
    };

    println!("Analyzed {} files", report.total);

    heading("Category distribution (by file count)");
    for (label, count) in &report.distribution {
        println!("  {}: {} ({:.1}%)", label, count, report.share(*count));
    }

    heading(&format!("Top directories in '{}'", classifier.fallback()));
    for (dir, count) in &report.fallback_dirs {
        println!("  {dir}: {count}");
    }

    heading(&format!(
        "Files directly under {}/ in '{}'",
        SOURCE_ROOT,
        classifier.fallback()
    ));
    for file in &report.fallback_source_files {
        println!("  {file}");
    }

    Ok(())
}
