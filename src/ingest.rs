// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! History ingestion: log lines in, categorized commit records out

use crate::classifier::CategoryClassifier;
use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::git::LogCommand;
use crate::identity::GraphStats;
use crate::log_stream::{CommitBlock, LogStreamParser};
use crate::records::CommitRecordBuilder;
use crate::types::CommitRecord;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;
use tracing::info;

/// Summary of one ingest pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Header lines seen
    pub blocks: usize,
    /// Distinct commits kept
    pub commits: usize,
    /// Per-parent repeats discarded
    pub duplicate_blocks: usize,
    /// Headers that could not be parsed
    pub malformed_headers: usize,
    /// Numstat lines dropped
    pub dropped_lines: usize,
    /// Output rows produced
    pub records: usize,
    /// Non-fatal stderr from the log command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_warning: Option<String>,
    /// Identity graph counters, filled in once identities are resolved
    #[serde(default)]
    pub identity: GraphStats,
}

/// Accumulates records while log lines stream in
pub struct RecordCollector<'a> {
    parser: LogStreamParser,
    builder: CommitRecordBuilder<'a>,
    records: Vec<CommitRecord>,
}

impl<'a> RecordCollector<'a> {
    /// Collector classifying with `classifier`
    #[must_use]
    pub fn new(classifier: &'a CategoryClassifier) -> Self {
        Self {
            parser: LogStreamParser::new(),
            builder: CommitRecordBuilder::new(classifier),
            records: Vec::new(),
        }
    }

    /// Feed one raw log line
    pub fn push_line(&mut self, line: &str) {
        if let Some(block) = self.parser.push_line(line) {
            self.add_block(&block);
        }
    }

    /// Flush the parser and return the table with its report
    pub fn finish(mut self) -> (Vec<CommitRecord>, IngestReport) {
        if let Some(block) = self.parser.finish() {
            self.add_block(&block);
        }
        let stats = self.parser.stats();
        let report = IngestReport {
            blocks: stats.blocks,
            commits: stats.commits,
            duplicate_blocks: stats.duplicate_blocks,
            malformed_headers: stats.malformed_headers,
            dropped_lines: stats.dropped_lines,
            records: self.records.len(),
            stderr_warning: None,
            identity: GraphStats::default(),
        };
        (self.records, report)
    }

    fn add_block(&mut self, block: &CommitBlock) {
        self.records
            .extend(self.builder.build(&block.meta, &block.changes));
    }
}

/// Run the log command against `repo` and build the record table
pub async fn ingest_repository(
    repo: &Path,
    config: &IngestConfig,
    classifier: &CategoryClassifier,
) -> Result<(Vec<CommitRecord>, IngestReport)> {
    ingest_with(&LogCommand::new(repo, config), classifier).await
}

/// Run a prepared log command and build the record table
pub async fn ingest_with(
    command: &LogCommand,
    classifier: &CategoryClassifier,
) -> Result<(Vec<CommitRecord>, IngestReport)> {
    let mut collector = RecordCollector::new(classifier);
    let outcome = command.stream(|line| collector.push_line(line)).await?;
    let (records, mut report) = collector.finish();
    if !outcome.stderr.trim().is_empty() {
        report.stderr_warning = Some(outcome.stderr);
    }
    log_report(&report);
    Ok((records, report))
}

/// Build the record table from previously captured log output
pub fn ingest_reader<R: BufRead>(
    reader: R,
    classifier: &CategoryClassifier,
) -> Result<(Vec<CommitRecord>, IngestReport)> {
    let mut collector = RecordCollector::new(classifier);
    for line in reader.split(b'\n') {
        let line = line.map_err(Error::Stream)?;
        collector.push_line(&String::from_utf8_lossy(&line));
    }
    let (records, report) = collector.finish();
    log_report(&report);
    Ok((records, report))
}

fn log_report(report: &IngestReport) {
    info!(
        "Parsed {} commits into {} records ({} repeated blocks, {} malformed headers, {} dropped lines)",
        report.commits,
        report.records,
        report.duplicate_blocks,
        report.malformed_headers,
        report.dropped_lines
    );
}
