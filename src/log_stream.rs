// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Commit block reconstruction from `git log --numstat -m` output
//!
//! The stream alternates header lines (sentinel + `^|^`-joined fields) with
//! numstat lines. Merge commits appear once per parent, so only the first
//! block seen for a hash is emitted.

use crate::types::{CommitMeta, FileChange};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Marker opening every header line
pub const HEADER_SENTINEL: &str = "COMMIT_Start";

/// Separator between header fields
pub const FIELD_SEPARATOR: &str = "^|^";

/// Numstat count git prints for binary files
pub const BINARY_MARKER: &str = "-";

/// `--format` argument producing the header lines this parser expects
#[must_use]
pub fn header_format() -> String {
    let fields = ["%H", "%at", "%an", "%ae", "%cn", "%ce", "%ct", "%P", "%ai", "%s"];
    format!("{HEADER_SENTINEL}{FIELD_SEPARATOR}{}", fields.join(FIELD_SEPARATOR))
}

/// One commit with its file changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBlock {
    /// Header metadata
    pub meta: CommitMeta,
    /// Numstat lines in order
    pub changes: Vec<FileChange>,
}

/// Counters describing one pass over a log stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Header lines seen, including duplicates and malformed ones
    pub blocks: usize,
    /// Blocks emitted
    pub commits: usize,
    /// Blocks discarded because their hash was already emitted
    pub duplicate_blocks: usize,
    /// Headers that could not be parsed
    pub malformed_headers: usize,
    /// Numstat lines dropped (wrong shape, or outside any commit)
    pub dropped_lines: usize,
}

enum ParserState {
    NoCommit,
    /// Skipping file lines that belong to a malformed header
    Skipping,
    InCommit(CommitBlock),
}

/// Line-at-a-time commit block parser
pub struct LogStreamParser {
    state: ParserState,
    seen: HashSet<String>,
    stats: StreamStats,
}

impl Default for LogStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStreamParser {
    /// Create a parser with no buffered commit
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ParserState::NoCommit,
            seen: HashSet::new(),
            stats: StreamStats::default(),
        }
    }

    /// Feed one line; returns the previous commit when this line closes it
    pub fn push_line(&mut self, line: &str) -> Option<CommitBlock> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if let Some(rest) = line.strip_prefix(HEADER_SENTINEL) {
            if let Some(fields) = rest.strip_prefix(FIELD_SEPARATOR) {
                return self.start_block(fields);
            }
        }

        match &mut self.state {
            ParserState::InCommit(block) => match parse_numstat(line) {
                Some(change) => block.changes.push(change),
                None => {
                    debug!("Dropping malformed numstat line in {}: {:?}", block.meta.hash, line);
                    self.stats.dropped_lines += 1;
                }
            },
            ParserState::Skipping | ParserState::NoCommit => {
                self.stats.dropped_lines += 1;
            }
        }
        None
    }

    /// Flush the last buffered commit
    pub fn finish(&mut self) -> Option<CommitBlock> {
        let state = std::mem::replace(&mut self.state, ParserState::NoCommit);
        match state {
            ParserState::InCommit(block) => self.emit(block),
            ParserState::Skipping | ParserState::NoCommit => None,
        }
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Parse a complete log text into deduplicated blocks
    pub fn parse_all<'a, I>(lines: I) -> (Vec<CommitBlock>, StreamStats)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parser = Self::new();
        let mut blocks: Vec<CommitBlock> = lines
            .into_iter()
            .filter_map(|line| parser.push_line(line))
            .collect();
        blocks.extend(parser.finish());
        (blocks, parser.stats())
    }

    fn start_block(&mut self, fields: &str) -> Option<CommitBlock> {
        self.stats.blocks += 1;
        let previous = std::mem::replace(&mut self.state, ParserState::NoCommit);
        let flushed = match previous {
            ParserState::InCommit(block) => self.emit(block),
            ParserState::Skipping | ParserState::NoCommit => None,
        };

        self.state = match parse_header(fields) {
            Some(meta) => ParserState::InCommit(CommitBlock {
                meta,
                changes: Vec::new(),
            }),
            None => {
                warn!("Skipping malformed commit header: {:?}", truncate(fields, 120));
                self.stats.malformed_headers += 1;
                ParserState::Skipping
            }
        };
        flushed
    }

    fn emit(&mut self, block: CommitBlock) -> Option<CommitBlock> {
        if self.seen.contains(&block.meta.hash) {
            debug!("Discarding repeated block for {}", block.meta.hash);
            self.stats.duplicate_blocks += 1;
            return None;
        }
        self.seen.insert(block.meta.hash.clone());
        self.stats.commits += 1;
        Some(block)
    }
}

/// Parse the fields of a header line (everything after the sentinel)
///
/// The subject is last and keeps any separator it happens to contain.
fn parse_header(fields: &str) -> Option<CommitMeta> {
    let parts: Vec<&str> = fields.splitn(10, FIELD_SEPARATOR).collect();
    if parts.len() < 9 {
        return None;
    }
    let hash = parts[0].trim();
    if hash.is_empty() {
        return None;
    }

    Some(CommitMeta {
        hash: hash.to_string(),
        author_timestamp: parts[1].trim().parse().ok()?,
        author_name: parts[2].to_string(),
        author_email: parts[3].to_string(),
        committer_name: parts[4].to_string(),
        committer_email: parts[5].to_string(),
        committer_timestamp: parts[6].trim().parse().ok()?,
        parent_hashes: parts[7].split_whitespace().map(String::from).collect(),
        timezone_raw: parts[8].to_string(),
        subject: parts.get(9).map(|s| (*s).to_string()).unwrap_or_default(),
    })
}

/// Parse `added <ws> deleted <ws> path`; `-` counts are binary
fn parse_numstat(line: &str) -> Option<FileChange> {
    let (added, rest) = line.split_once(char::is_whitespace)?;
    let (deleted, path) = rest.trim_start().split_once(char::is_whitespace)?;
    let path = path.trim_start();
    if path.is_empty() {
        return None;
    }

    Some(FileChange {
        path: path.to_string(),
        additions: parse_count(added)?,
        deletions: parse_count(deleted)?,
    })
}

fn parse_count(token: &str) -> Option<Option<u64>> {
    if token == BINARY_MARKER {
        Some(None)
    } else {
        token.parse().ok().map(Some)
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
