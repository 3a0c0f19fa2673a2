// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repocensus library - census of a repository's commit history
//!
//! This crate turns the raw output of `git log --numstat -m` into a flat,
//! analytics-ready table of per-category commit records, and collapses the
//! many (name, email) spellings found in that history into canonical
//! contributor identities.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod git;
pub mod identity;
pub mod ingest;
pub mod log_stream;
pub mod records;
pub mod scanner;

pub use error::{Error, Result};

/// Core data types shared by the ingest and identity stages
pub mod types {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;
    use std::ops::AddAssign;

    /// Category assigned to a commit with no file changes and several parents
    pub const MERGE_CATEGORY: &str = "Merge";

    /// Extension label for files without one
    pub const NO_EXTENSION: &str = "(no_ext)";

    /// Canonical id of a record whose author could not be resolved
    pub const UNRESOLVED_ID: i64 = -1;

    /// Display name for unresolved authors and name-less identity groups
    pub const UNKNOWN_NAME: &str = "Unknown";

    // =========================================================================
    // Parsed log input
    // =========================================================================

    /// Metadata of one commit, as read from a log header line
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CommitMeta {
        /// Full commit hash
        pub hash: String,
        /// Author timestamp (seconds since the Unix epoch)
        pub author_timestamp: i64,
        /// Author name as recorded
        pub author_name: String,
        /// Author email as recorded
        pub author_email: String,
        /// Committer name as recorded
        pub committer_name: String,
        /// Committer email as recorded
        pub committer_email: String,
        /// Committer timestamp (seconds since the Unix epoch)
        pub committer_timestamp: i64,
        /// Parent hashes, in order
        pub parent_hashes: Vec<String>,
        /// Author date with its trailing `+HHMM` offset
        pub timezone_raw: String,
        /// First line of the commit message
        pub subject: String,
    }

    impl CommitMeta {
        /// A merge has more than one parent
        #[must_use]
        pub fn is_merge(&self) -> bool {
            self.parent_hashes.len() > 1
        }
    }

    /// Per-file line counts of one commit
    ///
    /// `None` counts come from binary files and aggregate as zero.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FileChange {
        /// Path relative to the repository root
        pub path: String,
        /// Lines added, `None` for binary files
        pub additions: Option<u64>,
        /// Lines deleted, `None` for binary files
        pub deletions: Option<u64>,
    }

    impl FileChange {
        /// Line delta of this change, binary counts as zero
        #[must_use]
        pub fn delta(&self) -> LineDelta {
            LineDelta {
                adds: self.additions.unwrap_or(0),
                dels: self.deletions.unwrap_or(0),
            }
        }

        /// Whether git reported this file as binary
        #[must_use]
        pub fn is_binary(&self) -> bool {
            self.additions.is_none() && self.deletions.is_none()
        }
    }

    /// Additions/deletions accumulator
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LineDelta {
        /// Lines added
        pub adds: u64,
        /// Lines deleted
        pub dels: u64,
    }

    /// Saturates at `u64::MAX` instead of overflowing
    impl AddAssign for LineDelta {
        fn add_assign(&mut self, rhs: Self) {
            self.adds = self.adds.saturating_add(rhs.adds);
            self.dels = self.dels.saturating_add(rhs.dels);
        }
    }

    // =========================================================================
    // Output table
    // =========================================================================

    /// One row of the output table: a commit restricted to one category
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct CommitRecord {
        /// Commit hash (shared by every row exploded from the same commit)
        pub hash: String,
        /// Author time in UTC
        pub date_utc: DateTime<Utc>,
        /// Calendar year of `date_utc`
        pub year: i32,
        /// Month of `date_utc` (1-12)
        pub month: u32,
        /// Day of week of `date_utc`, Monday = 0
        pub day_of_week: u32,
        /// Hour of `date_utc` (0-23)
        pub hour_utc: u32,
        /// Author's UTC offset in minutes, 0 when unknown
        pub timezone_offset_minutes: i32,
        /// Author name as recorded
        pub author_name: String,
        /// Author email, lower-cased
        pub author_email: String,
        /// Domain part of the author email, or `unknown`
        pub author_domain: String,
        /// Committer name as recorded
        pub committer_name: String,
        /// Committer email, lower-cased
        pub committer_email: String,
        /// More than one parent
        pub is_merge: bool,
        /// Category this row covers
        pub category: String,
        /// Lines added within `category`
        pub additions: u64,
        /// Lines deleted within `category`
        pub deletions: u64,
        /// Lines added by the whole commit
        pub commit_total_adds: u64,
        /// Lines deleted by the whole commit
        pub commit_total_dels: u64,
        /// Whole-commit churn per file extension
        pub extension_breakdown: BTreeMap<String, LineDelta>,
        /// Resolved contributor id, [`UNRESOLVED_ID`] until annotated
        pub canonical_id: i64,
        /// Resolved contributor display name
        pub canonical_name: String,
    }
}
