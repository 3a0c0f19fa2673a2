// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Category explosion of commit blocks into output rows

use crate::classifier::CategoryClassifier;
use crate::types::{
    CommitMeta, CommitRecord, FileChange, LineDelta, MERGE_CATEGORY, NO_EXTENSION,
    UNKNOWN_NAME, UNRESOLVED_ID,
};
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use std::collections::BTreeMap;

/// Turns one deduplicated commit into one record per touched category
pub struct CommitRecordBuilder<'a> {
    classifier: &'a CategoryClassifier,
}

impl<'a> CommitRecordBuilder<'a> {
    /// Create a builder classifying paths with `classifier`
    #[must_use]
    pub fn new(classifier: &'a CategoryClassifier) -> Self {
        Self { classifier }
    }

    /// Build the rows for one commit
    ///
    /// Every row carries its own category's churn plus the whole-commit
    /// totals and extension breakdown. A commit without file changes yields a
    /// single zero row: `Merge` when it has several parents, the fallback
    /// category otherwise.
    #[must_use]
    pub fn build(&self, meta: &CommitMeta, changes: &[FileChange]) -> Vec<CommitRecord> {
        let mut by_category: BTreeMap<String, LineDelta> = BTreeMap::new();
        let mut by_extension: BTreeMap<String, LineDelta> = BTreeMap::new();
        let mut total = LineDelta::default();

        for change in changes {
            let delta = change.delta();
            *by_category
                .entry(self.classifier.classify(&change.path).to_string())
                .or_default() += delta;
            *by_extension.entry(extension_of(&change.path)).or_default() += delta;
            total += delta;
        }

        if changes.is_empty() {
            let label = if meta.is_merge() {
                MERGE_CATEGORY
            } else {
                self.classifier.fallback()
            };
            by_category.insert(label.to_string(), LineDelta::default());
        }

        let date_utc = author_time(meta.author_timestamp);
        let timezone_offset_minutes = parse_tz_offset(&meta.timezone_raw);
        let author_email = meta.author_email.to_lowercase();
        let author_domain = email_domain(&author_email);
        let committer_email = meta.committer_email.to_lowercase();
        let is_merge = meta.is_merge();

        by_category
            .into_iter()
            .map(|(category, delta)| CommitRecord {
                hash: meta.hash.clone(),
                date_utc,
                year: date_utc.year(),
                month: date_utc.month(),
                day_of_week: date_utc.weekday().num_days_from_monday(),
                hour_utc: date_utc.hour(),
                timezone_offset_minutes,
                author_name: meta.author_name.clone(),
                author_email: author_email.clone(),
                author_domain: author_domain.clone(),
                committer_name: meta.committer_name.clone(),
                committer_email: committer_email.clone(),
                is_merge,
                category,
                additions: delta.adds,
                deletions: delta.dels,
                commit_total_adds: total.adds,
                commit_total_dels: total.dels,
                extension_breakdown: by_extension.clone(),
                canonical_id: UNRESOLVED_ID,
                canonical_name: UNKNOWN_NAME.to_string(),
            })
            .collect()
    }
}

/// Author timestamp as UTC, epoch when out of range
fn author_time(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default()
}

/// Lower-cased extension of the last path component, dot included
///
/// Dot-files and names without a dot have no extension.
#[must_use]
pub fn extension_of(path: &str) -> String {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(idx) => name[stem_start + idx..].to_lowercase(),
        None => NO_EXTENSION.to_string(),
    }
}

/// Signed minute offset from the trailing `+HHMM` token, 0 if absent or malformed
#[must_use]
pub fn parse_tz_offset(raw: &str) -> i32 {
    let Some(token) = raw.split_whitespace().last() else {
        return 0;
    };
    let bytes = token.as_bytes();
    if bytes.len() != 5 || !bytes[1..].iter().all(u8::is_ascii_digit) {
        return 0;
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return 0,
    };
    let hours: i32 = token[1..3].parse().unwrap_or(0);
    let minutes: i32 = token[3..5].parse().unwrap_or(0);
    sign * (hours * 60 + minutes)
}

/// Domain of an email address, `unknown` without an `@`
#[must_use]
pub fn email_domain(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((_, domain)) => domain.to_lowercase(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryRule;
    use std::collections::HashSet;

    fn classifier() -> CategoryClassifier {
        CategoryClassifier::new(
            &[
                CategoryRule::new("Crypto", &[r"crypto/"]),
                CategoryRule::new("Docs", &[r"\.md$"]),
            ],
            "Core Libs",
        )
        .unwrap()
    }

    fn meta(parents: &[&str]) -> CommitMeta {
        CommitMeta {
            hash: "abc123".into(),
            // 2023-11-14 22:13:20 UTC, a Tuesday
            author_timestamp: 1_700_000_000,
            author_name: "Alice".into(),
            author_email: "Alice@Example.COM".into(),
            committer_name: "Bob".into(),
            committer_email: "BOB@x.com".into(),
            committer_timestamp: 1_700_000_100,
            parent_hashes: parents.iter().map(|p| (*p).to_string()).collect(),
            timezone_raw: "2023-11-14 23:13:20 +0100".into(),
            subject: "subject".into(),
        }
    }

    fn change(path: &str, adds: Option<u64>, dels: Option<u64>) -> FileChange {
        FileChange {
            path: path.into(),
            additions: adds,
            deletions: dels,
        }
    }

    #[test]
    fn test_explodes_per_category_with_totals() {
        let c = classifier();
        let changes = vec![
            change("src/crypto/sha.cpp", Some(10), Some(1)),
            change("src/crypto/aes.h", Some(5), Some(0)),
            change("README.md", Some(2), Some(3)),
            change("src/main.cpp", Some(1), Some(1)),
            change("img/logo.png", None, None),
        ];
        let rows = CommitRecordBuilder::new(&c).build(&meta(&["p"]), &changes);

        assert_eq!(rows.len(), 3);
        let cats: HashSet<_> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(cats, HashSet::from(["Crypto", "Docs", "Core Libs"]));

        let crypto = rows.iter().find(|r| r.category == "Crypto").unwrap();
        assert_eq!((crypto.additions, crypto.deletions), (15, 1));

        let sum_adds: u64 = rows.iter().map(|r| r.additions).sum();
        let sum_dels: u64 = rows.iter().map(|r| r.deletions).sum();
        for row in &rows {
            assert_eq!(row.commit_total_adds, 18);
            assert_eq!(row.commit_total_dels, 5);
            assert_eq!(row.extension_breakdown, rows[0].extension_breakdown);
        }
        assert_eq!(sum_adds, 18);
        assert_eq!(sum_dels, 5);

        let ext = &rows[0].extension_breakdown;
        assert_eq!(ext[".cpp"], LineDelta { adds: 11, dels: 2 });
        assert_eq!(ext[".png"], LineDelta::default());
        assert_eq!(ext.len(), 4);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let c = classifier();
        let changes = vec![
            change("src/crypto/a.cpp", Some(u64::MAX), Some(0)),
            change("src/crypto/b.cpp", Some(u64::MAX), Some(1)),
            change("src/main.cpp", Some(1), Some(0)),
        ];
        let rows = CommitRecordBuilder::new(&c).build(&meta(&["p"]), &changes);

        let crypto = rows.iter().find(|r| r.category == "Crypto").unwrap();
        assert_eq!(crypto.additions, u64::MAX);
        assert!(rows.iter().all(|r| r.commit_total_adds == u64::MAX));
        assert_eq!(rows[0].extension_breakdown[".cpp"].adds, u64::MAX);
        assert_eq!(rows[0].commit_total_dels, 1);
    }

    #[test]
    fn test_empty_merge_gets_merge_row() {
        let c = classifier();
        let rows = CommitRecordBuilder::new(&c).build(&meta(&["p1", "p2"]), &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, MERGE_CATEGORY);
        assert!(rows[0].is_merge);
        assert_eq!((rows[0].additions, rows[0].deletions), (0, 0));
        assert!(rows[0].extension_breakdown.is_empty());
    }

    #[test]
    fn test_empty_non_merge_gets_fallback_row() {
        let c = classifier();
        for parents in [&[][..], &["p"][..]] {
            let rows = CommitRecordBuilder::new(&c).build(&meta(parents), &[]);
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].category, "Core Libs");
            assert!(!rows[0].is_merge);
            assert_eq!(rows[0].commit_total_adds, 0);
        }
    }

    #[test]
    fn test_time_and_identity_fields() {
        let c = classifier();
        let rows = CommitRecordBuilder::new(&c).build(&meta(&["p"]), &[]);
        let r = &rows[0];
        assert_eq!(r.year, 2023);
        assert_eq!(r.month, 11);
        assert_eq!(r.day_of_week, 1);
        assert_eq!(r.hour_utc, 22);
        assert_eq!(r.timezone_offset_minutes, 60);
        assert_eq!(r.author_email, "alice@example.com");
        assert_eq!(r.author_domain, "example.com");
        assert_eq!(r.committer_email, "bob@x.com");
        assert_eq!(r.canonical_id, UNRESOLVED_ID);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("src/Foo.CPP"), ".cpp");
        assert_eq!(extension_of("a.dir/Makefile"), NO_EXTENSION);
        assert_eq!(extension_of(".gitignore"), NO_EXTENSION);
        assert_eq!(extension_of("src/.hidden.yml"), ".yml");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
    }

    #[test]
    fn test_parse_tz_offset() {
        assert_eq!(parse_tz_offset("2020-01-01 10:00:00 -0530"), -330);
        assert_eq!(parse_tz_offset("2020-01-01 10:00:00 +0000"), 0);
        assert_eq!(parse_tz_offset("+1245"), 765);
        assert_eq!(parse_tz_offset(""), 0);
        assert_eq!(parse_tz_offset("2020-01-01 10:00:00 UTC"), 0);
        assert_eq!(parse_tz_offset("2020-01-01 10:00:00 +01:00"), 0);
        assert_eq!(parse_tz_offset("x +12a4"), 0);
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("a@b.org"), "b.org");
        assert_eq!(email_domain("no-at-sign"), "unknown");
    }
}
