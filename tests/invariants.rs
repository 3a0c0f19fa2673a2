// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for the ingest and identity pipeline
//!
//! These tests verify the properties downstream analytics rely on:
//! 1. Row explosion - per-category sums equal the commit totals
//! 2. Row uniqueness - one row per (hash, category)
//! 3. Classification purity - same path, same label
//! 4. Identity merging - shared emails merge, denylisted emails don't

use proptest::prelude::*;
use repocensus::classifier::CategoryClassifier;
use repocensus::config::{AliasPair, CategoryRule, IdentityConfig};
use repocensus::identity::{self, IdentityGraph, IdentityNode, IdentityResolution};
use repocensus::ingest::ingest_reader;
use repocensus::log_stream::{header_format, LogStreamParser, FIELD_SEPARATOR, HEADER_SENTINEL};
use repocensus::records::CommitRecordBuilder;
use repocensus::types::{CommitMeta, CommitRecord, FileChange, MERGE_CATEGORY, UNRESOLVED_ID};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Test Helpers
// =============================================================================

fn meta(hash: &str, name: &str, email: &str, parents: &[&str]) -> CommitMeta {
    CommitMeta {
        hash: hash.into(),
        author_timestamp: 1_700_000_000,
        author_name: name.into(),
        author_email: email.into(),
        committer_name: name.into(),
        committer_email: email.into(),
        committer_timestamp: 1_700_000_000,
        parent_hashes: parents.iter().map(|p| (*p).to_string()).collect(),
        timezone_raw: "2023-11-14 22:13:20 +0100".into(),
        subject: "subject".into(),
    }
}

fn header(hash: &str, name: &str, email: &str, parents: &str) -> String {
    let fields = [
        hash,
        "1700000000",
        name,
        email,
        name,
        email,
        "1700000000",
        parents,
        "2023-11-14 22:13:20 -0500",
        "subject line",
    ];
    format!("{HEADER_SENTINEL}{FIELD_SEPARATOR}{}", fields.join(FIELD_SEPARATOR))
}

fn record(name: &str, email: &str) -> CommitRecord {
    let classifier = CategoryClassifier::default();
    let mut rows = CommitRecordBuilder::new(&classifier).build(&meta("h", name, email, &["p"]), &[]);
    rows.remove(0)
}

fn no_aliases() -> IdentityConfig {
    IdentityConfig {
        ignored_names: vec![],
        ignored_emails: vec!["bot@ci".into()],
        aliases: vec![],
    }
}

fn resolve(pairs: &[(&str, &str)], config: &IdentityConfig) -> IdentityResolution {
    let graph = IdentityGraph::build(pairs.iter().copied(), config);
    IdentityResolution::from_graph(&graph)
}

const PATHS: &[&str] = &[
    "src/wallet/wallet.cpp",
    "src/consensus/merkle.cpp",
    "src/net.cpp",
    "src/qt/forms/main.ui",
    "doc/release-notes.md",
    "test/functional/feature.py",
    "src/main.cpp",
    "Makefile",
    "src/crypto/sha256.cpp",
    "contrib/README",
];

fn file_change() -> impl Strategy<Value = FileChange> {
    (
        prop::sample::select(PATHS),
        prop::option::weighted(0.9, 0u64..500),
        prop::option::weighted(0.9, 0u64..500),
    )
        .prop_map(|(path, additions, deletions)| FileChange {
            path: path.to_string(),
            additions,
            deletions,
        })
}

// =============================================================================
// Record Invariants
// =============================================================================

proptest! {
    #[test]
    fn prop_category_rows_sum_to_commit_totals(
        changes in prop::collection::vec(file_change(), 0..24),
        parents in 0usize..3,
    ) {
        let classifier = CategoryClassifier::default();
        let parent_ids: Vec<String> = (0..parents).map(|i| format!("p{i}")).collect();
        let parent_refs: Vec<&str> = parent_ids.iter().map(String::as_str).collect();
        let rows = CommitRecordBuilder::new(&classifier)
            .build(&meta("abc", "A", "a@x", &parent_refs), &changes);

        prop_assert!(!rows.is_empty());
        let adds: u64 = rows.iter().map(|r| r.additions).sum();
        let dels: u64 = rows.iter().map(|r| r.deletions).sum();
        for row in &rows {
            prop_assert_eq!(row.commit_total_adds, adds);
            prop_assert_eq!(row.commit_total_dels, dels);
            prop_assert_eq!(&row.extension_breakdown, &rows[0].extension_breakdown);
        }

        let ext_adds: u64 = rows[0].extension_breakdown.values().map(|d| d.adds).sum();
        prop_assert_eq!(ext_adds, adds);
    }

    #[test]
    fn prop_hash_category_pairs_are_unique(
        changes in prop::collection::vec(file_change(), 0..24),
    ) {
        let classifier = CategoryClassifier::default();
        let rows = CommitRecordBuilder::new(&classifier)
            .build(&meta("abc", "A", "a@x", &["p"]), &changes);

        let mut seen = HashSet::new();
        for row in &rows {
            prop_assert!(seen.insert((row.hash.clone(), row.category.clone())));
        }
    }

    #[test]
    fn prop_classification_is_pure(path in "[a-z/._]{0,40}") {
        let classifier = CategoryClassifier::default();
        let first = classifier.classify(&path).to_string();
        prop_assert_eq!(classifier.classify(&path), first.as_str());
        prop_assert!(classifier.labels().contains(&first.as_str()));
    }

    #[test]
    fn prop_shared_email_always_merges(
        names in prop::collection::vec("[A-Za-z]{1,12}", 1..6),
    ) {
        let pairs: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "same@x.com")).collect();
        let resolution = resolve(&pairs, &no_aliases());

        prop_assert_eq!(resolution.len(), 1);
        let longest = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
        prop_assert_eq!(resolution.groups()[0].canonical_name.chars().count(), longest);
    }
}

#[test]
fn test_empty_commits_use_merge_or_fallback() {
    let classifier = CategoryClassifier::default();
    let builder = CommitRecordBuilder::new(&classifier);

    let merge = builder.build(&meta("m", "A", "a@x", &["p1", "p2"]), &[]);
    assert_eq!(merge.len(), 1);
    assert_eq!(merge[0].category, MERGE_CATEGORY);
    assert_eq!((merge[0].additions, merge[0].deletions), (0, 0));

    for parents in [&[][..], &["p1"][..]] {
        let rows = builder.build(&meta("s", "A", "a@x", parents), &[]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, classifier.fallback());
        assert_eq!((rows[0].additions, rows[0].deletions), (0, 0));
    }
}

#[test]
fn test_classifier_example_rules() {
    let rules = vec![CategoryRule::new("Crypto", &[r"crypto/"])];
    let classifier = CategoryClassifier::new(&rules, "Core Libs").unwrap();

    assert_eq!(classifier.classify("src/crypto/sha256.cpp"), "Crypto");
    assert_eq!(classifier.classify("src/main.cpp"), "Core Libs");
}

// =============================================================================
// Log Stream to Records
// =============================================================================

#[test]
fn test_duplicate_merge_blocks_keep_first() {
    let lines = vec![
        header("m1", "A", "a@x", "p1 p2"),
        "3\t1\tsrc/net.cpp".to_string(),
        header("m1", "A", "a@x", "p1 p2"),
        "90\t90\tsrc/wallet/wallet.cpp".to_string(),
        header("c2", "B", "b@x", "m1"),
        "-\t-\timg/logo.png".to_string(),
        "not a numstat line".to_string(),
    ];
    let (blocks, stats) = LogStreamParser::parse_all(lines.iter().map(String::as_str));

    assert_eq!(blocks.len(), 2);
    assert_eq!(stats.duplicate_blocks, 1);
    assert_eq!(blocks[0].changes.len(), 1);
    assert_eq!(blocks[0].changes[0].path, "src/net.cpp");
    assert!(blocks[1].changes[0].is_binary());
}

#[test]
fn test_reader_to_resolved_table() {
    let log = [
        header("c1", "Alice", "A@X.com", ""),
        String::new(),
        "10\t2\tsrc/crypto/sha256.cpp".to_string(),
        "1\t0\tdoc/notes.md".to_string(),
        header("c2", "Alice W.", "a@x.com", "c1"),
        String::new(),
        "4\t4\tsrc/main.cpp".to_string(),
    ]
    .join("\n");

    let classifier = CategoryClassifier::default();
    let (mut records, report) = ingest_reader(log.as_bytes(), &classifier).unwrap();
    assert_eq!(report.commits, 2);
    assert_eq!(report.records, 3);
    assert_eq!(records[0].timezone_offset_minutes, -300);

    let resolution = identity::resolve_records(&mut records, &no_aliases());
    assert_eq!(resolution.len(), 1);
    for r in &records {
        assert_eq!(r.canonical_name, "Alice W.");
        assert_eq!(r.canonical_id, records[0].canonical_id);
        assert_eq!(r.author_email, "a@x.com");
    }
}

#[test]
fn test_header_format_names_every_field() {
    let format = header_format();
    assert!(format.starts_with(HEADER_SENTINEL));
    assert_eq!(format.matches(FIELD_SEPARATOR).count(), 10);
}

// =============================================================================
// Identity Invariants
// =============================================================================

#[test]
fn test_shared_email_example() {
    let resolution = resolve(&[("Alice", "a@x.com"), ("Alice W.", "a@x.com")], &no_aliases());
    let (a, name_a) = resolution.resolve("Alice", "a@x.com");
    let (b, _) = resolution.resolve("Alice W.", "A@X.COM");

    assert_eq!(a, b);
    assert_eq!(name_a, "Alice W.");
}

#[test]
fn test_denylisted_email_never_merges_names() {
    let resolution = resolve(&[("X", "bot@ci"), ("Y", "BOT@ci")], &no_aliases());

    let (x, _) = resolution.resolve("X", "x-other@nowhere");
    let (y, _) = resolution.resolve("Y", "y-other@nowhere");
    assert_ne!(x, UNRESOLVED_ID);
    assert_ne!(y, UNRESOLVED_ID);
    assert_ne!(x, y);
}

#[test]
fn test_shared_blank_email_merges_like_any_email() {
    let resolution = resolve(&[("X", ""), ("Y", "")], &no_aliases());
    let (x, _) = resolution.resolve("X", "");
    let (y, name) = resolution.resolve("Y", "");

    assert_ne!(x, UNRESOLVED_ID);
    assert_eq!(x, y);
    assert_eq!(name, "X");
    assert_eq!(resolution.len(), 1);
}

#[test]
fn test_alias_needs_both_names() {
    let mut config = no_aliases();
    config.aliases = vec![AliasPair::new("Matt", "TheMatt"), AliasPair::new("Gavin", "gavin")];

    let graph = IdentityGraph::build(
        [("Matt", "m@x"), ("TheMatt", "t@x"), ("Gavin", "g@x")],
        &config,
    );
    assert!(graph.linked(&IdentityNode::name("Matt"), &IdentityNode::name("TheMatt")));
    assert!(!graph.contains_name("gavin"));

    let resolution = IdentityResolution::from_graph(&graph);
    assert_eq!(resolution.len(), 2);
    assert_eq!(resolution.resolve("Matt", "").0, resolution.resolve("TheMatt", "").0);
}

#[test]
fn test_unresolved_records_get_sentinel() {
    let resolution = resolve(&[("A", "a@x")], &no_aliases());
    let mut records = vec![record("Nobody", "nobody@x")];
    let unresolved = resolution.annotate(&mut records);

    assert_eq!(unresolved, 1);
    assert_eq!(records[0].canonical_id, UNRESOLVED_ID);
    assert_eq!(records[0].canonical_name, "Unknown");
}

#[test]
fn test_group_ids_are_distinct() {
    let resolution = resolve(
        &[("A", "a@x"), ("B", "b@x"), ("C", "c@x"), ("A", "a2@x")],
        &no_aliases(),
    );
    let ids: HashMap<i64, usize> = resolution
        .groups()
        .iter()
        .map(|g| (g.id, g.emails.len()))
        .collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(resolution.resolve("", "a2@x").0, resolution.resolve("A", "").0);
}
