// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
#![no_main]

use libfuzzer_sys::fuzz_target;
use repocensus::classifier::CategoryClassifier;
use repocensus::log_stream::LogStreamParser;
use repocensus::records::CommitRecordBuilder;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let (blocks, stats) = LogStreamParser::parse_all(text.lines());
    assert_eq!(blocks.len(), stats.commits);

    let classifier = CategoryClassifier::default();
    let builder = CommitRecordBuilder::new(&classifier);
    for block in &blocks {
        let rows = builder.build(&block.meta, &block.changes);
        assert!(!rows.is_empty());
        let adds = rows
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.additions));
        assert!(rows.iter().all(|r| r.commit_total_adds == adds));
    }
});
