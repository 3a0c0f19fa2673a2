// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Contributor identity resolution
//!
//! Author names and emails become nodes of an undirected graph; a commit
//! links its name to its email unless either is a shared/bot value on the
//! denylist. Manual aliases bridge names that were both observed. Each
//! connected component is one contributor.

pub mod graph;
pub mod resolver;

pub use crate::config::{AliasPair, IdentityConfig};
pub use graph::{EdgeOrigin, ExclusionPolicy, GraphStats, IdentityGraph, IdentityNode, NodeKind};
pub use resolver::{IdentityGroup, IdentityResolution};

use crate::types::CommitRecord;
use tracing::info;

/// Build the graph over `records`, resolve it and annotate every record
pub fn resolve_records(records: &mut [CommitRecord], config: &IdentityConfig) -> IdentityResolution {
    let graph = IdentityGraph::from_records(records, config);
    let resolution = IdentityResolution::from_graph(&graph);
    let stats = resolution.graph_stats();
    info!(
        "Identity graph: {} pairs, {} left unlinked by denylists, {} aliases applied, {} skipped",
        stats.pairs, stats.suppressed_links, stats.aliases_applied, stats.aliases_skipped
    );
    resolution.annotate(records);
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CategoryClassifier;
    use crate::records::CommitRecordBuilder;
    use crate::types::CommitMeta;

    fn records(pairs: &[(&str, &str)]) -> Vec<CommitRecord> {
        let classifier = CategoryClassifier::default();
        let builder = CommitRecordBuilder::new(&classifier);
        pairs
            .iter()
            .enumerate()
            .flat_map(|(i, (name, email))| {
                let meta = CommitMeta {
                    hash: format!("h{i}"),
                    author_timestamp: 0,
                    author_name: (*name).to_string(),
                    author_email: (*email).to_string(),
                    committer_name: (*name).to_string(),
                    committer_email: (*email).to_string(),
                    committer_timestamp: 0,
                    parent_hashes: vec!["p".into()],
                    timezone_raw: String::new(),
                    subject: String::new(),
                };
                builder.build(&meta, &[])
            })
            .collect()
    }

    #[test]
    fn test_resolve_records_annotates_and_keeps_stats() {
        let config = IdentityConfig {
            ignored_names: vec![],
            ignored_emails: vec!["bot@ci".into()],
            aliases: vec![AliasPair::new("Ann", "annie"), AliasPair::new("Ann", "ghost")],
        };
        let mut rows = records(&[("Ann", "a@x"), ("annie", "b@x"), ("Cy", "bot@ci")]);
        let resolution = resolve_records(&mut rows, &config);

        assert_eq!(resolution.len(), 2);
        assert_eq!(rows[0].canonical_id, rows[1].canonical_id);
        assert_eq!(rows[1].canonical_name, "annie");

        let stats = resolution.graph_stats();
        assert_eq!(stats.pairs, 3);
        assert_eq!(stats.suppressed_links, 1);
        assert_eq!(stats.aliases_applied, 1);
        assert_eq!(stats.aliases_skipped, 1);
    }
}
