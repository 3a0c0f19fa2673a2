// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Connected components of the identity graph and record back-mapping

use super::graph::{GraphStats, IdentityGraph, NodeKind};
use crate::types::{CommitRecord, UNKNOWN_NAME, UNRESOLVED_ID};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// One canonical contributor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityGroup {
    /// Id, stable within a run
    pub id: i64,
    /// Longest member name, `Unknown` for email-only groups
    pub canonical_name: String,
    /// Member names, sorted
    pub names: Vec<String>,
    /// Member emails, sorted
    pub emails: Vec<String>,
}

/// Resolved groups with name and email lookups
#[derive(Debug, Clone, Default)]
pub struct IdentityResolution {
    groups: Vec<IdentityGroup>,
    by_email: HashMap<String, i64>,
    by_name: HashMap<String, i64>,
    stats: GraphStats,
}

impl IdentityResolution {
    /// Compute connected components of `graph`
    ///
    /// Group ids follow the creation order of each component's first node,
    /// so the same input always produces the same ids.
    #[must_use]
    pub fn from_graph(graph: &IdentityGraph) -> Self {
        let g = graph.inner();
        let mut sets = UnionFind::<usize>::new(g.node_count());
        for edge in g.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }
        let roots = sets.into_labeling();

        let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
        let mut members: Vec<(Vec<String>, Vec<String>)> = Vec::new();
        for idx in g.node_indices() {
            let slot = *slot_of_root.entry(roots[idx.index()]).or_insert_with(|| {
                members.push((Vec::new(), Vec::new()));
                members.len() - 1
            });
            let node = &g[idx];
            match node.kind {
                NodeKind::Name => members[slot].0.push(node.value.clone()),
                NodeKind::Email => members[slot].1.push(node.value.clone()),
            }
        }

        let mut resolution = Self {
            stats: graph.stats(),
            ..Self::default()
        };
        for (slot, (mut names, mut emails)) in members.into_iter().enumerate() {
            let id = i64::try_from(slot).unwrap_or(i64::MAX);
            names.sort();
            emails.sort();
            for name in &names {
                resolution.by_name.insert(name.clone(), id);
            }
            for email in &emails {
                resolution.by_email.insert(email.clone(), id);
            }
            resolution.groups.push(IdentityGroup {
                id,
                canonical_name: canonical_name(&names),
                names,
                emails,
            });
        }

        info!("Consolidated {} identity nodes into {} identities", g.node_count(), resolution.len());
        resolution
    }

    /// Canonical id and name for an author, email first, then name
    #[must_use]
    pub fn resolve(&self, name: &str, email: &str) -> (i64, &str) {
        self.by_email
            .get(&email.to_lowercase())
            .or_else(|| self.by_name.get(name))
            .and_then(|&id| self.group(id))
            .map_or((UNRESOLVED_ID, UNKNOWN_NAME), |g| (g.id, g.canonical_name.as_str()))
    }

    /// Fill `canonical_id`/`canonical_name` on every record
    ///
    /// Returns the number of records left unresolved.
    pub fn annotate(&self, records: &mut [CommitRecord]) -> usize {
        let mut unresolved = 0;
        for record in records.iter_mut() {
            let (id, name) = self.resolve(&record.author_name, &record.author_email);
            if id == UNRESOLVED_ID {
                unresolved += 1;
            }
            record.canonical_id = id;
            record.canonical_name = name.to_string();
        }
        if unresolved > 0 {
            info!("{} of {} records have no resolvable author", unresolved, records.len());
        }
        unresolved
    }

    /// Group by id
    #[must_use]
    pub fn group(&self, id: i64) -> Option<&IdentityGroup> {
        usize::try_from(id).ok().and_then(|i| self.groups.get(i))
    }

    /// All groups, ordered by id
    #[must_use]
    pub fn groups(&self) -> &[IdentityGroup] {
        &self.groups
    }

    /// Counters of the graph these groups came from
    #[must_use]
    pub fn graph_stats(&self) -> GraphStats {
        self.stats
    }

    /// Number of groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// No groups at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Longest name by character count; ties go to the lexicographically smallest
fn canonical_name(names: &[String]) -> String {
    names
        .iter()
        .max_by(|a, b| {
            a.chars()
                .count()
                .cmp(&b.chars().count())
                .then_with(|| b.cmp(a))
        })
        .cloned()
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}
