// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Identity graph: name and email nodes linked by commit co-occurrence

use crate::config::{AliasPair, IdentityConfig};
use crate::types::CommitRecord;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Which half of an authorship pair a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Author name, compared exactly
    Name,
    /// Author email, compared lower-cased
    Email,
}

/// A node of the identity graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityNode {
    /// Name or email
    pub kind: NodeKind,
    /// The observed value
    pub value: String,
}

impl IdentityNode {
    /// Name node
    #[must_use]
    pub fn name(value: &str) -> Self {
        Self {
            kind: NodeKind::Name,
            value: value.to_string(),
        }
    }

    /// Email node (lower-cased)
    #[must_use]
    pub fn email(value: &str) -> Self {
        Self {
            kind: NodeKind::Email,
            value: value.to_lowercase(),
        }
    }
}

/// Why two nodes are linked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOrigin {
    /// A commit attributed this name/email pair
    Commit,
    /// Manual alias table
    Alias,
}

/// Shared or bot identifiers that must never link two halves of a pair
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    names: HashSet<String>,
    emails: HashSet<String>,
}

impl ExclusionPolicy {
    /// Policy from the configured denylists
    #[must_use]
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self {
            names: config.ignored_names.iter().cloned().collect(),
            emails: config.ignored_emails.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Name is on the denylist
    #[must_use]
    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Email is on the denylist (case-insensitive)
    #[must_use]
    pub fn is_ignored_email(&self, email: &str) -> bool {
        self.emails.contains(&email.to_lowercase())
    }
}

/// Counters from building a graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Pairs observed
    pub pairs: usize,
    /// Pairs left unlinked because one side is denylisted
    pub suppressed_links: usize,
    /// Alias pairs that bridged two existing names
    pub aliases_applied: usize,
    /// Alias pairs skipped because a name was never observed
    pub aliases_skipped: usize,
}

/// Undirected name/email graph backed by petgraph
pub struct IdentityGraph {
    graph: UnGraph<IdentityNode, EdgeOrigin>,
    node_indices: HashMap<IdentityNode, NodeIndex>,
    policy: ExclusionPolicy,
    stats: GraphStats,
}

impl IdentityGraph {
    /// Empty graph enforcing the denylists of `config`
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            node_indices: HashMap::new(),
            policy: ExclusionPolicy::from_config(config),
            stats: GraphStats::default(),
        }
    }

    /// Observe every pair, then apply the configured aliases
    pub fn build<'r, I>(pairs: I, config: &IdentityConfig) -> Self
    where
        I: IntoIterator<Item = (&'r str, &'r str)>,
    {
        let mut graph = Self::new(config);
        for (name, email) in pairs {
            graph.observe(name, email);
        }
        graph.apply_aliases(&config.aliases);
        graph
    }

    /// Graph over the authors of a record table
    #[must_use]
    pub fn from_records(records: &[CommitRecord], config: &IdentityConfig) -> Self {
        Self::build(
            records
                .iter()
                .map(|r| (r.author_name.as_str(), r.author_email.as_str())),
            config,
        )
    }

    /// Record one authorship pair
    ///
    /// Both nodes are created and linked unless either side is denylisted;
    /// in that case only the other side gets a node. Empty values are ordinary
    /// values here: list `""` in the denylists to keep them out.
    pub fn observe(&mut self, name: &str, email: &str) {
        self.stats.pairs += 1;
        let name_ok = !self.policy.is_ignored_name(name);
        let email_ok = !self.policy.is_ignored_email(email);

        let name_idx = name_ok.then(|| self.add_node(IdentityNode::name(name)));
        let email_idx = email_ok.then(|| self.add_node(IdentityNode::email(email)));

        match (name_idx, email_idx) {
            (Some(n), Some(e)) => {
                self.graph.update_edge(n, e, EdgeOrigin::Commit);
            }
            _ => {
                debug!("Not linking {:?} <{}>", name, email);
                self.stats.suppressed_links += 1;
            }
        }
    }

    /// Bridge alias pairs whose names were both observed; never creates nodes
    ///
    /// Returns how many pairs were applied.
    pub fn apply_aliases(&mut self, aliases: &[AliasPair]) -> usize {
        let mut applied = 0;
        for pair in aliases {
            let left = self.node_indices.get(&IdentityNode::name(&pair.name)).copied();
            let right = self.node_indices.get(&IdentityNode::name(&pair.alias)).copied();
            match (left, right) {
                (Some(a), Some(b)) => {
                    if a != b {
                        self.graph.update_edge(a, b, EdgeOrigin::Alias);
                    }
                    applied += 1;
                }
                _ => {
                    debug!("Skipping alias {} <-> {} (name not observed)", pair.name, pair.alias);
                    self.stats.aliases_skipped += 1;
                }
            }
        }
        self.stats.aliases_applied += applied;
        applied
    }

    fn add_node(&mut self, node: IdentityNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.node_indices.insert(node, idx);
        idx
    }

    /// Whether a name node exists
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.node_indices.contains_key(&IdentityNode::name(name))
    }

    /// Whether an email node exists
    #[must_use]
    pub fn contains_email(&self, email: &str) -> bool {
        self.node_indices.contains_key(&IdentityNode::email(email))
    }

    /// Whether two nodes are directly linked
    #[must_use]
    pub fn linked(&self, a: &IdentityNode, b: &IdentityNode) -> bool {
        match (self.node_indices.get(a), self.node_indices.get(b)) {
            (Some(&x), Some(&y)) => self.graph.find_edge(x, y).is_some(),
            _ => false,
        }
    }

    /// Node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Build counters
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    /// Underlying petgraph graph, nodes in creation order
    #[must_use]
    pub fn inner(&self) -> &UnGraph<IdentityNode, EdgeOrigin> {
        &self.graph
    }
}
