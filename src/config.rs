// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Built-in defaults, overlaid by an optional TOML file, overlaid by
//! `REPOCENSUS__`-prefixed environment variables (`__` separates sections,
//! e.g. `REPOCENSUS__INGEST__TIMEOUT_SECS=600`).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "REPOCENSUS";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the output artifacts are written to
    pub data_dir: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log command settings
    pub ingest: IngestConfig,
    /// Category rule table
    pub categories: CategoryConfig,
    /// Identity denylists and manual aliases
    pub identity: IdentityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            ingest: IngestConfig::default(),
            categories: CategoryConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

impl Config {
    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Settings for running the log command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Kill the log command after this many seconds
    pub timeout_secs: u64,
    /// Read buffer for the child's stdout
    pub read_buffer_bytes: usize,
    /// Walk every ref (`--all`) rather than just HEAD
    pub all_refs: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 3600,
            read_buffer_bytes: 10 * 1024 * 1024,
            all_refs: true,
        }
    }
}

/// One entry of the ordered category table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category label
    pub label: String,
    /// Regex patterns searched case-insensitively anywhere in the path
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl CategoryRule {
    /// Build a rule from string slices
    #[must_use]
    pub fn new(label: &str, patterns: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Ordered category rules plus the no-match label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// Label used when no rule matches
    pub fallback: String,
    /// Rules in evaluation order
    pub rules: Vec<CategoryRule>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            fallback: "Core Libs".to_string(),
            rules: vec![
                CategoryRule::new(
                    "Consensus (Domain Logic)",
                    &[
                        r"src/consensus/", r"src/kernel/", r"src/script/", r"src/primitives/",
                        r"src/chain", r"src/coins", r"src/pow", r"src/validation\.", r"src/policy/",
                    ],
                ),
                CategoryRule::new(
                    "Node & RPC (App/Interface)",
                    &[
                        r"src/node/", r"src/rpc/", r"src/index/", r"src/zmq/",
                        r"src/init\.", r"src/bitcoind\.", r"src/bitcoin-cli\.", r"src/txmempool\.",
                    ],
                ),
                CategoryRule::new(
                    "P2P Network (Infrastructure)",
                    &[r"src/net", r"src/protocol", r"src/addrman"],
                ),
                CategoryRule::new("Wallet (Client App)", &[r"src/wallet/", r"src/interfaces/"]),
                CategoryRule::new("GUI (Presentation Layer)", &[r"src/qt/", r"src/forms/"]),
                CategoryRule::new(
                    "Database (Persistence)",
                    &[r"src/leveldb/", r"src/crc32c/", r"src/dbwrapper\."],
                ),
                CategoryRule::new(
                    "Cryptography (Primitives)",
                    &[r"src/crypto/", r"src/secp256k1/", r"src/minisketch/"],
                ),
                CategoryRule::new(
                    "Utilities (Shared Libs)",
                    &[
                        r"src/util/", r"src/support/", r"src/common/",
                        r"src/univalue/", r"src/compat/", r"src/ipc/",
                    ],
                ),
                CategoryRule::new("Tests (QA)", &[r"src/test/", r"test/", r"src/bench/"]),
                CategoryRule::new(
                    "Build & CI (DevOps)",
                    &[
                        r"Makefile", r"ci/", r"\.github/", r"build_msvc", r"configure\.ac",
                        r"CMakeLists\.txt", r"depends/", r"share/",
                    ],
                ),
                CategoryRule::new("Documentation", &[r"doc/", r".*\.md$"]),
            ],
        }
    }
}

/// A manual bridge between two author names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasPair {
    /// Name as it appears in commits
    pub name: String,
    /// Another spelling used by the same person
    pub alias: String,
}

impl AliasPair {
    /// Build a pair from string slices
    #[must_use]
    pub fn new(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: alias.to_string(),
        }
    }
}

/// Identity resolution inputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Shared/bot author names that must never link to an email
    pub ignored_names: Vec<String>,
    /// Shared/bot emails that must never link to a name (compared lower-cased)
    pub ignored_emails: Vec<String>,
    /// Name pairs bridged when both names were observed
    pub aliases: Vec<AliasPair>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            ignored_names: vec!["merge-script".into(), "Bitcoin Core Merge Script".into()],
            ignored_emails: vec![
                "90386131+bitcoin-core-merge-script@users.noreply.github.com".into(),
                "bitcoin-core-merge-script@users.noreply.github.com".into(),
            ],
            aliases: vec![
                AliasPair::new("Matt Corallo", "TheBlueMatt"),
                AliasPair::new("Jeff Garzik", "jgarzik"),
                AliasPair::new("Gavin Andresen", "gavinandresen"),
                AliasPair::new("Antoine Riard", "ariard"),
                AliasPair::new("Jim Posen", "jimpo"),
                AliasPair::new("Micha", "Michagogo"),
                AliasPair::new("João Barbosa", "promag"),
                AliasPair::new("MarcoFalke", "MacroFake"),
                AliasPair::new("Nils Schneider", "tcatm"),
                AliasPair::new("Jorge Timón", "jtimon"),
                AliasPair::new("Pieter Wuille", "sipa"),
                AliasPair::new("Wladimir J. van der Laan", "laanwj"),
                AliasPair::new("Jonas Schnelli", "jonasschnelli"),
                AliasPair::new("MarcoFalke", "Marco Falke"),
            ],
        }
    }
}

/// Default location of the config file
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "repocensus")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from disk and environment, falling back to defaults
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let mut builder = config::Config::builder();

    match path {
        Some(p) => {
            if !p.exists() {
                return Err(Error::Config(format!("config file not found: {}", p.display())));
            }
            builder = builder.add_source(config::File::from(p).required(true));
        }
        None => {
            if let Some(p) = default_path() {
                builder = builder.add_source(config::File::from(p.as_path()).required(false));
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut cfg: Config = settings.try_deserialize()?;
    cfg.identity.ignored_emails = cfg
        .identity
        .ignored_emails
        .iter()
        .map(|e| e.to_lowercase())
        .collect();
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.categories.fallback, "Core Libs");
        assert_eq!(cfg.categories.rules.len(), 11);
        assert_eq!(cfg.categories.rules[0].label, "Consensus (Domain Logic)");
        assert_eq!(cfg.identity.aliases.len(), 14);
        assert_eq!(cfg.ingest.read_buffer_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_load_file_overrides_sections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repocensus.toml");
        fs::write(
            &path,
            r#"
data_dir = "out"

[ingest]
timeout_secs = 42

[categories]
fallback = "Other"

[[categories.rules]]
label = "Crypto"
patterns = ["crypto/"]

[identity]
ignored_emails = ["Bot@CI"]
"#,
        )
        .unwrap();

        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("out"));
        assert_eq!(cfg.ingest.timeout_secs, 42);
        assert!(cfg.ingest.all_refs);
        assert_eq!(cfg.categories.fallback, "Other");
        assert_eq!(cfg.categories.rules, vec![CategoryRule::new("Crypto", &["crypto/"])]);
        assert_eq!(cfg.identity.ignored_emails, vec!["bot@ci".to_string()]);
        // untouched fields keep their defaults
        assert_eq!(cfg.identity.aliases.len(), 14);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let cfg = Config::default();
        let text = cfg.to_toml().unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
