// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Config command - show the effective configuration

use crate::config::{self, Config};
use anyhow::{Context, Result};

/// Print the whole configuration, one dotted key, or the default file path
pub fn run(cfg: &Config, key: Option<&str>, path: bool) -> Result<()> {
    if path {
        match config::default_path() {
            Some(p) => println!("{}", p.display()),
            None => anyhow::bail!("No configuration directory available on this platform"),
        }
        return Ok(());
    }

    match key {
        None => print!("{}", cfg.to_toml()?),
        Some(key) => println!("{}", lookup(cfg, key)?),
    }
    Ok(())
}

/// Render the value at a dotted key such as `ingest.timeout_secs`
pub fn lookup(cfg: &Config, key: &str) -> Result<String> {
    let root = toml::Value::try_from(cfg).context("Failed to serialize configuration")?;
    let value = key
        .split('.')
        .try_fold(&root, |node, part| node.get(part))
        .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;

    Ok(match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_scalars_and_missing_keys() {
        let cfg = Config::default();
        assert_eq!(lookup(&cfg, "categories.fallback").unwrap(), "Core Libs");
        assert_eq!(lookup(&cfg, "ingest.timeout_secs").unwrap(), "3600");
        assert_eq!(lookup(&cfg, "ingest.all_refs").unwrap(), "true");
        assert!(lookup(&cfg, "ingest.nope").is_err());
    }
}
