// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Path categorization
//!
//! An ordered table of (label, patterns). Patterns are case-insensitive
//! regexes searched anywhere in the path; the first rule with a hit wins and
//! later rules are never consulted. Paths matching nothing get the fallback
//! label.

use crate::config::{CategoryConfig, CategoryRule};
use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
struct CompiledRule {
    label: String,
    patterns: Vec<Regex>,
}

/// Maps file paths to category labels
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    rules: Vec<CompiledRule>,
    fallback: String,
}

impl CategoryClassifier {
    /// Compile a rule table
    pub fn new(rules: &[CategoryRule], fallback: &str) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let patterns = rule
                    .patterns
                    .iter()
                    .map(|pattern| {
                        RegexBuilder::new(pattern)
                            .case_insensitive(true)
                            .build()
                            .map_err(|source| Error::InvalidPattern {
                                category: rule.label.clone(),
                                pattern: pattern.clone(),
                                source,
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledRule {
                    label: rule.label.clone(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            fallback: fallback.to_string(),
        })
    }

    /// Compile the `[categories]` section of the configuration
    pub fn from_config(config: &CategoryConfig) -> Result<Self> {
        Self::new(&config.rules, &config.fallback)
    }

    /// Category label for `path`
    #[must_use]
    pub fn classify(&self, path: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|re| re.is_match(path)))
            .map_or(self.fallback.as_str(), |rule| rule.label.as_str())
    }

    /// Label returned when nothing matches
    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// All labels in rule order, fallback last
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.rules
            .iter()
            .map(|r| r.label.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
            .collect()
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        let config = CategoryConfig::default();
        // built-in table is known to compile, see test_default_table_compiles
        Self::from_config(&config).unwrap_or_else(|_| Self {
            rules: Vec::new(),
            fallback: config.fallback,
        })
    }
}
