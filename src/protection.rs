//! # Resource Protection
//!
//! Keeps critical resources out of zombie reports so always-on
//! infrastructure never shows up as a cleanup candidate.
//!
//! Protection criteria, checked in priority order:
//! 1. Operator exclusions (false-positive feedback), by resource id.
//! 2. Tag values (Environment=production, Critical=true, ...).
//! 3. Name patterns (prod-*, *-cache, database, monitoring, ...).
//!
//! - Loads from TOML config (tags + patterns + exclusions).
//! - Includes a built-in `default_seed()` used when no config is found.

use std::{collections::HashMap, fs, path::Path};

use regex::Regex;
use serde::Deserialize;

use crate::features::RawResourceRecord;

/// Raw protection rules, as read from config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtectionConfig {
    /// Tag key → protected values (lowercase comparison).
    #[serde(default)]
    pub protected_tags: HashMap<String, Vec<String>>,
    /// Name regexes matched against the lowercased Name tag.
    #[serde(default)]
    pub name_patterns: Vec<String>,
    /// Resource ids excluded by operators.
    #[serde(default)]
    pub excluded_ids: Vec<String>,
}

impl ProtectionConfig {
    /// Load from a TOML file, falling back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s).unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    /// Built-in seed covering the usual always-on suspects.
    pub fn default_seed() -> Self {
        let mut protected_tags = HashMap::new();
        for (k, vs) in [
            ("Environment", vec!["production", "prod", "live"]),
            ("Critical", vec!["true", "yes", "1"]),
            ("AlwaysOn", vec!["true", "yes", "1"]),
            ("Protected", vec!["true", "yes", "1"]),
            ("Tier", vec!["production", "critical"]),
        ] {
            protected_tags.insert(
                k.to_string(),
                vs.into_iter().map(str::to_string).collect(),
            );
        }

        let name_patterns = [
            r"prod[-_]",
            r"production[-_]",
            r"[-_]prod$",
            r"[-_]production$",
            r"cache",
            r"database",
            r"db[-_]",
            r"master",
            r"primary",
            r"monitoring",
            r"prometheus",
            r"grafana",
            r"elasticsearch",
            r"kibana",
            r"backup",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            protected_tags,
            name_patterns,
            excluded_ids: Vec::new(),
        }
    }
}

/// Compiled rules; regexes are built once at load time.
#[derive(Debug)]
pub struct ProtectionEngine {
    cfg: ProtectionConfig,
    patterns: Vec<Regex>,
}

impl ProtectionEngine {
    pub fn new(cfg: ProtectionConfig) -> anyhow::Result<Self> {
        let patterns = cfg
            .name_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| anyhow::anyhow!("protection pattern `{}`: {}", p, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { cfg, patterns })
    }

    pub fn from_seed() -> Self {
        Self::new(ProtectionConfig::default_seed()).expect("seed patterns compile")
    }

    /// Check whether a resource is protected; returns the reason if so.
    pub fn is_protected(&self, record: &RawResourceRecord) -> Option<String> {
        // 1) Operator exclusions take priority.
        if let Some(id) = record.id.as_deref() {
            if self.cfg.excluded_ids.iter().any(|x| x == id) {
                return Some("operator-marked as protected (false positive feedback)".to_string());
            }
        }

        // 2) Tag-based protection.
        for (key, value) in &record.tags {
            if let Some(protected_values) = self.cfg.protected_tags.get(key) {
                let v = value.trim().to_ascii_lowercase();
                if protected_values.iter().any(|pv| pv.eq_ignore_ascii_case(&v)) {
                    return Some(format!("protected by tag: {}={}", key, value));
                }
            }
        }

        // 3) Name pattern matching.
        if let Some(name) = record.name() {
            let lower = name.to_ascii_lowercase();
            for (re, raw) in self.patterns.iter().zip(&self.cfg.name_patterns) {
                if re.is_match(&lower) {
                    return Some(format!("protected by name pattern: matches '{}'", raw));
                }
            }
        }

        None
    }
}
