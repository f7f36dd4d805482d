//! Run configuration and loader
//!
//! A `Configuration` is assembled before engine start: defaults, then an
//! optional `recast.toml` / `recast.json`, then CLI overrides applied by the
//! caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::passes::DEFAULT_MAX_PASSES;
use crate::rule::{LanguageLevel, LATEST_LEVEL};
use crate::{RecastError, Result};

/// Per-rule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    /// Whether the rule is registered at all
    pub enabled: bool,
    /// Rule-specific construction parameters
    pub params: BTreeMap<String, serde_json::Value>,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            params: BTreeMap::new(),
        }
    }
}

/// Engine run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Files or directories to process
    pub paths: Vec<PathBuf>,
    /// Report changes without writing them
    pub dry_run: bool,
    /// Drop the change cache before running
    pub clear_cache: bool,
    /// Fixed-point pass cap per file
    pub max_passes: usize,
    /// Worker threads (None: one per core)
    pub threads: Option<usize>,
    /// Target language feature level; rules above it are skipped
    pub language_level: LanguageLevel,
    /// Directory holding the persistent change cache
    pub cache_dir: Option<PathBuf>,
    /// Include globs (empty: everything with a known extension)
    pub include: Vec<String>,
    /// Exclude globs
    pub exclude: Vec<String>,
    /// Whole-run timeout in seconds; on expiry no further files are enqueued
    pub timeout_secs: Option<u64>,
    /// Per-rule enable/parameter overrides, keyed by rule name
    pub rules: BTreeMap<String, RuleOptions>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            dry_run: false,
            clear_cache: false,
            max_passes: DEFAULT_MAX_PASSES,
            threads: None,
            language_level: LATEST_LEVEL,
            cache_dir: None,
            include: Vec::new(),
            exclude: Vec::new(),
            timeout_secs: None,
            rules: BTreeMap::new(),
        }
    }
}

impl Configuration {
    /// Options for a rule, falling back to defaults when unconfigured
    pub fn rule_options(&self, name: &str) -> RuleOptions {
        self.rules.get(name).cloned().unwrap_or_default()
    }

    /// Whether a rule is enabled
    pub fn rule_enabled(&self, name: &str) -> bool {
        self.rules.get(name).map(|o| o.enabled).unwrap_or(true)
    }

    /// Path of the persistent cache store, if caching is configured
    pub fn cache_store_path(&self) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join("recast-cache.json"))
    }
}

/// Well-known configuration file names, tried in order
const CONFIG_FILE_NAMES: [&str; 2] = ["recast.toml", "recast.json"];

/// Loads `Configuration` from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from an explicit file, or search `dir` for a well-known name
    ///
    /// No configuration file at all is fine; defaults apply.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Configuration> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Self::load_file(&candidate);
            }
        }

        tracing::debug!(dir = %dir.display(), "no configuration file found; using defaults");
        Ok(Configuration::default())
    }

    fn load_file(path: &Path) -> Result<Configuration> {
        let raw =
            std::fs::read_to_string(path).map_err(|e| RecastError::io_error(path, e))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&raw).map_err(|e| {
                RecastError::config_error(format!(
                    "failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?
        } else {
            toml::from_str(&raw).map_err(|e| {
                RecastError::config_error(format!(
                    "failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?
        };

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}
