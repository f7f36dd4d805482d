//! Persistent change cache
//!
//! Maps (normalized path, content fingerprint, rule-set fingerprint) to a
//! "this input already converged to no changes" marker, so untouched files
//! are skipped on subsequent runs. Only the nothing-to-do case is ever
//! cached; a stored transformation is never replayed. The store is a single
//! JSON document; a corrupt or unreadable store degrades to a universal
//! cache miss, never a crash.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::rule::RuleSetFingerprint;

/// Hex-encoded sha256 of a file's bytes
///
/// Stable across processes and machines; the persistent cache depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn of_str(text: &str) -> Self {
        Self::of_bytes(text.as_bytes())
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

/// One persisted cache record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content_fingerprint: String,
    pub ruleset_fingerprint: String,
    pub timestamp: u64,
}

/// Shared, synchronized change cache handle
///
/// Opened at run start and flushed at run end; workers hit the in-memory map
/// concurrently with last-writer-wins semantics per key (each key is a pure
/// function of content and configuration, so there is no stale-overwrite
/// hazard).
pub struct ChangeCache {
    entries: DashMap<String, CacheEntry>,
    store_path: Option<PathBuf>,
    dirty: AtomicBool,
}

impl ChangeCache {
    /// Cache with no backing store (tests, `--no-cache` runs)
    pub fn in_memory() -> Self {
        Self {
            entries: DashMap::new(),
            store_path: None,
            dirty: AtomicBool::new(false),
        }
    }

    /// Open a cache backed by the given file
    ///
    /// Never fails: a missing store starts empty, a corrupt one is discarded
    /// with a warning.
    pub fn open(store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();
        let entries = DashMap::new();

        match std::fs::read_to_string(&store_path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, CacheEntry>>(&raw) {
                Ok(parsed) => {
                    for (path, entry) in parsed {
                        entries.insert(path, entry);
                    }
                    tracing::debug!(
                        store = %store_path.display(),
                        entries = entries.len(),
                        "loaded change cache"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        store = %store_path.display(),
                        %err,
                        "change cache is corrupt; treating every file as a miss"
                    );
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(
                    store = %store_path.display(),
                    %err,
                    "change cache is unreadable; treating every file as a miss"
                );
            }
        }

        Self {
            entries,
            store_path: Some(store_path),
            dirty: AtomicBool::new(false),
        }
    }

    /// Check whether this exact input under this exact rule set is already
    /// known to need no changes
    pub fn is_unchanged(
        &self,
        path: &Path,
        content: &ContentFingerprint,
        rule_set: &RuleSetFingerprint,
    ) -> bool {
        self.entries
            .get(&normalize_path(path))
            .map(|entry| {
                entry.content_fingerprint == content.as_hex()
                    && entry.ruleset_fingerprint == rule_set.as_hex()
            })
            .unwrap_or(false)
    }

    /// Record a no-op convergence for this input
    pub fn mark_unchanged(
        &self,
        path: &Path,
        content: &ContentFingerprint,
        rule_set: &RuleSetFingerprint,
    ) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.entries.insert(
            normalize_path(path),
            CacheEntry {
                content_fingerprint: content.as_hex().to_string(),
                ruleset_fingerprint: rule_set.as_hex().to_string(),
                timestamp,
            },
        );
        self.dirty.store(true, Ordering::Relaxed);
    }

    /// Drop the entry for one path
    pub fn invalidate(&self, path: &Path) {
        if self.entries.remove(&normalize_path(path)).is_some() {
            self.dirty.store(true, Ordering::Relaxed);
        }
    }

    /// Drop every entry (forced clear, or rule-set change detected upstream)
    pub fn clear(&self) {
        if !self.entries.is_empty() {
            self.dirty.store(true, Ordering::Relaxed);
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the cache back to its store
    ///
    /// A write failure is logged and swallowed; it must not fail the run.
    pub fn flush(&self) {
        let Some(store_path) = &self.store_path else {
            return;
        };
        if !self.dirty.swap(false, Ordering::Relaxed) {
            return;
        }

        // BTreeMap for a stable on-disk ordering.
        let snapshot: BTreeMap<String, CacheEntry> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let write = || -> std::io::Result<()> {
            if let Some(dir) = store_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let json = serde_json::to_string_pretty(&snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            std::fs::write(store_path, json)
        };

        if let Err(err) = write() {
            tracing::warn!(
                store = %store_path.display(),
                %err,
                "failed to persist change cache"
            );
        }
    }
}

fn normalize_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
