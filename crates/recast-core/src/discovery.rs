//! Candidate file discovery
//!
//! Expands the configured paths into a deterministic, deduplicated, sorted
//! list of source files. The engine treats the result as an opaque ordered
//! sequence; include/exclude policy is applied here and nowhere else.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{RecastError, Result};

/// Default extension of the reference frontend
pub const SOURCE_EXTENSION: &str = "rcs";

/// Expands paths into candidate source files
pub struct FileDiscovery {
    extension: String,
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl FileDiscovery {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            extension: SOURCE_EXTENSION.to_string(),
            include: compile_patterns(include)?,
            exclude: compile_patterns(exclude)?,
        })
    }

    /// Discovery over a non-default extension
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Walk `paths` and return every matching file, sorted and deduplicated
    ///
    /// Files named directly are taken as-is (no extension filter); directories
    /// are walked recursively.
    pub fn discover(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut found = BTreeSet::new();

        for path in paths {
            if path.is_file() {
                if self.matches_patterns(path) {
                    found.insert(path.clone());
                }
                continue;
            }
            if !path.is_dir() {
                return Err(RecastError::config_error(format!(
                    "path does not exist: {}",
                    path.display()
                )));
            }

            for entry in WalkDir::new(path).follow_links(false) {
                let entry = entry.map_err(|e| {
                    RecastError::config_error(format!("failed to walk {}: {}", path.display(), e))
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let candidate = entry.path();
                if candidate.extension().and_then(|s| s.to_str()) != Some(self.extension.as_str())
                {
                    continue;
                }
                if self.matches_patterns(candidate) {
                    found.insert(candidate.to_path_buf());
                }
            }
        }

        let files: Vec<PathBuf> = found.into_iter().collect();
        tracing::debug!(count = files.len(), "discovered candidate files");
        Ok(files)
    }

    fn matches_patterns(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        if self.exclude.iter().any(|p| p.matches(&text)) {
            return false;
        }
        if self.include.is_empty() {
            return true;
        }
        self.include.iter().any(|p| p.matches(&text))
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<glob::Pattern>> {
    patterns
        .iter()
        .map(|raw| {
            glob::Pattern::new(raw)
                .map_err(|e| RecastError::config_error(format!("invalid glob '{raw}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn walks_directories_and_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.rcs");
        let b = touch(dir.path(), "nested/b.rcs");
        touch(dir.path(), "nested/readme.md");

        let discovery = FileDiscovery::new(&[], &[]).unwrap();
        let files = discovery.discover(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![a, b]);
    }

    #[test]
    fn exclude_patterns_win() {
        let dir = tempfile::tempdir().unwrap();
        let keep = touch(dir.path(), "keep.rcs");
        touch(dir.path(), "vendor/skip.rcs");

        let discovery = FileDiscovery::new(&[], &["*vendor*".to_string()]).unwrap();
        let files = discovery.discover(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![keep]);
    }

    #[test]
    fn direct_files_bypass_extension_filter() {
        let dir = tempfile::tempdir().unwrap();
        let odd = touch(dir.path(), "script.txt");

        let discovery = FileDiscovery::new(&[], &[]).unwrap();
        let files = discovery.discover(&[odd.clone()]).unwrap();
        assert_eq!(files, vec![odd]);
    }

    #[test]
    fn missing_path_is_an_error() {
        let discovery = FileDiscovery::new(&[], &[]).unwrap();
        assert!(
            discovery
                .discover(&[PathBuf::from("/definitely/not/here")])
                .is_err()
        );
    }

    #[test]
    fn output_is_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let a = touch(dir.path(), "a.rcs");
        let b = touch(dir.path(), "b.rcs");

        let discovery = FileDiscovery::new(&[], &[]).unwrap();
        let files = discovery
            .discover(&[dir.path().to_path_buf(), a.clone()])
            .unwrap();
        assert_eq!(files, vec![a, b]);
    }
}
