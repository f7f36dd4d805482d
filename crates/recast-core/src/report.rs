//! Per-file outcomes, the process-wide result, and the exit-status policy

use std::path::PathBuf;

use serde::Serialize;

/// Unified diff for one changed file
#[derive(Debug, Clone, Serialize)]
pub struct FileDiff {
    pub path: PathBuf,
    pub diff: String,
}

/// A failure recorded against a file (parse error or rule error)
#[derive(Debug, Clone, Serialize)]
pub struct SystemError {
    pub path: PathBuf,
    pub message: String,
}

/// Terminal classification of one file's processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcomeKind {
    Unchanged,
    Changed,
    Failed,
}

/// Everything the engine learned about one file
///
/// A file can carry both a partial diff and rule errors: a single failing
/// rule does not discard the mutations other rules applied successfully.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub diff: Option<FileDiff>,
    pub errors: Vec<SystemError>,
    pub warnings: Vec<String>,
    pub cache_hit: bool,
}

impl FileReport {
    pub fn unchanged(path: PathBuf, cache_hit: bool) -> Self {
        Self {
            path,
            diff: None,
            errors: Vec::new(),
            warnings: Vec::new(),
            cache_hit,
        }
    }

    pub fn failed(path: PathBuf, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            errors: vec![SystemError {
                path: path.clone(),
                message,
            }],
            path,
            diff: None,
            warnings: Vec::new(),
            cache_hit: false,
        }
    }

    pub fn outcome(&self) -> FileOutcomeKind {
        if !self.errors.is_empty() {
            FileOutcomeKind::Failed
        } else if self.diff.is_some() {
            FileOutcomeKind::Changed
        } else {
            FileOutcomeKind::Unchanged
        }
    }
}

/// Aggregated result of one engine run
#[derive(Debug, Default, Serialize)]
pub struct ProcessResult {
    /// Changed files with their unified diffs
    pub file_diffs: Vec<FileDiff>,
    /// Parse and rule failures, per file
    pub errors: Vec<SystemError>,
    /// Non-fatal diagnostics (non-convergence, skipped files)
    pub warnings: Vec<String>,
    /// Total files considered
    pub files_processed: usize,
    /// Files skipped via the change cache
    pub cache_hits: usize,
}

impl ProcessResult {
    /// Fold per-file reports into a process-wide result
    ///
    /// Reports are assumed to be in input order; folding preserves it so
    /// output is stable regardless of worker scheduling.
    pub fn from_reports(reports: Vec<FileReport>) -> Self {
        let mut result = ProcessResult {
            files_processed: reports.len(),
            ..Default::default()
        };

        for report in reports {
            if report.cache_hit {
                result.cache_hits += 1;
            }
            if let Some(diff) = report.diff {
                result.file_diffs.push(diff);
            }
            result.errors.extend(report.errors);
            result.warnings.extend(report.warnings);
        }

        result
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_diffs(&self) -> bool {
        !self.file_diffs.is_empty()
    }
}

/// Process exit status derived from the aggregated result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    /// No failures; changes (if any) were applied in place
    Success,
    /// Parse or rule errors present
    Failure,
    /// Dry-run found pending changes (used by CI to fail builds)
    ChangedCode,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::ChangedCode => 2,
        }
    }
}

/// Pure exit-status policy
pub fn resolve_exit_status(result: &ProcessResult, dry_run: bool) -> ExitStatus {
    if result.has_errors() {
        return ExitStatus::Failure;
    }
    if !dry_run {
        return ExitStatus::Success;
    }
    if result.has_diffs() {
        return ExitStatus::ChangedCode;
    }
    ExitStatus::Success
}
