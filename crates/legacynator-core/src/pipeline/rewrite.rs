//! Per-file rewrite step
//!
//! Each file is read, rewritten and (depending on the mode) written back on
//! its own rayon task. Workers share nothing; every tree lives and dies on
//! the task that parsed it.

use rayon::prelude::*;
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::LegacyError;
use crate::rename::rewrite_source;
use crate::result::Result;

/// What to do with a rewritten file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteMode {
    /// Write changed files back
    #[default]
    Write,
    /// Only report which files would change
    Check,
    /// Compute a unified diff instead of writing
    Diff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Unchanged,
    /// Changed and written back
    Rewritten,
    /// Changed, but the mode does not write
    WouldChange,
}

/// Outcome for one source file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Number of rewritten references
    pub rewrites: usize,
    /// Lexer and parser diagnostics seen while reading the file
    pub diagnostics: usize,
    /// Unified diff, in [`RewriteMode::Diff`] only
    pub diff: Option<String>,
}

impl FileReport {
    pub fn is_changed(&self) -> bool {
        self.status != FileStatus::Unchanged
    }
}

/// Rewrite one file
pub fn rewrite_file(path: &Path, mode: RewriteMode) -> Result<FileReport> {
    let original = fs::read_to_string(path).map_err(|e| LegacyError::io_error(path, e))?;
    let output = rewrite_source(&original);

    let diagnostics = output.lexer_errors.len() + output.parse_errors.len();
    if !output.parse_errors.is_empty() {
        warn!(
            "{}: {} region(s) could not be parsed and were left as is",
            path.display(),
            output.parse_errors.len()
        );
    }

    let changed = output.text != original;
    let mut diff = None;
    let status = match (changed, mode) {
        (false, _) => FileStatus::Unchanged,
        (true, RewriteMode::Write) => {
            fs::write(path, &output.text).map_err(|e| LegacyError::io_error(path, e))?;
            FileStatus::Rewritten
        }
        (true, RewriteMode::Check) => FileStatus::WouldChange,
        (true, RewriteMode::Diff) => {
            diff = Some(render_diff(path, &original, &output.text));
            FileStatus::WouldChange
        }
    };

    debug!(
        "{}: {:?}, {} reference(s) rewritten",
        path.display(),
        status,
        output.rewrite_count()
    );

    Ok(FileReport {
        path: path.to_path_buf(),
        status,
        rewrites: output.rewrite_count(),
        diagnostics,
        diff,
    })
}

/// Rewrite many files in parallel, keeping input order in the results
pub fn rewrite_files(paths: &[PathBuf], mode: RewriteMode) -> Vec<Result<FileReport>> {
    paths
        .par_iter()
        .map(|path| rewrite_file(path, mode))
        .collect()
}

/// Unified diff between two versions of a file
pub fn render_diff(path: &Path, original: &str, modified: &str) -> String {
    let name = path.display().to_string();
    TextDiff::from_lines(original, modified)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_write_mode_updates_changed_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let changed = write(temp_dir.path(), "Mock.cs", "using Moq;\n");
        let untouched = write(temp_dir.path(), "Other.cs", "using System;\n");

        let report = rewrite_file(&changed, RewriteMode::Write).unwrap();
        assert_eq!(report.status, FileStatus::Rewritten);
        assert_eq!(report.rewrites, 1);
        assert_eq!(fs::read_to_string(&changed).unwrap(), "using Moq.Legacy;\n");

        let report = rewrite_file(&untouched, RewriteMode::Write).unwrap();
        assert_eq!(report.status, FileStatus::Unchanged);
        assert!(!report.is_changed());
    }

    #[test]
    fn test_check_mode_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "Mock.cs", "namespace Moq { }\n");

        let report = rewrite_file(&path, RewriteMode::Check).unwrap();
        assert_eq!(report.status, FileStatus::WouldChange);
        assert!(report.diff.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), "namespace Moq { }\n");
    }

    #[test]
    fn test_diff_mode() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "Mock.cs", "using System;\nusing Moq;\n");

        let report = rewrite_file(&path, RewriteMode::Diff).unwrap();
        let diff = report.diff.unwrap();
        assert!(diff.contains("-using Moq;\n"));
        assert!(diff.contains("+using Moq.Legacy;\n"));
        assert!(diff.contains(" using System;\n"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "using System;\nusing Moq;\n");
    }

    #[test]
    fn test_bom_survives_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "Mock.cs", "\u{feff}using Moq;\r\n");

        rewrite_file(&path, RewriteMode::Write).unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes, b"\xEF\xBB\xBFusing Moq.Legacy;\r\n");
    }

    #[test]
    fn test_rewrite_files_keeps_order_and_reports_errors() {
        let temp_dir = TempDir::new().unwrap();
        let first = write(temp_dir.path(), "A.cs", "using Moq;");
        let missing = temp_dir.path().join("Missing.cs");
        let last = write(temp_dir.path(), "B.cs", "using System;");

        let results = rewrite_files(&[first.clone(), missing, last.clone()], RewriteMode::Write);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().path, first);
        assert!(matches!(results[1], Err(LegacyError::IoError { .. })));
        assert_eq!(results[2].as_ref().unwrap().path, last);
    }
}
