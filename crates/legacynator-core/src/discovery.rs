//! Source document discovery
//!
//! Finds the `.cs` files a project compiles: everything under the project
//! directory except build output (`obj/`, `bin/`) and configured excludes.

use crate::{LegacyError, Result};
use glob::{Pattern, glob};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Directories holding build output, never descended into
pub const BUILD_OUTPUT_DIRS: &[&str] = &["obj", "bin"];

const SOURCE_EXTENSION: &str = "cs";

/// Trait for file discovery functionality
pub trait FileDiscovery {
    /// All source documents, sorted
    fn discover_files(&self) -> Result<Vec<PathBuf>>;

    /// Check if a file should be included
    fn should_include(&self, path: &Path) -> bool;
}

/// Walks a directory tree for C# sources
#[derive(Debug, Clone)]
pub struct DefaultFileDiscovery {
    /// Root directory for file discovery
    pub root_dir: PathBuf,
    exclude: Vec<Pattern>,
}

impl DefaultFileDiscovery {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            exclude: Vec::new(),
        }
    }

    /// Add glob patterns (relative to the root) to leave out
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let compiled = Pattern::new(pattern).map_err(|e| {
                LegacyError::discovery_error(format!("Invalid exclude pattern '{pattern}': {e}"))
            })?;
            self.exclude.push(compiled);
        }
        Ok(self)
    }

    /// Check if a path matches any exclude pattern
    fn is_excluded(&self, path: &Path) -> bool {
        let relative_path = path.strip_prefix(&self.root_dir).unwrap_or(path);
        let path_str = relative_path.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|pattern| pattern.matches(&path_str))
    }
}

fn is_build_output(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| BUILD_OUTPUT_DIRS.contains(&name))
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

impl FileDiscovery for DefaultFileDiscovery {
    fn discover_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root_dir.is_dir() {
            return Err(LegacyError::discovery_error(format!(
                "Not a directory: {}",
                self.root_dir.display()
            )));
        }
        info!("Discovering C# sources in {}", self.root_dir.display());

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_build_output(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_file() && self.should_include(entry.path()) {
                files.push(entry.into_path());
            }
        }

        info!("Discovered {} C# files", files.len());
        debug!("Files: {:?}", files);
        Ok(files)
    }

    fn should_include(&self, path: &Path) -> bool {
        if !has_source_extension(path) || self.is_excluded(path) {
            return false;
        }
        let relative_path = path.strip_prefix(&self.root_dir).unwrap_or(path);
        !relative_path.components().any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|name| BUILD_OUTPUT_DIRS.contains(&name))
        })
    }
}

/// Expand command-line inputs into source files
///
/// Each input may be a file (taken as is), a directory (walked like a
/// project directory) or a glob pattern.
pub fn expand_inputs<S: AsRef<str>>(inputs: &[PathBuf], exclude: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = BTreeSet::new();

    for input in inputs {
        if input.is_file() {
            files.insert(input.clone());
        } else if input.is_dir() {
            let discovery = DefaultFileDiscovery::new(input).with_excludes(exclude)?;
            files.extend(discovery.discover_files()?);
        } else {
            let pattern = input.to_string_lossy();
            let entries = glob(&pattern).map_err(|e| {
                LegacyError::discovery_error(format!("Invalid glob pattern '{pattern}': {e}"))
            })?;
            let before = files.len();
            for entry in entries {
                match entry {
                    Ok(path) if path.is_file() && has_source_extension(&path) => {
                        files.insert(path);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Glob entry error: {}", e),
                }
            }
            if files.len() == before {
                return Err(LegacyError::discovery_error(format!(
                    "No C# files match '{}'",
                    input.display()
                )));
            }
        }
    }

    Ok(files.into_iter().collect())
}
