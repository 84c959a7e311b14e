//! Restore → rewrite → Build → Pack
//!
//! The build steps are opaque calls into a [`BuildTool`]; only the rewrite
//! step runs in process. Phases run strictly one after another and the first
//! failure ends the run.

pub mod msbuild;
pub mod orchestrator;
pub mod rewrite;

pub use msbuild::DotnetMsBuild;
pub use orchestrator::{Orchestrator, OrchestratorOptions, RunSummary};
pub use rewrite::{FileReport, FileStatus, RewriteMode, render_diff, rewrite_file, rewrite_files};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::result::Result;

/// An MSBuild target invoked on the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhase {
    Restore,
    Build,
    Pack,
}

impl BuildPhase {
    /// MSBuild target name
    pub fn target(self) -> &'static str {
        match self {
            BuildPhase::Restore => "Restore",
            BuildPhase::Build => "Build",
            BuildPhase::Pack => "Pack",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

/// MSBuild global properties passed as `-p:Key=Value`
///
/// The default set gives the package its side-by-side identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProperties {
    values: BTreeMap<String, String>,
}

impl BuildProperties {
    /// Overrides applied to Build and Pack
    pub const DEFAULTS: &'static [(&'static str, &'static str)] = &[
        ("AssemblyName", "Moq.Legacy"),
        ("RootNamespace", "Moq.Legacy"),
        ("PackageId", "Moq.Legacy"),
        ("Title", "Moq.Legacy: use v4 API SxS with v5"),
    ];

    /// No properties at all, as used for Restore
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a `KEY=VALUE` command-line override
    pub fn parse_assignment(text: &str) -> Option<(String, String)> {
        let (key, value) = text.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), value.to_string()))
    }
}

impl Default for BuildProperties {
    fn default() -> Self {
        let mut properties = Self::empty();
        for (key, value) in Self::DEFAULTS {
            properties.set(*key, *value);
        }
        properties
    }
}

/// How one build phase ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
    /// Binary log written by the phase
    pub binlog: PathBuf,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

/// Runs one MSBuild target on a project
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Returns `Err` only when the tool could not be run; a failed build is
    /// an `Ok` outcome with `success == false`.
    async fn run(
        &self,
        phase: BuildPhase,
        project: &Path,
        properties: &BuildProperties,
    ) -> Result<BuildOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_properties() {
        let properties = BuildProperties::default();
        assert_eq!(properties.get("AssemblyName"), Some("Moq.Legacy"));
        assert_eq!(
            properties.get("Title"),
            Some("Moq.Legacy: use v4 API SxS with v5")
        );
        assert!(BuildProperties::empty().is_empty());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            BuildProperties::parse_assignment("PackageId=Moq.Old"),
            Some(("PackageId".to_string(), "Moq.Old".to_string()))
        );
        assert_eq!(
            BuildProperties::parse_assignment("Title=a=b"),
            Some(("Title".to_string(), "a=b".to_string()))
        );
        assert_eq!(BuildProperties::parse_assignment("=x"), None);
        assert_eq!(BuildProperties::parse_assignment("novalue"), None);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(BuildPhase::Pack.to_string(), "Pack");
    }
}
