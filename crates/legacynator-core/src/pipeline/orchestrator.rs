//! The full side-by-side build
//!
//! Order: clean, Restore, rewrite, Build, Pack. Each step must succeed
//! before the next begins; there are no retries.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

use super::rewrite::{FileReport, RewriteMode, rewrite_files};
use super::{BuildPhase, BuildProperties, BuildTool};
use crate::discovery::{BUILD_OUTPUT_DIRS, DefaultFileDiscovery, FileDiscovery};
use crate::error::LegacyError;
use crate::result::{Result, ResultExt};

/// Settings for one orchestrated run
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Project file to restore, rewrite, build and pack
    pub project: PathBuf,
    /// Overrides for Build and Pack
    pub properties: BuildProperties,
    /// Extra discovery excludes, relative to the project directory
    pub exclude: Vec<String>,
    /// Skip clean, Restore, Build and Pack; only rewrite sources
    pub skip_build: bool,
    /// Rewrite mode for the source step
    pub mode: RewriteMode,
}

impl OrchestratorOptions {
    pub fn new(project: impl Into<PathBuf>) -> Self {
        Self {
            project: project.into(),
            properties: BuildProperties::default(),
            exclude: Vec::new(),
            skip_build: false,
            mode: RewriteMode::Write,
        }
    }

    /// Directory holding the project file
    pub fn project_dir(&self) -> &Path {
        match self.project.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

/// What a finished run did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    /// Files that could not be read or written
    pub failed_files: usize,
    pub phases: Vec<BuildPhase>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn changed_files(&self) -> usize {
        self.files.iter().filter(|f| f.is_changed()).count()
    }

    pub fn rewrites(&self) -> usize {
        self.files.iter().map(|f| f.rewrites).sum()
    }
}

/// Drives a [`BuildTool`] and the rewrite step
pub struct Orchestrator {
    tool: Arc<dyn BuildTool>,
    options: OrchestratorOptions,
}

impl Orchestrator {
    pub fn new(tool: Arc<dyn BuildTool>, options: OrchestratorOptions) -> Self {
        Self { tool, options }
    }

    pub fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        if !self.options.project.is_file() {
            return Err(LegacyError::config_error(format!(
                "Project file not found: {}",
                self.options.project.display()
            )));
        }

        let build = !self.options.skip_build && self.options.mode == RewriteMode::Write;
        if build {
            self.clean()?;
            self.phase(BuildPhase::Restore, &BuildProperties::empty())
                .await?;
            summary.phases.push(BuildPhase::Restore);
        }

        self.rewrite_sources(&mut summary)?;

        if build {
            for phase in [BuildPhase::Build, BuildPhase::Pack] {
                self.phase(phase, &self.options.properties).await?;
                summary.phases.push(phase);
            }
        }

        summary.duration = start.elapsed();
        info!(
            "Finished in {:.2}s: {} reference(s) rewritten in {} file(s)",
            summary.duration.as_secs_f64(),
            summary.rewrites(),
            summary.changed_files()
        );
        Ok(summary)
    }

    /// Delete `obj/` and `bin/` next to the project
    fn clean(&self) -> Result<()> {
        for name in BUILD_OUTPUT_DIRS {
            let dir = self.options.project_dir().join(name);
            if dir.is_dir() {
                info!("Removing {}", dir.display());
                fs::remove_dir_all(&dir).map_err(|e| LegacyError::io_error(&dir, e))?;
            }
        }
        Ok(())
    }

    async fn phase(&self, phase: BuildPhase, properties: &BuildProperties) -> Result<()> {
        let outcome = self
            .tool
            .run(phase, &self.options.project, properties)
            .await?;

        if outcome.success {
            info!("{} succeeded", phase);
            Ok(())
        } else {
            error!(
                exit_code = ?outcome.exit_code,
                "{} failed, inspect {}",
                phase,
                outcome.binlog.display()
            );
            Err(LegacyError::build_failed(phase, outcome.binlog))
        }
    }

    fn rewrite_sources(&self, summary: &mut RunSummary) -> Result<()> {
        let discovery = DefaultFileDiscovery::new(self.options.project_dir())
            .with_excludes(self.options.exclude.as_slice())?;
        let files = discovery.discover_files()?;

        for result in rewrite_files(&files, self.options.mode) {
            match result.recoverable()? {
                Some(report) => summary.files.push(report),
                None => summary.failed_files += 1,
            }
        }

        // A partially rewritten project must not be built
        if summary.failed_files > 0
            && self.options.mode == RewriteMode::Write
            && !self.options.skip_build
        {
            return Err(LegacyError::internal_error(format!(
                "{} file(s) could not be rewritten",
                summary.failed_files
            )));
        }
        Ok(())
    }
}
