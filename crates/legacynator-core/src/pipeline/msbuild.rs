//! `dotnet msbuild` as the build tool

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::{BuildOutcome, BuildPhase, BuildProperties, BuildTool};
use crate::error::LegacyError;
use crate::result::Result;

/// Spawns `dotnet msbuild` once per phase, writing a binary log next to the
/// project
#[derive(Debug, Clone)]
pub struct DotnetMsBuild {
    executable: String,
}

impl DotnetMsBuild {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// `<dir>/<project-stem>-<Phase>.binlog`
    pub fn binlog_path(project: &Path, phase: BuildPhase) -> PathBuf {
        let stem = project
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        let dir = project.parent().unwrap_or_else(|| Path::new(""));
        dir.join(format!("{stem}-{phase}.binlog"))
    }

    /// Arguments after the executable name
    pub fn arguments(
        project: &Path,
        phase: BuildPhase,
        properties: &BuildProperties,
        binlog: &Path,
    ) -> Vec<String> {
        let mut args = vec![
            "msbuild".to_string(),
            project.display().to_string(),
            format!("-t:{}", phase.target()),
        ];
        args.extend(properties.iter().map(|(k, v)| format!("-p:{k}={v}")));
        args.push(format!("-bl:{}", binlog.display()));
        args.push("-v:minimal".to_string());
        args
    }
}

impl Default for DotnetMsBuild {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DOTNET)
    }
}

#[async_trait]
impl BuildTool for DotnetMsBuild {
    async fn run(
        &self,
        phase: BuildPhase,
        project: &Path,
        properties: &BuildProperties,
    ) -> Result<BuildOutcome> {
        let binlog = Self::binlog_path(project, phase);
        let args = Self::arguments(project, phase, properties, &binlog);
        info!("Running {} target on {}", phase, project.display());
        debug!("{} {}", self.executable, args.join(" "));

        let status = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| LegacyError::tool_unavailable(&self.executable, e))?;

        Ok(BuildOutcome {
            success: status.success(),
            binlog,
            exit_code: status.code(),
        })
    }
}
