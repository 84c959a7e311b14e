//! Command implementations

use legacynator_core::pipeline::rewrite_files;
use legacynator_core::{
    ConfigLoader, DotnetMsBuild, LegacyError, Orchestrator, OrchestratorOptions, Result,
    RewriteMode, expand_inputs,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::output;

/// `legacynator run`
pub async fn run_command(
    project: Option<PathBuf>,
    no_build: bool,
    dry_run: bool,
    properties: Vec<(String, String)>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = ConfigLoader::load(config_path.as_deref(), None)?;
    debug!("Loaded configuration: {:?}", config);

    let mut build_properties = config.build_properties();
    for (key, value) in properties {
        build_properties.set(key, value);
    }

    let options = OrchestratorOptions {
        project: project.unwrap_or_else(|| config.project_or_default()),
        properties: build_properties,
        exclude: config.exclude.clone(),
        skip_build: no_build,
        mode: if dry_run {
            RewriteMode::Diff
        } else {
            RewriteMode::Write
        },
    };

    let tool = Arc::new(DotnetMsBuild::new(config.dotnet_or_default()));
    let summary = Orchestrator::new(tool, options).run().await?;

    if dry_run {
        for report in &summary.files {
            if let Some(diff) = &report.diff {
                output::print_diff(diff);
            }
        }
    }
    output::print_run_summary(&summary, dry_run);
    Ok(())
}

/// `legacynator rewrite`
pub async fn rewrite_command(
    paths: Vec<PathBuf>,
    check: bool,
    diff: bool,
    exclude: Vec<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    debug!("Running rewrite command on paths: {:?}", paths);
    let start_time = Instant::now();

    let config = ConfigLoader::load(config_path.as_deref(), None)?;
    let mut excludes = config.exclude.clone();
    excludes.extend(exclude);

    let files = expand_inputs(&paths, excludes.as_slice())?;
    if files.is_empty() {
        println!("No C# files found in specified paths.");
        return Ok(());
    }

    let mode = if diff {
        RewriteMode::Diff
    } else if check {
        RewriteMode::Check
    } else {
        RewriteMode::Write
    };

    let mut reports = Vec::with_capacity(files.len());
    let mut failures = 0;
    for result in rewrite_files(&files, mode) {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                output::print_error(&err);
                failures += 1;
            }
        }
    }

    if diff {
        for report in &reports {
            if let Some(text) = &report.diff {
                output::print_diff(text);
            }
        }
    }

    output::print_rewrite_summary(&reports, mode, start_time.elapsed());

    if failures > 0 {
        return Err(LegacyError::internal_error(format!(
            "{failures} file(s) could not be rewritten"
        )));
    }

    // Exit with error code if check mode and files would change
    if check && reports.iter().any(|r| r.is_changed()) {
        std::process::exit(1);
    }

    Ok(())
}
