//! Output formatting and reporting

use colored::*;
use legacynator_core::{FileReport, LegacyError, RewriteMode, RunSummary};
use std::time::Duration;

pub fn print_error(err: &LegacyError) {
    eprintln!("{} {}", "error:".red().bold(), err);
}

/// Print a unified diff, colouring added and removed lines
pub fn print_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            println!("{}", line.bold());
        } else if line.starts_with("@@") {
            println!("{}", line.cyan());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else if line.starts_with('-') {
            println!("{}", line.red());
        } else {
            println!("{line}");
        }
    }
}

/// Summary after `legacynator rewrite`
pub fn print_rewrite_summary(reports: &[FileReport], mode: RewriteMode, elapsed: Duration) {
    let changed: Vec<_> = reports.iter().filter(|r| r.is_changed()).collect();
    let rewrites: usize = changed.iter().map(|r| r.rewrites).sum();
    let diagnostics: usize = reports.iter().map(|r| r.diagnostics).sum();

    println!("\n{}", "Summary:".bold());
    println!("  Files checked: {}", reports.len());

    match mode {
        RewriteMode::Write if changed.is_empty() => {
            println!("{} Nothing to rewrite", "✓".green());
        }
        RewriteMode::Write => {
            println!(
                "{} Rewrote {} reference{} in {} file{}",
                "✓".green(),
                rewrites,
                plural(rewrites),
                changed.len(),
                plural(changed.len())
            );
        }
        RewriteMode::Check | RewriteMode::Diff if changed.is_empty() => {
            println!("{} No file references Moq outside Moq.Legacy", "✓".green());
        }
        RewriteMode::Check | RewriteMode::Diff => {
            for report in &changed {
                println!("  {} {}", "would rewrite".yellow(), report.path.display());
            }
            println!(
                "{} file{} would be rewritten ({} reference{})",
                changed.len().to_string().yellow(),
                plural(changed.len()),
                rewrites,
                plural(rewrites)
            );
        }
    }

    if diagnostics > 0 {
        println!(
            "  {} region{} could not be parsed and {} left as is",
            diagnostics.to_string().yellow(),
            plural(diagnostics),
            if diagnostics == 1 { "was" } else { "were" }
        );
    }

    println!("Completed in {}", utils::format_duration(elapsed));
}

/// Summary after `legacynator run`
pub fn print_run_summary(summary: &RunSummary, dry_run: bool) {
    println!("\n{}", "Summary:".bold());
    println!("  Files checked: {}", summary.files.len());
    println!(
        "  Files {}: {}",
        if dry_run { "to rewrite" } else { "rewritten" },
        summary.changed_files()
    );
    println!("  References: {}", summary.rewrites());
    if summary.failed_files > 0 {
        println!("  Skipped: {}", summary.failed_files.to_string().red());
    }
    for phase in &summary.phases {
        println!("  {} {}", "✓".green(), phase);
    }
    println!("Completed in {}", utils::format_duration(summary.duration));
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

pub mod utils {
    /// Format duration in human-readable format
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_ms = duration.as_millis();

        if total_ms < 1000 {
            format!("{total_ms}ms")
        } else if total_ms < 60_000 {
            format!("{:.1}s", total_ms as f64 / 1000.0)
        } else {
            let minutes = total_ms / 60_000;
            let seconds = (total_ms % 60_000) as f64 / 1000.0;
            format!("{minutes}m {seconds:.1}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::utils::format_duration;
    use std::time::Duration;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_millis(61_000)), "1m 1.0s");
    }
}
