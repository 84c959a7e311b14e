//! Legacynator CLI
//!
//! Command-line interface for producing a side-by-side `Moq.Legacy` build

mod commands;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use legacynator_core::{LegacyError, Result, init_tracing};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "legacynator")]
#[command(about = "Rename the Moq namespace to Moq.Legacy and build a side-by-side package")]
#[command(version = legacynator_core::VERSION)]
#[command(
    long_about = "Legacynator rewrites every reference to the Moq namespace in a C# project to\n\
Moq.Legacy, then builds and packs the result so it can be installed next to the\n\
original library.\n\
\n\
Examples:\n  \
legacynator run                          # Restore, rewrite, build and pack the default project\n  \
legacynator run src/Moq/Moq.csproj       # Same for another project\n  \
legacynator run --no-build --dry-run     # Show what would be rewritten\n  \
legacynator rewrite --check src/         # Fail if any file still references Moq"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (legacynator.toml/.legacynatorrc.json)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, restore, rewrite, build and pack a project
    Run {
        /// Project file
        #[arg(help = "Project file (default: moq4/src/Moq/Moq.csproj or the configured project)")]
        project: Option<PathBuf>,

        /// Only rewrite sources, skip clean/Restore/Build/Pack
        #[arg(long, help = "Rewrite sources without running the build")]
        no_build: bool,

        /// Print a diff instead of writing files
        #[arg(long, help = "Show the rewrite as a diff without writing files or building")]
        dry_run: bool,

        /// Build/Pack property overrides
        #[arg(
            short = 'p',
            long = "property",
            help = "Override a Build/Pack property (KEY=VALUE, can be used multiple times)",
            value_parser = parse_property
        )]
        properties: Vec<(String, String)>,
    },

    /// Rewrite C# files or directories in place
    Rewrite {
        /// Files, directories or glob patterns
        #[arg(required = true, help = "Files, directories or glob patterns to rewrite")]
        paths: Vec<PathBuf>,

        /// Check only, exit non-zero if any file would change
        #[arg(long, help = "Exit with non-zero code if any file would be rewritten")]
        check: bool,

        /// Print the rewrite as a unified diff
        #[arg(long, help = "Show a diff instead of writing files")]
        diff: bool,

        /// Exclude patterns (glob syntax)
        #[arg(
            long,
            help = "Exclude files matching pattern (can be used multiple times)"
        )]
        exclude: Vec<String>,
    },

    /// Show version information
    Version {
        /// Show detailed version information
        #[arg(long)]
        detailed: bool,
    },
}

/// Parse a property override in the format KEY=VALUE
fn parse_property(s: &str) -> std::result::Result<(String, String), String> {
    legacynator_core::BuildProperties::parse_assignment(s)
        .ok_or_else(|| format!("Invalid property '{s}'. Expected 'KEY=VALUE'"))
}

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .map_err(LegacyError::from)?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize colored output
    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "legacynator=error",
        1 => "legacynator=warn",
        2 => "legacynator=info",
        3 => "legacynator=debug",
        _ => "legacynator=trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    // Set thread pool size if specified
    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        std::process::exit(1);
    }

    match run_command(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            output::print_error(&e);
            std::process::exit(1);
        }
    }
}

async fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Run {
            project,
            no_build,
            dry_run,
            properties,
        }) => commands::run_command(project, no_build, dry_run, properties, cli.config).await,

        Some(Commands::Rewrite {
            paths,
            check,
            diff,
            exclude,
        }) => commands::rewrite_command(paths, check, diff, exclude, cli.config).await,

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("legacynator {}", legacynator_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                println!(
                    "  Rename rule: Moq -> {}",
                    legacynator_core::RenameRule::MOQ_LEGACY.target()
                );
            } else {
                println!("{}", legacynator_core::VERSION);
            }
            Ok(())
        }

        None => {
            // No subcommand provided, show help
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
