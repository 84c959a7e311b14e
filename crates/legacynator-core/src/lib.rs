//! Legacynator Core
//!
//! Renames the `Moq` namespace to `Moq.Legacy` throughout a C# project so the
//! renamed copy can be built and packed side by side with the original
//! library. This crate provides the lossless C# syntax tree, the rename
//! itself and the build orchestration around it.

pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod rename;
pub mod result;

// Re-export commonly used types
pub use config::{ConfigLoader, DEFAULT_PROJECT, LegacynatorConfig};
pub use cst::{CsSyntaxKind, CsSyntaxNode, ParsedFile, parse_csharp};
pub use discovery::{DefaultFileDiscovery, FileDiscovery, expand_inputs};
pub use error::{ErrorKind, LegacyError};
pub use pipeline::{
    BuildOutcome, BuildPhase, BuildProperties, BuildTool, DotnetMsBuild, FileReport, FileStatus,
    Orchestrator, OrchestratorOptions, RewriteMode, RunSummary,
};
pub use rename::{
    LegacyRewriter, QualifierMatcher, RenameRule, RewriteEvent, RewriteKind, RewriteOutput,
    rewrite_source,
};
pub use result::{Result, ResultExt};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("legacynator=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
