//! Configuration for legacynator runs
//!
//! Configuration only feeds the orchestration layer: which project to build,
//! which build tool to call, what to leave out of discovery and which
//! Build/Pack properties to override. The rename rule is fixed and cannot be
//! configured.
//!
//! ## Configuration Files
//!
//! - `legacynator.toml`
//! - `.legacynatorrc.json`
//!
//! When no explicit path is given, both names are searched for starting from
//! the current directory and moving up the tree. Without any config file the
//! built-in defaults apply.
//!
//! ## Example Configuration
//!
//! ```toml
//! project = "moq4/src/Moq/Moq.csproj"
//! dotnet = "dotnet"
//! exclude = ["**/Generated/**"]
//!
//! [properties]
//! AssemblyName = "Moq.Legacy"
//! ```

mod legacynator_config;
mod loader;

pub use legacynator_config::{DEFAULT_DOTNET, DEFAULT_PROJECT, LegacynatorConfig};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
