//! Configuration file schema

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LegacyError;
use crate::pipeline::BuildProperties;
use crate::result::Result;

/// Project file used when neither the command line nor a config names one
pub const DEFAULT_PROJECT: &str = "moq4/src/Moq/Moq.csproj";

/// Build tool executable used when not configured
pub const DEFAULT_DOTNET: &str = "dotnet";

/// Contents of `legacynator.toml` / `.legacynatorrc.json`
///
/// Every field is optional; anything left out falls back to the built-in
/// default.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LegacynatorConfig {
    /// Project file to restore, rewrite, build and pack
    pub project: Option<PathBuf>,

    /// Build tool executable
    pub dotnet: Option<String>,

    /// Extra glob patterns excluded from source discovery
    pub exclude: Vec<String>,

    /// Build/Pack property overrides, merged over the defaults
    pub properties: BTreeMap<String, String>,
}

impl LegacynatorConfig {
    /// Load a config file, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LegacyError::io_error(path, e))?;
        let ext = path.extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| {
                LegacyError::config_error(format!("Invalid TOML in '{}': {e}", path.display()))
            }),
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                LegacyError::config_error(format!("Invalid JSON in '{}': {e}", path.display()))
            }),
            _ => Err(LegacyError::config_error(format!(
                "Unsupported config file '{}' (expected .toml or .json)",
                path.display()
            ))),
        }
    }

    /// The project file, falling back to [`DEFAULT_PROJECT`]
    pub fn project_or_default(&self) -> PathBuf {
        self.project
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJECT))
    }

    pub fn dotnet_or_default(&self) -> &str {
        self.dotnet.as_deref().unwrap_or(DEFAULT_DOTNET)
    }

    /// Default Build/Pack overrides with this config's `[properties]` on top
    pub fn build_properties(&self) -> BuildProperties {
        let mut properties = BuildProperties::default();
        for (key, value) in &self.properties {
            properties.set(key.clone(), value.clone());
        }
        properties
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LegacyError::internal_error(format!("Failed to serialize config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacynator.toml");
        fs::write(
            &path,
            r#"
project = "src/Moq/Moq.csproj"
exclude = ["**/Generated/**"]

[properties]
AssemblyName = "Moq.Sxs"
"#,
        )
        .unwrap();

        let config = LegacynatorConfig::load(&path).unwrap();
        assert_eq!(config.project_or_default(), PathBuf::from("src/Moq/Moq.csproj"));
        assert_eq!(config.dotnet_or_default(), "dotnet");
        assert_eq!(config.exclude, vec!["**/Generated/**"]);

        let properties = config.build_properties();
        assert_eq!(properties.get("AssemblyName"), Some("Moq.Sxs"));
        assert_eq!(properties.get("RootNamespace"), Some("Moq.Legacy"));
    }

    #[test]
    fn test_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".legacynatorrc.json");
        fs::write(&path, r#"{ "dotnet": "/opt/dotnet/dotnet" }"#).unwrap();

        let config = LegacynatorConfig::load(&path).unwrap();
        assert_eq!(config.dotnet_or_default(), "/opt/dotnet/dotnet");
        assert_eq!(config.project_or_default(), PathBuf::from(DEFAULT_PROJECT));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacynator.toml");
        fs::write(&path, "project = [").unwrap();

        let err = LegacynatorConfig::load(&path).unwrap_err();
        assert!(matches!(err, LegacyError::ConfigError { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("legacynator.yaml");
        fs::write(&path, "project: x").unwrap();
        assert!(LegacynatorConfig::load(&path).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = LegacynatorConfig {
            project: Some(PathBuf::from("Moq.csproj")),
            ..Default::default()
        };
        config
            .properties
            .insert("PackageId".to_string(), "Moq.Old".to_string());

        let text = config.to_toml().unwrap();
        let parsed: LegacynatorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
