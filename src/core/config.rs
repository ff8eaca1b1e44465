//! Configuration types for rextract.
//!
//! Configuration is plain YAML. Defaults reproduce the behavior of the
//! command-line tool without any file present.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{ExtractError, Result};
use crate::core::naming::MethodName;

/// File names probed in the working directory when no `--config` is given.
pub const IMPLICIT_CONFIG_FILES: &[&str] = &[".rextract.yml", ".rextract.yaml"];

/// Upper bound for the text strategy's search window half-width.
const MAX_SEARCH_RADIUS: usize = 1000;

/// Which extraction pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Parse into a syntax tree and rewrite structurally
    #[default]
    Structural,
    /// Match and rewrite the raw line array
    Text,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural => f.write_str("structural"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// Main configuration for the extraction engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Pipeline used when the caller does not choose one
    pub strategy: StrategyKind,

    /// Half-width, in lines, of the text strategy's search window
    pub search_radius: usize,

    /// Base name given to the synthesized method before the rename pass
    pub placeholder: String,

    /// Indentation unit for synthesized method bodies
    pub indent_width: usize,

    /// Re-parse the rewritten source before writing it
    pub validate_output: bool,

    /// Compute the rewrite but never touch the file
    pub dry_run: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Structural,
            search_radius: 5,
            placeholder: "extracted_method_temp".to_string(),
            indent_width: 2,
            validate_output: true,
            dry_run: false,
        }
    }
}

impl ExtractConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ExtractError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            ExtractError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Find an implicit configuration file inside `dir`, if one exists.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        IMPLICIT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Indentation unit as a string of spaces
    pub fn indent_unit(&self) -> String {
        " ".repeat(self.indent_width)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.indent_width == 0 {
            return Err(ExtractError::config_field(
                "indent_width must be at least 1",
                "indent_width",
            ));
        }

        if self.search_radius > MAX_SEARCH_RADIUS {
            return Err(ExtractError::config_field(
                format!(
                    "search_radius must be at most {MAX_SEARCH_RADIUS}, got {}",
                    self.search_radius
                ),
                "search_radius",
            ));
        }

        MethodName::parse(&self.placeholder).map_err(|_| {
            ExtractError::config_field(
                format!("placeholder '{}' is not a legal method name", self.placeholder),
                "placeholder",
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.strategy, StrategyKind::Structural);
        assert_eq!(config.search_radius, 5);
        assert_eq!(config.indent_unit(), "  ");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: ExtractConfig = serde_yaml::from_str("strategy: text\n").unwrap();
        assert_eq!(config.strategy, StrategyKind::Text);
        assert_eq!(config.placeholder, "extracted_method_temp");
        assert!(config.validate_output);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = ExtractConfig {
            indent_width: 0,
            ..ExtractConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ExtractError::Config { field: Some(ref f), .. }) if f == "indent_width"
        ));

        let config = ExtractConfig {
            placeholder: "Temp".to_string(),
            ..ExtractConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ExtractConfig {
            search_radius: 5000,
            ..ExtractConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".rextract.yml");

        let config = ExtractConfig {
            strategy: StrategyKind::Text,
            search_radius: 8,
            ..ExtractConfig::default()
        };
        config.to_yaml_file(&path).unwrap();

        let loaded = ExtractConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(ExtractConfig::discover(dir.path()), Some(path));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = ExtractConfig::from_yaml_file(dir.path().join("nope.yml"));
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }
}
