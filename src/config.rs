//! Engine configuration
//!
//! Validation limits, resolver options, a default theme seeded into new pages
//! and an optional custom catalog, loaded from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::{StyleValue, StyleVariables};
use crate::registry::{Registry, RegistryError};
use crate::validator::Limits;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

const DEFAULT_CONFIG: &str = r##"
[limits]
max_depth = 32
max_nodes = 2000

[resolver]
keep_unresolved_vars = true

[theme]
primaryColor = "#3b82f6"
textColor = "#0f172a"
backgroundColor = "#ffffff"
fontFamily = "Inter, system-ui, sans-serif"
radius = "12px"
"##;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub keep_unresolved_vars: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            keep_unresolved_vars: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Catalog JSON used instead of the built-in one
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Style variables every new page starts from
    #[serde(default)]
    pub theme: StyleVariables,
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        // relative catalog paths are relative to the config file
        if let (Some(catalog), Some(dir)) = (&config.registry.catalog, path.parent()) {
            if catalog.is_relative() {
                config.registry.catalog = Some(dir.join(catalog));
            }
        }
        Ok(config)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_keep_unresolved_vars(mut self, keep: bool) -> Self {
        self.resolver.keep_unresolved_vars = keep;
        self
    }

    pub fn with_theme_variable(mut self, token: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.theme.insert(token.into(), value.into());
        self
    }

    pub fn with_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry.catalog = Some(path.into());
        self
    }

    /// The configured catalog, or `None` for the built-in one
    pub fn load_registry(&self) -> Result<Option<Registry>, RegistryError> {
        self.registry
            .catalog
            .as_deref()
            .map(Registry::from_file)
            .transpose()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_str(DEFAULT_CONFIG).expect("Default config should be valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.limits, Limits::default());
        assert!(config.resolver.keep_unresolved_vars);
        assert_eq!(config.theme["primaryColor"], StyleValue::from("#3b82f6"));
        assert_eq!(config.registry.catalog, None);
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_str(
            r##"
[limits]
max_nodes = 50

[theme]
primaryColor = "#000000"
spacing = 8
"##,
        )
        .unwrap();
        assert_eq!(config.limits.max_nodes, 50);
        assert_eq!(config.limits.max_depth, 32);
        assert!(config.resolver.keep_unresolved_vars);
        assert_eq!(config.theme["spacing"], StyleValue::Number(8.0));
    }

    #[test]
    fn test_theme_groups() {
        let config = EngineConfig::from_str(
            r##"
[theme.shadowLg]
color = "rgba(0,0,0,0.2)"
blur = 24
"##,
        )
        .unwrap();
        assert_eq!(
            config.theme["shadowLg"].get("color"),
            Some(&StyleValue::from("rgba(0,0,0,0.2)"))
        );
    }

    #[test]
    fn test_invalid_toml() {
        let result = EngineConfig::from_str("[limits\nmax_depth = 1");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_keep_unresolved_vars(false)
            .with_theme_variable("radius", "0px")
            .with_catalog("catalog.json");
        assert!(!config.resolver.keep_unresolved_vars);
        assert_eq!(config.theme["radius"], StyleValue::from("0px"));
        assert_eq!(config.registry.catalog, Some(PathBuf::from("catalog.json")));
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = EngineConfig::default().with_catalog("/nonexistent/catalog.json");
        assert!(config.load_registry().is_err());
    }
}
