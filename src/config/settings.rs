//! TOML-based configuration for the resolver.
//!
//! Settings live under a `[resolver]` table so they can share a `mantis.toml`
//! with other tools.
//!
//! Example configuration:
//! ```toml
//! [resolver]
//! max_join_hops = 2
//! max_path_edges = 24
//!
//! [resolver.suggestions]
//! limit = 6
//! min_similarity = 0.5
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Group-by resolution settings.
    pub resolver: ResolverSettings,
}

/// Limits and knobs for graph traversal and resolution.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Maximum number of model joins a group-by item may require.
    pub max_join_hops: u32,

    /// Hard bound on path length, independent of join weight.
    pub max_path_edges: usize,

    /// Allow items joined through a validity window without `metric_time`.
    pub allow_scd_without_metric_time: bool,

    /// Suggestion settings for unmatched inputs.
    pub suggestions: SuggestionSettings,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_join_hops: 2,
            max_path_edges: 24,
            allow_scd_without_metric_time: false,
            suggestions: SuggestionSettings::default(),
        }
    }
}

/// Fuzzy suggestion settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SuggestionSettings {
    /// Maximum suggestions attached to an issue.
    pub limit: usize,

    /// Minimum normalized similarity (0.0 to 1.0) for a candidate to be suggested.
    pub min_similarity: f64,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            limit: 6,
            min_similarity: 0.5,
        }
    }
}

impl ResolverSettings {
    /// Check that the limits describe a bounded traversal.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_path_edges == 0 {
            return Err(SettingsError::InvalidConfig(
                "max_path_edges must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.suggestions.min_similarity) {
            return Err(SettingsError::InvalidConfig(format!(
                "suggestions.min_similarity must be within 0.0..=1.0, got {}",
                self.suggestions.min_similarity
            )));
        }
        Ok(())
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.resolver.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `MANTIS_RESOLVER_CONFIG`
    /// 2. `./mantis.toml`
    /// 3. `~/.config/mantis/resolver.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("MANTIS_RESOLVER_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("mantis.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("mantis").join("resolver.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}
