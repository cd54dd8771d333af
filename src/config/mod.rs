//! Configuration module.
//!
//! Handles resolver limits and suggestion settings loaded from TOML.

mod settings;

pub use settings::{ResolverSettings, Settings, SettingsError, SuggestionSettings};
