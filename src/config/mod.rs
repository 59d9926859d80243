//! Configuration module for pgquery.
//!
//! Handles the settings file and its lookup locations.

mod settings;

pub use settings::{CompilerSettings, Settings, SettingsError, CONFIG_ENV_VAR};
