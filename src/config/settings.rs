//! TOML-based configuration for pgquery.
//!
//! Example configuration (`pgquery.toml`):
//! ```toml
//! [compiler]
//! max_expression_depth = 512   # deepest expression nesting accepted
//! log_statements = false       # trace every generated statement
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PGQUERY_CONFIG";

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
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// SQL compiler configuration.
    pub compiler: CompilerSettings,
}

/// SQL compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Deepest expression nesting accepted before compilation fails.
    pub max_expression_depth: usize,

    /// Emit every generated statement as a trace event.
    pub log_statements: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            max_expression_depth: 512,
            log_statements: false,
        }
    }
}

impl Settings {
    /// Load settings from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. `PGQUERY_CONFIG` environment variable
    /// 2. `./pgquery.toml`
    /// 3. `<user config dir>/pgquery/config.toml`
    ///
    /// Falls back to defaults when no file exists.
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("pgquery.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pgquery").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Settings::default())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.compiler.max_expression_depth < 1 {
            return Err(SettingsError::InvalidConfig(
                "compiler.max_expression_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[compiler]
max_expression_depth = 64
log_statements = true
"#;

        let settings = Settings::from_toml_str(toml).unwrap();
        assert_eq!(settings.compiler.max_expression_depth, 64);
        assert!(settings.compiler.log_statements);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings = Settings::from_toml_str("[compiler]\nlog_statements = true\n").unwrap();
        assert_eq!(settings.compiler.max_expression_depth, 512);

        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.compiler.max_expression_depth, 512);
        assert!(!settings.compiler.log_statements);
    }

    #[test]
    fn test_zero_depth_rejected() {
        let result = Settings::from_toml_str("[compiler]\nmax_expression_depth = 0\n");
        assert!(matches!(result, Err(SettingsError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_toml_rejected() {
        let result = Settings::from_toml_str("[compiler\n");
        assert!(matches!(result, Err(SettingsError::ParseError(_))));

        let result = Settings::from_toml_str("[compiler]\nmax_expression_depth = \"deep\"\n");
        assert!(matches!(result, Err(SettingsError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Settings::from_file("/nonexistent/pgquery.toml");
        assert!(matches!(result, Err(SettingsError::FileNotFound(_))));
    }
}
