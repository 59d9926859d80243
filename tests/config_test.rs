//! Integration tests for settings files and compiler construction.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use pgquery::config::{Settings, SettingsError};
use pgquery::prelude::*;

fn write_config(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pgquery-config-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_settings_file_drives_compiler() {
    let path = write_config(
        "shallow.toml",
        "[compiler]\nmax_expression_depth = 3\nlog_statements = true\n",
    );
    let settings = Settings::from_file(&path).unwrap();
    let compiler = Compiler::from_settings(&settings);

    let users = Source::new(Arc::new(Schema::new("users").with_field("id")));
    let shallow = Query::new()
        .from(users.clone())
        .filter(field(0, "id").eq(1));
    assert!(compiler.select(&shallow).is_ok());

    let deep = Query::new()
        .from(users)
        .filter(field(0, "id").eq(1).not().not());
    assert_eq!(
        compiler.select(&deep).unwrap_err(),
        CompileError::DepthExceeded { limit: 3 }
    );
}

#[test]
fn test_invalid_settings_file() {
    let path = write_config("zero.toml", "[compiler]\nmax_expression_depth = 0\n");
    assert!(matches!(
        Settings::from_file(&path),
        Err(SettingsError::InvalidConfig(_))
    ));

    let path = write_config("broken.toml", "compiler = [");
    assert!(matches!(
        Settings::from_file(&path),
        Err(SettingsError::ParseError(_))
    ));
}

#[test]
fn test_options_builder_matches_settings() {
    let settings = Settings::from_toml_str("[compiler]\nmax_expression_depth = 64\n").unwrap();
    assert_eq!(
        CompileOptions::from(&settings),
        CompileOptions::default().with_max_expression_depth(64)
    );
}
