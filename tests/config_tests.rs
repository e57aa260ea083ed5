//! Integration tests for config loading, saving and validation.

use pbxpatch::config::{loader, validator, PatchConfig};
use pbxpatch::error::ConfigError;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_save_then_load_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf").join("pbxpatch.toml");

    let mut config = PatchConfig::default();
    config.manifest = PathBuf::from("Other.xcodeproj/project.pbxproj");
    config.guard_existing = true;
    config.log_file = Some(PathBuf::from("pbxpatch.log"));
    config.source_file.set_sibling("AppDelegate.swift");

    loader::save_config_to_file(&config, &path).unwrap();
    let loaded = loader::load_config_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_saved_defaults_are_readable_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pbxpatch.toml");
    loader::save_config_to_file(&PatchConfig::default(), &path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[source_file]"));
    assert!(content.contains("[usage_description]"));
    assert!(content.contains("5B80D9BE2EDCB128000DBD74"));
    assert!(!content.contains("log_file"));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = loader::load_config_from_file(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn test_load_invalid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pbxpatch.toml");
    fs::write(&path, "manifest = [unterminated").unwrap();
    let result = loader::load_config_from_file(&path);
    assert!(matches!(result, Err(ConfigError::InvalidToml(_))));
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pbxpatch.toml");
    fs::write(
        &path,
        "[source_file]\nsibling_build_file = \"NOT-AN-IDENTIFIER\"\n",
    )
    .unwrap();
    let result = loader::load_config_from_file(&path);
    assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
}

#[test]
fn test_explicit_config_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "backup = false\nverify = true\n").unwrap();

    let config = loader::discover_config(Some(&path)).unwrap();
    assert!(!config.backup);
    assert!(config.verify);
    assert_eq!(config.source_file, PatchConfig::default().source_file);
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let result = loader::discover_config(Some(&dir.path().join("missing.toml")));
    assert!(result.is_err());
}

#[test]
fn test_validator_accepts_discovery_only_sibling() {
    let mut config = PatchConfig::default();
    config.source_file.set_sibling("ContentView.swift");
    assert!(validator::validate_config(&config).is_ok());
}

#[test]
fn test_local_file_found_in_working_dir() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(loader::CONFIG_FILE_NAME),
        "manifest = \"Local.xcodeproj/project.pbxproj\"\n",
    )
    .unwrap();

    let config = loader::discover_config_in(None, dir.path(), None).unwrap();
    assert_eq!(config.manifest, PathBuf::from("Local.xcodeproj/project.pbxproj"));
}

#[test]
fn test_local_file_wins_over_global() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().join("home").join("config.toml");
    fs::create_dir_all(global.parent().unwrap()).unwrap();
    fs::write(&global, "manifest = \"Global.xcodeproj/project.pbxproj\"\n").unwrap();
    fs::write(
        dir.path().join(loader::CONFIG_FILE_NAME),
        "manifest = \"Local.xcodeproj/project.pbxproj\"\n",
    )
    .unwrap();

    let config = loader::discover_config_in(None, dir.path(), Some(&global)).unwrap();
    assert_eq!(config.manifest, PathBuf::from("Local.xcodeproj/project.pbxproj"));
}

#[test]
fn test_global_file_used_without_local() {
    let dir = tempfile::tempdir().unwrap();
    let work = dir.path().join("work");
    fs::create_dir_all(&work).unwrap();
    let global = dir.path().join("config.toml");
    fs::write(&global, "guard_existing = true\n").unwrap();

    let config = loader::discover_config_in(None, &work, Some(&global)).unwrap();
    assert!(config.guard_existing);
}

#[test]
fn test_defaults_when_nothing_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing_global = dir.path().join("absent").join("config.toml");

    let config = loader::discover_config_in(None, dir.path(), Some(&missing_global)).unwrap();
    assert_eq!(config, PatchConfig::default());
}

#[test]
fn test_explicit_path_beats_local_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(loader::CONFIG_FILE_NAME), "verify = true\n").unwrap();
    let explicit = dir.path().join("custom.toml");
    fs::write(&explicit, "backup = false\n").unwrap();

    let config = loader::discover_config_in(Some(&explicit), dir.path(), None).unwrap();
    assert!(!config.backup);
    assert!(!config.verify);
}
