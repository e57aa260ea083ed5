//! Config file loader and serialization.

use std::fs;
use std::path::{Path, PathBuf};

use super::validator::validate_config;
use super::PatchConfig;
use crate::error::ConfigError;

/// Name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "pbxpatch.toml";

/// Get the global config path: ~/.config/pbxpatch/config.toml
pub fn get_global_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    Ok(home.join(".config/pbxpatch").join("config.toml"))
}

/// Load and validate config from a TOML file.
pub fn load_config_from_file(path: &Path) -> Result<PatchConfig, ConfigError> {
    // Validate the path first
    validate_config_path(path)?;

    // Read file content
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    // Parse TOML content; missing keys fall back to defaults
    let config: PatchConfig = toml::from_str(&content)?;

    // Validate loaded config
    validate_config(&config)?;

    Ok(config)
}

/// Save config to a TOML file.
pub fn save_config_to_file(config: &PatchConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ConfigError::IoError)?;
        }
    }

    // Serialize to TOML
    let toml_content = toml::to_string_pretty(config).map_err(|e| {
        ConfigError::ValidationFailed(format!("Failed to serialize config: {}", e))
    })?;

    // Write to file
    fs::write(path, toml_content).map_err(ConfigError::IoError)?;

    Ok(())
}

/// Validate config path (.toml extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "toml" => Ok(()),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml extension, got .{}",
            ext.to_string_lossy()
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml extension".to_string(),
        )),
    }
}

/// Resolve the effective config.
///
/// An explicit path must exist. Otherwise `./pbxpatch.toml`, then the global
/// file, then built-in defaults.
pub fn discover_config(explicit: Option<&Path>) -> Result<PatchConfig, ConfigError> {
    discover_config_in(explicit, Path::new("."), get_global_config_path().ok().as_deref())
}

/// [`discover_config`] with the working directory and global path supplied.
pub fn discover_config_in(
    explicit: Option<&Path>,
    working_dir: &Path,
    global: Option<&Path>,
) -> Result<PatchConfig, ConfigError> {
    // An explicit path is never silently replaced
    if let Some(path) = explicit {
        log::debug!("[Config] Loading explicit config {}", path.display());
        return load_config_from_file(path);
    }

    let local = working_dir.join(CONFIG_FILE_NAME);
    if local.exists() {
        log::debug!("[Config] Loading {}", local.display());
        return load_config_from_file(&local);
    }

    if let Some(global) = global {
        if global.exists() {
            log::debug!("[Config] Loading {}", global.display());
            return load_config_from_file(global);
        }
    }

    log::debug!("[Config] No config file found, using defaults");
    Ok(PatchConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_config_path_extension() {
        assert!(validate_config_path(Path::new("pbxpatch.toml")).is_ok());
        assert!(validate_config_path(Path::new("pbxpatch.json")).is_err());
        assert!(validate_config_path(Path::new("pbxpatch")).is_err());
        assert!(validate_config_path(Path::new("")).is_err());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config: PatchConfig = toml::from_str("").unwrap();
        assert_eq!(config, PatchConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: PatchConfig = toml::from_str(
            r#"
manifest = "App.xcodeproj/project.pbxproj"

[usage_description]
key = "INFOPLIST_KEY_NSCameraUsageDescription"
value = "Scans QR codes."
"#,
        )
        .unwrap();
        assert_eq!(config.manifest, PathBuf::from("App.xcodeproj/project.pbxproj"));
        assert_eq!(config.usage_description.key, "INFOPLIST_KEY_NSCameraUsageDescription");
        assert_eq!(config.usage_description.fallback_anchor, "ENABLE_HARDENED_RUNTIME = YES;");
        assert_eq!(config.source_file.name, "GoveeModels.swift");
    }
}
