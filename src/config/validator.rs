//! Configuration validation.

use once_cell::sync::Lazy;
use regex::Regex;

use super::PatchConfig;
use crate::error::ConfigError;
use crate::manifest::identifier::is_identifier;

static SETTING_KEY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("Invalid setting key regex")
});

/// Reject values that would produce a broken manifest or can never match.
pub fn validate_config(config: &PatchConfig) -> Result<(), ConfigError> {
    if config.manifest.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "manifest path cannot be empty".to_string(),
        ));
    }

    let source = &config.source_file;
    if source.name.trim().is_empty() || source.name.contains('\n') || source.name.contains("*/") {
        return Err(ConfigError::ValidationFailed(format!(
            "invalid source file name: {:?}",
            source.name
        )));
    }
    if source.sibling.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "source_file.sibling cannot be empty".to_string(),
        ));
    }
    for (field, value) in [
        ("sibling_reference", &source.sibling_reference),
        ("sibling_build_file", &source.sibling_build_file),
    ] {
        if let Some(id) = value {
            if !is_identifier(id) {
                return Err(ConfigError::ValidationFailed(format!(
                    "source_file.{} must be 24 uppercase hex digits, got {:?}",
                    field, id
                )));
            }
        }
    }

    let desc = &config.usage_description;
    if !SETTING_KEY_REGEX.is_match(&desc.key) {
        return Err(ConfigError::ValidationFailed(format!(
            "usage_description.key is not a build setting name: {:?}",
            desc.key
        )));
    }
    if desc.fallback_anchor.trim().is_empty() && desc.primary_anchor.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "usage_description needs a primary or fallback anchor".to_string(),
        ));
    }

    Ok(())
}
