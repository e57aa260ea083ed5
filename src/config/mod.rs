//! Configuration module for manifest patching.
//!
//! # Module Structure
//!
//! - `loader`: locating, reading and writing `pbxpatch.toml`
//! - `validator`: sanity checks on loaded values
//!
//! Every field has a default, so an empty file (or no file at all) reproduces
//! the historical Govee Mac setup.

pub mod loader;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::manifest::patcher::{PatchOptions, Sibling, UsageDescription};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Path of the `project.pbxproj` to patch.
    pub manifest: PathBuf,
    pub backup: bool,
    pub backup_dir: PathBuf,
    /// Parse the patched text before writing it.
    pub verify: bool,
    pub guard_existing: bool,
    /// Append log lines here in addition to stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    pub source_file: SourceFileConfig,
    pub usage_description: UsageDescription,
}

impl Default for PatchConfig {
    fn default() -> Self {
        PatchConfig {
            manifest: PathBuf::from("Govee Mac.xcodeproj/project.pbxproj"),
            backup: true,
            backup_dir: PathBuf::from(".pbxpatch_backup"),
            verify: false,
            guard_existing: false,
            log_file: None,
            source_file: SourceFileConfig::default(),
            usage_description: UsageDescription::default(),
        }
    }
}

impl PatchConfig {
    pub fn patch_options(&self) -> PatchOptions {
        PatchOptions {
            guard_existing: self.guard_existing,
        }
    }

    /// Layer command-line values over the loaded file.
    ///
    /// Switches can only turn behavior on (`verify`, `guard_existing`) or
    /// backups off; they never undo a value the file enabled.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(manifest) = &overrides.manifest {
            self.manifest = manifest.clone();
        }
        self.verify |= overrides.verify;
        self.guard_existing |= overrides.guard_existing;
        if overrides.no_backup {
            self.backup = false;
        }

        if let Some(name) = &overrides.source_name {
            self.source_file.name = name.clone();
        }
        // Configured identifiers only describe the configured sibling
        if let Some(sibling) = &overrides.sibling {
            if *sibling != self.source_file.sibling {
                self.source_file.set_sibling(sibling.clone());
            }
        }

        if let Some(key) = &overrides.plist_key {
            self.usage_description.key = key.clone();
        }
        if let Some(value) = &overrides.plist_value {
            self.usage_description.value = value.clone();
        }
    }
}

/// Values given on the command line; `None`/`false` leaves the file value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub manifest: Option<PathBuf>,
    pub verify: bool,
    pub guard_existing: bool,
    pub no_backup: bool,
    pub source_name: Option<String>,
    pub sibling: Option<String>,
    pub plist_key: Option<String>,
    pub plist_value: Option<String>,
}

/// The file to register and the sibling it is placed after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFileConfig {
    pub name: String,
    pub sibling: String,
    /// Sibling's PBXFileReference identifier; looked up when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sibling_reference: Option<String>,
    /// Sibling's PBXBuildFile identifier; looked up when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sibling_build_file: Option<String>,
}

impl Default for SourceFileConfig {
    fn default() -> Self {
        SourceFileConfig {
            name: "GoveeModels.swift".to_string(),
            sibling: "ContentView.swift".to_string(),
            sibling_reference: Some("5B80D9BE2EDCB128000DBD74".to_string()),
            sibling_build_file: Some("5B80D9BF2EDCB128000DBD74".to_string()),
        }
    }
}

impl SourceFileConfig {
    pub fn sibling(&self) -> Sibling {
        Sibling {
            name: self.sibling.clone(),
            reference: self.sibling_reference.clone(),
            build_file: self.sibling_build_file.clone(),
        }
    }

    /// Point at a different sibling; its identifiers will be discovered.
    pub fn set_sibling(&mut self, name: impl Into<String>) {
        self.sibling = name.into();
        self.sibling_reference = None;
        self.sibling_build_file = None;
    }
}
