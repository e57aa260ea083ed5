//! Manifest patch application: file registration, Info.plist keys and signing removal.
//!
//! The text operations in the submodules are pure `&str -> String` functions.
//! [`ManifestPatcher`] wraps them with the file lifecycle: read the whole
//! manifest, back it up, transform, optionally verify, write it back.

pub mod anchor;
pub mod plist;
pub mod signing;
pub mod source_file;
pub mod templates;


use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::PatchError;
use crate::manifest::parser;
use crate::models::{EditKind, EditOutcome, EditResult, SigningReport, SourceFileReport, ValidationSummary};

pub use anchor::{apply_edit, insert_after_anchor};
pub use plist::{inject_usage_description, UsageDescription};
pub use signing::normalize_signing_settings;
pub use source_file::{register_new_source_file, resolve_anchors, Sibling};
pub use templates::SourceFileAnchors;

/// Result type for patching operations
pub type PatchResult<T> = std::result::Result<T, PatchError>;

/// Switches shared by every text operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Skip an edit whose result is already present instead of inserting it again.
    pub guard_existing: bool,
}

/// File-backed patcher for one `project.pbxproj`.
pub struct ManifestPatcher {
    manifest_path: PathBuf,
    backup_dir: Option<PathBuf>,
    options: PatchOptions,
    verify: bool,
    dry_run: bool,
}

impl ManifestPatcher {
    pub fn new(manifest_path: PathBuf) -> Self {
        ManifestPatcher {
            manifest_path,
            backup_dir: None,
            options: PatchOptions::default(),
            verify: false,
            dry_run: false,
        }
    }

    /// Copy the original manifest into `dir` before every write.
    pub fn with_backup_dir(mut self, dir: PathBuf) -> Self {
        self.backup_dir = Some(dir);
        self
    }

    pub fn with_options(mut self, options: PatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Refuse to write a patched manifest that no longer parses.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn read_manifest(&self) -> PatchResult<String> {
        if !self.manifest_path.exists() {
            return Err(PatchError::FileNotFound(self.manifest_path.display().to_string()));
        }
        fs::read_to_string(&self.manifest_path).map_err(|source| PatchError::ReadFailed {
            path: self.manifest_path.display().to_string(),
            source,
        })
    }

    fn backup(&self, label: &str, original: &str) -> PatchResult<Option<PathBuf>> {
        let Some(dir) = &self.backup_dir else {
            return Ok(None);
        };
        // Ensure backup directory exists
        fs::create_dir_all(dir).map_err(|source| PatchError::WriteFailed {
            path: dir.display().to_string(),
            source,
        })?;

        let file_name = self
            .manifest_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project.pbxproj".to_string());
        // Timestamped so repeated runs keep earlier copies
        let stamp = Local::now().format("%Y%m%d%H%M%S%3f");
        let backup_path = dir.join(format!("{}.{}.{}.bak", file_name, label, stamp));

        fs::write(&backup_path, original).map_err(|source| PatchError::WriteFailed {
            path: backup_path.display().to_string(),
            source,
        })?;
        log::debug!("[Patcher] [BACKUP] Saved {}", backup_path.display());
        Ok(Some(backup_path))
    }

    /// Verify, back up and write `patched`. Returns whether the file was written.
    fn commit(&self, label: &str, original: &str, patched: &str) -> PatchResult<bool> {
        if patched == original {
            log::info!("[Patcher] [{}] Manifest unchanged, nothing to write", label.to_uppercase());
            return Ok(false);
        }

        // Verify before anything touches disk
        if self.verify {
            parser::parse_project(patched)?;
            log::debug!("[Patcher] [VERIFY] Patched manifest parses");
        }

        if self.dry_run {
            log::info!("[Patcher] [DRY-RUN] Would write {}", self.manifest_path.display());
            return Ok(false);
        }

        // Backup the original, then overwrite in place
        self.backup(label, original)?;
        fs::write(&self.manifest_path, patched).map_err(|source| PatchError::WriteFailed {
            path: self.manifest_path.display().to_string(),
            source,
        })?;
        log::info!("[Patcher] [{}] Wrote {}", label.to_uppercase(), self.manifest_path.display());
        Ok(true)
    }

    /// Register `display_name` after `sibling`. Unresolvable sibling skips all four edits.
    pub fn add_source_file(&self, display_name: &str, sibling: &Sibling) -> PatchResult<SourceFileReport> {
        let original = self.read_manifest()?;

        // Explicit identifiers, or discovered through the parser
        let Some(anchors) = resolve_anchors(&original, sibling) else {
            log::warn!("[Patcher] [ADD-FILE] Sibling {} not found, no edits applied", sibling.name);
            return Ok(SourceFileReport {
                display_name: display_name.to_string(),
                file_ref_id: String::new(),
                build_file_id: String::new(),
                edits: EditKind::ALL
                    .iter()
                    .map(|&kind| EditResult {
                        kind,
                        outcome: EditOutcome::NotFound,
                    })
                    .collect(),
            });
        };

        let (patched, report) = register_new_source_file(&original, display_name, &anchors, self.options);
        self.commit("add_file", &original, &patched)?;
        Ok(report)
    }

    pub fn add_usage_description(&self, desc: &UsageDescription) -> PatchResult<EditOutcome> {
        let original = self.read_manifest()?;
        let (patched, outcome) = inject_usage_description(&original, desc, self.options)?;
        self.commit("plist", &original, &patched)?;
        Ok(outcome)
    }

    pub fn disable_signing(&self) -> PatchResult<SigningReport> {
        let original = self.read_manifest()?;
        let (patched, report) = normalize_signing_settings(&original, self.options);
        self.commit("signing", &original, &patched)?;
        Ok(report)
    }

    /// Parse the manifest and summarize its objects.
    pub fn validate(&self) -> PatchResult<ValidationSummary> {
        let content = self.read_manifest()?;
        let project = parser::parse_project(&content)?;
        let isa_counts = project.isa_counts();
        Ok(ValidationSummary {
            objects: isa_counts.values().sum(),
            build_settings_blocks: project.build_settings_count(),
            isa_counts,
        })
    }
}
