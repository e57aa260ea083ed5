//! pbxpatch
//!
//! Scripted edits to an Xcode `project.pbxproj` manifest: register a new
//! source file next to an existing one, add an Info.plist usage description
//! build setting, and strip code-signing requirements.
//!
//! The system is organized into functional modules:
//! - **error**: error type hierarchy
//! - **models**: edit table types, outcomes and reports
//! - **config**: `pbxpatch.toml` loading and validation
//! - **log_collector**: `log` backend (stderr plus optional file)
//! - **manifest**: identifiers, structural parser and the patcher

// Core foundational modules
pub mod error;
pub mod models;

pub mod config;
pub mod log_collector;
pub mod manifest;

// Re-export the log crate for macro usage
pub use log;

pub use log_collector::LogCollector;

pub use error::{ConfigError, ParseError, PatchError, Result};

pub use models::{
    EditKind, EditOutcome, EditResult, EditSpec, InsertionPolicy, SigningReport, SourceFileReport,
    ValidationSummary,
};

pub use config::{ConfigOverrides, PatchConfig, SourceFileConfig};

pub use manifest::identifier::Identifier;
pub use manifest::patcher::{ManifestPatcher, PatchOptions, Sibling, UsageDescription};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_error_reexport() {
        let _: Result<i32> = Ok(42);
    }

    #[test]
    fn test_models_reexport() {
        assert_eq!(EditKind::ALL.len(), 4);
        assert!(!EditOutcome::NotFound.changed());
    }
}
