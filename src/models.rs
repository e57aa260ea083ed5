//! Core data structures shared by the patcher, the CLI and the tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Symbolic name of one entry in the source-file edit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditKind {
    FileReference,
    BuildFile,
    GroupChild,
    SourcesPhase,
}

impl EditKind {
    /// Order in which the edits are applied.
    pub const ALL: [EditKind; 4] = [
        EditKind::FileReference,
        EditKind::BuildFile,
        EditKind::GroupChild,
        EditKind::SourcesPhase,
    ];
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditKind::FileReference => "PBXFileReference",
            EditKind::BuildFile => "PBXBuildFile",
            EditKind::GroupChild => "PBXGroup children",
            EditKind::SourcesPhase => "PBXSourcesBuildPhase files",
        };
        f.write_str(name)
    }
}

/// Where a payload lands relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertionPolicy {
    /// New line immediately after the line containing the anchor.
    AfterAnchorLine,
}

/// One declarative edit: anchor, newline-terminated payload and policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSpec {
    pub kind: EditKind,
    pub anchor: String,
    pub payload: String,
    pub policy: InsertionPolicy,
}

/// Result of a single edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EditOutcome {
    /// Primary anchor found; `count` insertions/substitutions made.
    Applied { count: usize },
    /// Primary anchor missing, secondary strategy used.
    AppliedViaFallback { count: usize },
    /// Nothing matched; text unchanged.
    NotFound,
    /// Presence guard tripped; text unchanged.
    AlreadyPresent,
}

impl EditOutcome {
    pub fn changed(&self) -> bool {
        matches!(
            self,
            EditOutcome::Applied { count } | EditOutcome::AppliedViaFallback { count } if *count > 0
        )
    }
}

/// Outcome of one table entry within a file registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    pub kind: EditKind,
    pub outcome: EditOutcome,
}

/// Report for register-new-source-file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFileReport {
    pub display_name: String,
    pub file_ref_id: String,
    pub build_file_id: String,
    pub edits: Vec<EditResult>,
}

impl SourceFileReport {
    pub fn applied_count(&self) -> usize {
        self.edits.iter().filter(|e| e.outcome.changed()).count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &EditResult> {
        self.edits.iter().filter(|e| !e.outcome.changed())
    }
}

/// Per-substitution counts for normalize-signing-settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningReport {
    pub identities_blanked: usize,
    pub styles_set_manual: usize,
    pub teams_blanked: usize,
    pub profiles_blanked: usize,
    pub blocks_flagged: usize,
    pub blocks_skipped: usize,
}

impl SigningReport {
    pub fn total(&self) -> usize {
        self.identities_blanked
            + self.styles_set_manual
            + self.teams_blanked
            + self.profiles_blanked
            + self.blocks_flagged
    }
}

/// What `validate` found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub objects: usize,
    pub build_settings_blocks: usize,
    pub isa_counts: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_changed() {
        assert!(EditOutcome::Applied { count: 1 }.changed());
        assert!(EditOutcome::AppliedViaFallback { count: 3 }.changed());
        assert!(!EditOutcome::Applied { count: 0 }.changed());
        assert!(!EditOutcome::NotFound.changed());
        assert!(!EditOutcome::AlreadyPresent.changed());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_string(&EditOutcome::AppliedViaFallback { count: 2 }).unwrap();
        assert_eq!(json, r#"{"status":"applied_via_fallback","count":2}"#);
        let json = serde_json::to_string(&EditOutcome::NotFound).unwrap();
        assert_eq!(json, r#"{"status":"not_found"}"#);
    }

    #[test]
    fn test_signing_report_total() {
        let report = SigningReport {
            identities_blanked: 2,
            styles_set_manual: 2,
            teams_blanked: 2,
            profiles_blanked: 0,
            blocks_flagged: 4,
            blocks_skipped: 0,
        };
        assert_eq!(report.total(), 10);
    }
}
