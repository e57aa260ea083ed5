//! Register a new source file next to an already-registered sibling.

use serde::{Deserialize, Serialize};

use super::anchor::apply_edit;
use super::templates::{source_file_edits, SourceFileAnchors};
use super::PatchOptions;
use crate::manifest::identifier::{mint_pair, Identifier};
use crate::manifest::parser;
use crate::models::{EditKind, EditOutcome, EditResult, SourceFileReport};

/// The registered file the new entries are placed after.
///
/// With both identifiers set the anchors are built directly; otherwise they
/// are looked up in the manifest by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sibling {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_file: Option<String>,
}

impl Sibling {
    pub fn named(name: impl Into<String>) -> Self {
        Sibling {
            name: name.into(),
            reference: None,
            build_file: None,
        }
    }
}

/// Anchors for `sibling`, or `None` when its identifiers cannot be resolved.
pub fn resolve_anchors(text: &str, sibling: &Sibling) -> Option<SourceFileAnchors> {
    if let (Some(reference), Some(build_file)) = (&sibling.reference, &sibling.build_file) {
        return Some(SourceFileAnchors::for_sibling(&sibling.name, reference, build_file));
    }

    let project = match parser::parse_project(text) {
        Ok(project) => project,
        Err(e) => {
            log::warn!("[Patcher] [ADD-FILE] Cannot discover anchors, manifest does not parse: {}", e);
            return None;
        }
    };
    let ids = project.sibling_ids(&sibling.name)?;
    log::debug!(
        "[Patcher] [ADD-FILE] Discovered sibling {}: reference {}, build file {}",
        sibling.name,
        ids.file_reference,
        ids.build_file
    );
    Some(SourceFileAnchors::for_sibling(&sibling.name, &ids.file_reference, &ids.build_file))
}

/// Mint two identifiers and apply the four-entry edit table.
///
/// Each edit is independent: a missing anchor skips only that entry.
pub fn register_new_source_file(
    text: &str,
    display_name: &str,
    anchors: &SourceFileAnchors,
    options: PatchOptions,
) -> (String, SourceFileReport) {
    let (file_ref, build_file) = mint_pair(text);
    register_with_ids(text, display_name, anchors, &file_ref, &build_file, options)
}

/// Same as [`register_new_source_file`] with caller-supplied identifiers.
pub fn register_with_ids(
    text: &str,
    display_name: &str,
    anchors: &SourceFileAnchors,
    file_ref: &Identifier,
    build_file: &Identifier,
    options: PatchOptions,
) -> (String, SourceFileReport) {
    let mut report = SourceFileReport {
        display_name: display_name.to_string(),
        file_ref_id: file_ref.to_string(),
        build_file_id: build_file.to_string(),
        edits: Vec::with_capacity(EditKind::ALL.len()),
    };

    if options.guard_existing && is_registered(text, display_name) {
        log::info!("[Patcher] [ADD-FILE] {} is already registered, skipping", display_name);
        report.edits = EditKind::ALL
            .iter()
            .map(|&kind| EditResult {
                kind,
                outcome: EditOutcome::AlreadyPresent,
            })
            .collect();
        return (text.to_string(), report);
    }

    let mut content = text.to_string();
    for edit in source_file_edits(display_name, file_ref, build_file, anchors) {
        let (patched, outcome) = apply_edit(&content, &edit);
        match outcome {
            EditOutcome::NotFound => {
                log::warn!("[Patcher] [ADD-FILE] Anchor for {} not found, skipped: {}", edit.kind, edit.anchor);
            }
            _ => {
                log::debug!("[Patcher] [ADD-FILE] Inserted {} entry for {}", edit.kind, display_name);
            }
        }
        content = patched;
        report.edits.push(EditResult {
            kind: edit.kind,
            outcome,
        });
    }

    (content, report)
}

fn is_registered(text: &str, display_name: &str) -> bool {
    text.contains(&format!("/* {} */ = {{isa = PBXFileReference", display_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI: &str = "\
/* Begin PBXBuildFile section */
\t\tBF /* ContentView.swift in Sources */ = {isa = PBXBuildFile; fileRef = BE /* ContentView.swift */; };
/* Begin PBXFileReference section */
\t\tBE /* ContentView.swift */ = {isa = PBXFileReference; path = ContentView.swift; };
\t\t\tchildren = (
\t\t\t\tBE /* ContentView.swift */,
\t\t\t);
\t\t\tfiles = (
\t\t\t\tBF /* ContentView.swift in Sources */,
\t\t\t);
";

    fn anchors() -> SourceFileAnchors {
        SourceFileAnchors::for_sibling("ContentView.swift", "BE", "BF")
    }

    #[test]
    fn test_all_four_edits_applied_in_place() {
        let (out, report) = register_new_source_file(MINI, "GoveeModels.swift", &anchors(), PatchOptions::default());
        assert_eq!(report.applied_count(), 4);
        assert_eq!(out.lines().count(), MINI.lines().count() + 4);

        let lines: Vec<&str> = out.lines().collect();
        // File reference lands after the sibling's reference, not after its build file.
        let ref_line = lines.iter().position(|l| l.contains("isa = PBXFileReference; fileEncoding")).unwrap();
        assert!(lines[ref_line - 1].contains("BE /* ContentView.swift */ = {isa = PBXFileReference"));
        let build_line = lines.iter().position(|l| l.contains("GoveeModels.swift in Sources */ = {isa")).unwrap();
        assert!(lines[build_line - 1].contains("BF /* ContentView.swift in Sources */ = {isa"));
    }

    #[test]
    fn test_guard_existing_skips_second_run() {
        let options = PatchOptions { guard_existing: true };
        let (once, _) = register_new_source_file(MINI, "GoveeModels.swift", &anchors(), options);
        let (twice, report) = register_new_source_file(&once, "GoveeModels.swift", &anchors(), options);
        assert_eq!(once, twice);
        assert!(report.edits.iter().all(|e| e.outcome == EditOutcome::AlreadyPresent));
    }

    #[test]
    fn test_without_guard_second_run_duplicates() {
        let (once, _) = register_new_source_file(MINI, "GoveeModels.swift", &anchors(), PatchOptions::default());
        let (twice, report) = register_new_source_file(&once, "GoveeModels.swift", &anchors(), PatchOptions::default());
        assert_eq!(report.applied_count(), 4);
        assert_eq!(twice.matches("/* GoveeModels.swift */,").count(), 2);
    }

    #[test]
    fn test_explicit_ids_skip_discovery() {
        let sibling = Sibling {
            name: "ContentView.swift".to_string(),
            reference: Some("BE".to_string()),
            build_file: Some("BF".to_string()),
        };
        // MINI is not a parseable manifest, so only explicit ids can resolve.
        assert_eq!(resolve_anchors(MINI, &sibling), Some(anchors()));
        assert_eq!(resolve_anchors(MINI, &Sibling::named("ContentView.swift")), None);
    }
}
