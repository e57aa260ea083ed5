//! Payload templates and anchor strings for the source-file edit table.
//!
//! Every line produced here matches the layout Xcode itself writes: two tabs
//! for entries of the `objects` table, four tabs for members of a `children`
//! or `files` list.

use crate::manifest::identifier::Identifier;
use crate::models::{EditKind, EditSpec, InsertionPolicy};

/// Indentation of a build setting inside `buildSettings = { ... }`.
pub const SETTING_INDENT: &str = "\t\t\t\t";

/// The two lines appended after every `buildSettings = {` when disabling signing.
pub const SIGNING_FLAG_LINES: &str =
    "\n\t\t\t\tCODE_SIGNING_REQUIRED = NO;\n\t\t\t\tCODE_SIGNING_ALLOWED = NO;";

/// Anchors for the four edits, all pointing at one already-registered sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileAnchors {
    pub file_reference: String,
    pub build_file: String,
    pub group_child: String,
    pub sources_phase: String,
}

impl SourceFileAnchors {
    /// Anchors for a sibling whose reference and build-file identifiers are known.
    ///
    /// The two object-table anchors include the `isa` so that they cannot match
    /// the `fileRef = ...` mention inside the sibling's build-file line.
    pub fn for_sibling(sibling_name: &str, file_reference: &str, build_file: &str) -> Self {
        SourceFileAnchors {
            file_reference: format!(
                "{} /* {} */ = {{isa = PBXFileReference",
                file_reference, sibling_name
            ),
            build_file: format!(
                "{} /* {} in Sources */ = {{isa = PBXBuildFile",
                build_file, sibling_name
            ),
            group_child: format!("{} /* {} */,", file_reference, sibling_name),
            sources_phase: format!("{} /* {} in Sources */,", build_file, sibling_name),
        }
    }

    pub fn anchor_for(&self, kind: EditKind) -> &str {
        match kind {
            EditKind::FileReference => &self.file_reference,
            EditKind::BuildFile => &self.build_file,
            EditKind::GroupChild => &self.group_child,
            EditKind::SourcesPhase => &self.sources_phase,
        }
    }
}

/// `lastKnownFileType` for a source file, by extension.
pub fn file_type_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "swift" => "sourcecode.swift",
        "m" => "sourcecode.c.objc",
        "mm" => "sourcecode.cpp.objcpp",
        "c" => "sourcecode.c.c",
        "cpp" | "cc" | "cxx" => "sourcecode.cpp.cpp",
        "h" => "sourcecode.c.h",
        "metal" => "sourcecode.metal",
        _ => "text",
    }
}

/// Quote a value for pbxproj string syntax, escaping backslashes and quotes.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Leave bare words bare (as Xcode does) and quote everything else.
pub fn quote_if_needed(value: &str) -> String {
    let bare = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | ':' | '.' | '-'));
    if bare {
        value.to_string()
    } else {
        quote(value)
    }
}

/// `KEY = "value";` as written inside a build-settings block.
pub fn setting_line(key: &str, value: &str) -> String {
    format!("{} = {};", key, quote(value))
}

pub fn file_reference_line(file_ref: &Identifier, name: &str) -> String {
    format!(
        "\t\t{} /* {} */ = {{isa = PBXFileReference; fileEncoding = 4; lastKnownFileType = {}; path = {}; sourceTree = \"<group>\"; }};\n",
        file_ref,
        name,
        file_type_for(name),
        quote_if_needed(name)
    )
}

pub fn build_file_line(build_file: &Identifier, file_ref: &Identifier, name: &str) -> String {
    format!(
        "\t\t{} /* {} in Sources */ = {{isa = PBXBuildFile; fileRef = {} /* {} */; }};\n",
        build_file, name, file_ref, name
    )
}

pub fn group_child_line(file_ref: &Identifier, name: &str) -> String {
    format!("\t\t\t\t{} /* {} */,\n", file_ref, name)
}

pub fn sources_phase_line(build_file: &Identifier, name: &str) -> String {
    format!("\t\t\t\t{} /* {} in Sources */,\n", build_file, name)
}

/// The four-entry edit table for registering `name`, in application order.
pub fn source_file_edits(
    name: &str,
    file_ref: &Identifier,
    build_file: &Identifier,
    anchors: &SourceFileAnchors,
) -> Vec<EditSpec> {
    EditKind::ALL
        .iter()
        .map(|&kind| {
            let payload = match kind {
                EditKind::FileReference => file_reference_line(file_ref, name),
                EditKind::BuildFile => build_file_line(build_file, file_ref, name),
                EditKind::GroupChild => group_child_line(file_ref, name),
                EditKind::SourcesPhase => sources_phase_line(build_file, name),
            };
            EditSpec {
                kind,
                anchor: anchors.anchor_for(kind).to_string(),
                payload,
                policy: InsertionPolicy::AfterAnchorLine,
            }
        })
        .collect()
}
