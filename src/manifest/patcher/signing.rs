//! Code-signing removal across every build configuration.

use once_cell::sync::Lazy;
use regex::Regex;

use super::templates::SIGNING_FLAG_LINES;
use super::PatchOptions;
use crate::models::SigningReport;

// Keys may carry an SDK condition: "CODE_SIGN_IDENTITY[sdk=macosx*]" = ...;
static CODE_SIGN_IDENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<key>"?\bCODE_SIGN_IDENTITY(?:\[[^\]\n]*\])?"?) = (?:"[^"\n]*"|[^;\n]*);"#)
        .expect("Invalid CODE_SIGN_IDENTITY regex")
});
static CODE_SIGN_STYLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<key>"?\bCODE_SIGN_STYLE(?:\[[^\]\n]*\])?"?) = [^;\n]*;"#)
        .expect("Invalid CODE_SIGN_STYLE regex")
});
static DEVELOPMENT_TEAM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<key>"?\bDEVELOPMENT_TEAM(?:\[[^\]\n]*\])?"?) = [^;\n]*;"#)
        .expect("Invalid DEVELOPMENT_TEAM regex")
});
static PROVISIONING_PROFILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<key>"?\bPROVISIONING_PROFILE_SPECIFIER(?:\[[^\]\n]*\])?"?) = (?:"[^"\n]*"|[^;\n]*);"#)
        .expect("Invalid PROVISIONING_PROFILE_SPECIFIER regex")
});
static BUILD_SETTINGS_OPEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"buildSettings = \{").expect("Invalid buildSettings regex")
});

/// Count matches, then replace them all.
fn replace_counted(regex: &Regex, text: &str, replacement: &str) -> (String, usize) {
    let count = regex.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (regex.replace_all(text, replacement).into_owned(), count)
}

/// True when the block body (text after its `{`) already disables signing.
fn block_has_flags(body: &str) -> bool {
    let end = body.find('}').unwrap_or(body.len());
    body[..end].contains("CODE_SIGNING_REQUIRED = NO;")
}

/// Append the two disabling flags after every `buildSettings = {`.
///
/// Returns the new text with the number of blocks flagged and skipped.
fn flag_build_settings(text: &str, guard_existing: bool) -> (String, usize, usize) {
    let mut out = String::with_capacity(text.len() + 4 * SIGNING_FLAG_LINES.len());
    let mut last = 0;
    let mut flagged = 0;
    let mut skipped = 0;

    for m in BUILD_SETTINGS_OPEN_REGEX.find_iter(text) {
        out.push_str(&text[last..m.end()]);
        last = m.end();
        if guard_existing && block_has_flags(&text[m.end()..]) {
            skipped += 1;
            continue;
        }
        out.push_str(SIGNING_FLAG_LINES);
        flagged += 1;
    }
    out.push_str(&text[last..]);

    (out, flagged, skipped)
}

/// Blank identity, team and profile, force manual style, and mark every
/// build-settings block as not requiring or allowing signing.
///
/// Without `guard_existing` a second run adds the flag lines again.
pub fn normalize_signing_settings(text: &str, options: PatchOptions) -> (String, SigningReport) {
    let mut report = SigningReport::default();

    let (content, n) = replace_counted(&CODE_SIGN_IDENTITY_REGEX, text, r#"${key} = "";"#);
    report.identities_blanked = n;
    let (content, n) = replace_counted(&CODE_SIGN_STYLE_REGEX, &content, "${key} = Manual;");
    report.styles_set_manual = n;
    let (content, n) = replace_counted(&DEVELOPMENT_TEAM_REGEX, &content, r#"${key} = "";"#);
    report.teams_blanked = n;
    let (content, n) = replace_counted(&PROVISIONING_PROFILE_REGEX, &content, r#"${key} = "";"#);
    report.profiles_blanked = n;

    let (content, flagged, skipped) = flag_build_settings(&content, options.guard_existing);
    report.blocks_flagged = flagged;
    report.blocks_skipped = skipped;

    log::info!(
        "[Patcher] [SIGNING] identities={} styles={} teams={} profiles={} blocks_flagged={} blocks_skipped={}",
        report.identities_blanked,
        report.styles_set_manual,
        report.teams_blanked,
        report.profiles_blanked,
        report.blocks_flagged,
        report.blocks_skipped
    );

    (content, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "\t\t\tbuildSettings = {\n\t\t\t\tCODE_SIGN_ENTITLEMENTS = \"App/App.entitlements\";\n\t\t\t\tCODE_SIGN_IDENTITY = \"Apple Development\";\n\t\t\t\t\"CODE_SIGN_IDENTITY[sdk=macosx*]\" = \"-\";\n\t\t\t\tCODE_SIGN_STYLE = Automatic;\n\t\t\t\tDEVELOPMENT_TEAM = 7QX2ABCDEF;\n\t\t\t\tPROVISIONING_PROFILE_SPECIFIER = \"App Dev\";\n\t\t\t};\n";

    #[test]
    fn test_values_blanked() {
        let (out, report) = normalize_signing_settings(BLOCK, PatchOptions::default());
        assert!(out.contains("\tCODE_SIGN_IDENTITY = \"\";"));
        assert!(out.contains("\"CODE_SIGN_IDENTITY[sdk=macosx*]\" = \"\";"));
        assert!(out.contains("CODE_SIGN_STYLE = Manual;"));
        assert!(out.contains("DEVELOPMENT_TEAM = \"\";"));
        assert!(out.contains("PROVISIONING_PROFILE_SPECIFIER = \"\";"));
        assert!(out.contains("CODE_SIGN_ENTITLEMENTS = \"App/App.entitlements\";"));
        assert_eq!(report.identities_blanked, 2);
        assert_eq!(report.styles_set_manual, 1);
        assert_eq!(report.teams_blanked, 1);
        assert_eq!(report.profiles_blanked, 1);
    }

    #[test]
    fn test_flags_follow_block_opening() {
        let (out, report) = normalize_signing_settings(BLOCK, PatchOptions::default());
        assert!(out.starts_with(
            "\t\t\tbuildSettings = {\n\t\t\t\tCODE_SIGNING_REQUIRED = NO;\n\t\t\t\tCODE_SIGNING_ALLOWED = NO;\n\t\t\t\tCODE_SIGN_ENTITLEMENTS"
        ));
        assert_eq!(report.blocks_flagged, 1);
        assert_eq!(out.lines().count(), BLOCK.lines().count() + 2);
    }

    #[test]
    fn test_guard_skips_flagged_block() {
        let options = PatchOptions { guard_existing: true };
        let (once, _) = normalize_signing_settings(BLOCK, options);
        let (twice, report) = normalize_signing_settings(&once, options);
        assert_eq!(once, twice);
        assert_eq!(report.blocks_flagged, 0);
        assert_eq!(report.blocks_skipped, 1);
    }

    #[test]
    fn test_text_without_signing_settings_is_unchanged() {
        let text = "objects = {\n\tA = B;\n};\n";
        let (out, report) = normalize_signing_settings(text, PatchOptions::default());
        assert_eq!(out, text);
        assert_eq!(report.total(), 0);
    }
}
