//! Info.plist key injection through `INFOPLIST_KEY_*` build settings.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::templates::{setting_line, SETTING_INDENT};
use super::{PatchOptions, PatchResult};
use crate::error::PatchError;
use crate::models::EditOutcome;

/// The setting to add and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageDescription {
    pub key: String,
    pub value: String,
    /// Precise anchor; every occurrence gets the new line after it.
    pub primary_anchor: String,
    /// Generic anchor expected in every build-settings block; the new line goes before it.
    pub fallback_anchor: String,
}

impl Default for UsageDescription {
    fn default() -> Self {
        UsageDescription {
            key: "INFOPLIST_KEY_NSHomeKitUsageDescription".to_string(),
            value: "Govee Mac needs access to control your HomeKit-enabled Govee lights.".to_string(),
            primary_anchor: "INFOPLIST_KEY_NSMainStoryboardFile = Main;".to_string(),
            fallback_anchor: "ENABLE_HARDENED_RUNTIME = YES;".to_string(),
        }
    }
}

/// Insert `key = "value";` after the primary anchor, or before the fallback
/// anchor of every build-settings block when the primary anchor is absent.
pub fn inject_usage_description(
    text: &str,
    desc: &UsageDescription,
    options: PatchOptions,
) -> PatchResult<(String, EditOutcome)> {
    if options.guard_existing && text.contains(&format!("{} =", desc.key)) {
        log::info!("[Patcher] [PLIST] {} already present, skipping", desc.key);
        return Ok((text.to_string(), EditOutcome::AlreadyPresent));
    }

    let line = setting_line(&desc.key, &desc.value);

    if !desc.primary_anchor.is_empty() && text.contains(&desc.primary_anchor) {
        let count = text.matches(&desc.primary_anchor).count();
        let replacement = format!("{}\n{}{}", desc.primary_anchor, SETTING_INDENT, line);
        let content = text.replace(&desc.primary_anchor, &replacement);
        log::info!("[Patcher] [PLIST] Added {} after {} ({} location(s))", desc.key, desc.primary_anchor, count);
        return Ok((content, EditOutcome::Applied { count }));
    }

    log::info!("[Patcher] [PLIST] Primary anchor not found, trying build settings fallback");
    if desc.fallback_anchor.is_empty() {
        return Ok((text.to_string(), EditOutcome::NotFound));
    }

    // Non-greedy up to the first fallback anchor without leaving the block.
    let pattern = format!(
        r"(buildSettings = \{{[^}}]*?)({})",
        regex::escape(&desc.fallback_anchor)
    );
    let block_regex = Regex::new(&pattern)
        .map_err(|e| PatchError::RegexInvalid(format!("Invalid fallback regex: {}", e)))?;

    let mut count = 0usize;
    let content = block_regex
        .replace_all(text, |caps: &Captures| {
            count += 1;
            format!("{}{}\n{}{}", &caps[1], line, SETTING_INDENT, &caps[2])
        })
        .into_owned();

    if count == 0 {
        log::warn!("[Patcher] [PLIST] No build settings block contains {}", desc.fallback_anchor);
        return Ok((content, EditOutcome::NotFound));
    }

    log::info!("[Patcher] [PLIST] Added {} via fallback in {} block(s)", desc.key, count);
    Ok((content, EditOutcome::AppliedViaFallback { count }))
}
