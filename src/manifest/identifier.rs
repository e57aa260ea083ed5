//! 24-character uppercase hex identifiers used as pbxproj object keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of an Xcode object identifier.
pub const IDENTIFIER_LEN: usize = 24;

/// A pbxproj object identifier (e.g. `5B80D9BE2EDCB128000DBD74`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Mint a fresh identifier from the first 24 hex digits of a v4 UUID.
    pub fn random() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Identifier(hex[..IDENTIFIER_LEN].to_ascii_uppercase())
    }

    /// Parse an existing identifier, rejecting anything that is not 24 uppercase hex digits.
    pub fn parse(s: &str) -> Option<Self> {
        if is_identifier(s) {
            Some(Identifier(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True when `s` is exactly 24 uppercase hexadecimal characters.
pub fn is_identifier(s: &str) -> bool {
    s.len() == IDENTIFIER_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}

/// Mint the (file reference, build file) pair for one registration.
///
/// The two are distinct and neither occurs anywhere in `manifest`.
pub fn mint_pair(manifest: &str) -> (Identifier, Identifier) {
    let file_ref = mint_unused(manifest, None);
    let build_file = mint_unused(manifest, Some(&file_ref));
    (file_ref, build_file)
}

fn mint_unused(manifest: &str, taken: Option<&Identifier>) -> Identifier {
    loop {
        let candidate = Identifier::random();
        if taken == Some(&candidate) || manifest.contains(candidate.as_str()) {
            log::debug!("[Identifier] Collision on {}, minting again", candidate);
            continue;
        }
        return candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_identifier_shape() {
        for _ in 0..64 {
            let id = Identifier::random();
            assert_eq!(id.as_str().len(), IDENTIFIER_LEN);
            assert!(is_identifier(id.as_str()), "bad identifier {}", id);
        }
    }

    #[test]
    fn test_parse_rejects_lowercase_and_wrong_length() {
        assert!(Identifier::parse("5B80D9BE2EDCB128000DBD74").is_some());
        assert!(Identifier::parse("5b80d9be2edcb128000dbd74").is_none());
        assert!(Identifier::parse("5B80D9BE2EDCB128000DBD7").is_none());
        assert!(Identifier::parse("5B80D9BE2EDCB128000DBD7G").is_none());
    }

    #[test]
    fn test_mint_pair_is_distinct_and_unused() {
        let manifest = "5B80D9BE2EDCB128000DBD74 /* ContentView.swift */";
        let (a, b) = mint_pair(manifest);
        assert_ne!(a, b);
        assert!(!manifest.contains(a.as_str()));
        assert!(!manifest.contains(b.as_str()));
    }
}
