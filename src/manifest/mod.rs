//! Xcode project manifest handling
//!
//! - identifier: 24-hex object identifiers
//! - parser: read-only structural parser for validation and anchor discovery
//! - patcher: anchor-based text edits and the file-backed patcher

pub mod identifier;
pub mod parser;
pub mod patcher;
