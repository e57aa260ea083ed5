//! Read-only parser for the old-style ASCII property list used by `project.pbxproj`.
//!
//! Handles:
//! - the `// !$*UTF8*$!` header and any other `//` line comment
//! - `/* ... */` block comments (Xcode's display-name annotations)
//! - quoted strings with backslash escapes and bare words
//! - `{ key = value; }` dictionaries and `( a, b, )` arrays
//!
//! The patch operations never rewrite through this tree. It exists to validate
//! a manifest and to discover the identifiers behind a sibling file's anchors.

use std::collections::BTreeMap;

use crate::error::ParseError;

/// A parsed property-list value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbxValue {
    String(String),
    Array(Vec<PbxValue>),
    Dict(PbxDict),
}

impl PbxValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PbxValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[PbxValue]> {
        match self {
            PbxValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&PbxDict> {
        match self {
            PbxValue::Dict(d) => Some(d),
            _ => None,
        }
    }
}

/// Dictionary preserving the manifest's key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PbxDict {
    entries: Vec<(String, PbxValue)>,
}

impl PbxDict {
    pub fn get(&self, key: &str) -> Option<&PbxValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PbxValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PbxValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Identifiers behind a registered source file, used to build its four anchors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingIds {
    pub file_reference: String,
    pub build_file: String,
}

/// A parsed manifest with convenience lookups over its `objects` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbxProject {
    pub root: PbxDict,
}

impl PbxProject {
    pub fn objects(&self) -> Option<&PbxDict> {
        self.root.get("objects").and_then(PbxValue::as_dict)
    }

    /// All objects whose `isa` equals `isa`, as `(identifier, body)` pairs.
    pub fn objects_by_isa<'a>(&'a self, isa: &'a str) -> impl Iterator<Item = (&'a str, &'a PbxDict)> + 'a {
        self.objects()
            .into_iter()
            .flat_map(|objects| objects.iter())
            .filter_map(move |(id, value)| {
                let body = value.as_dict()?;
                (body.get_str("isa") == Some(isa)).then_some((id, body))
            })
    }

    /// Number of objects per `isa`, sorted by name.
    pub fn isa_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        if let Some(objects) = self.objects() {
            for (_, value) in objects.iter() {
                if let Some(isa) = value.as_dict().and_then(|d| d.get_str("isa")) {
                    *counts.entry(isa.to_string()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    pub fn build_settings_count(&self) -> usize {
        self.objects_by_isa("XCBuildConfiguration")
            .filter(|(_, body)| body.get("buildSettings").is_some())
            .count()
    }

    /// Identifier of the file reference whose `name` or `path` is `display_name`.
    pub fn find_file_reference(&self, display_name: &str) -> Option<&str> {
        self.objects_by_isa("PBXFileReference")
            .find(|(_, body)| {
                body.get_str("name") == Some(display_name)
                    || body.get_str("path") == Some(display_name)
            })
            .map(|(id, _)| id)
    }

    /// Identifier of the build file pointing at `file_ref`.
    pub fn find_build_file(&self, file_ref: &str) -> Option<&str> {
        self.objects_by_isa("PBXBuildFile")
            .find(|(_, body)| body.get_str("fileRef") == Some(file_ref))
            .map(|(id, _)| id)
    }

    pub fn sibling_ids(&self, display_name: &str) -> Option<SiblingIds> {
        let file_reference = self.find_file_reference(display_name)?;
        let build_file = self.find_build_file(file_reference)?;
        Some(SiblingIds {
            file_reference: file_reference.to_string(),
            build_file: build_file.to_string(),
        })
    }
}

/// Parse a whole manifest. The top level must be a dictionary.
pub fn parse_project(content: &str) -> Result<PbxProject, ParseError> {
    match parse(content)? {
        PbxValue::Dict(root) => Ok(PbxProject { root }),
        _ => Err(ParseError::new(1, 1, "top-level value is not a dictionary")),
    }
}

/// Parse a single property-list value followed by end of input.
pub fn parse(content: &str) -> Result<PbxValue, ParseError> {
    let mut parser = Parser::new(content);
    parser.skip_trivia()?;
    let value = parser.parse_value()?;
    parser.skip_trivia()?;
    if let Some(ch) = parser.peek() {
        return Err(parser.error(format!("unexpected '{}' after top-level value", ch)));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Parser {
    fn new(content: &str) -> Self {
        Parser {
            chars: content.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, self.column, message)
    }

    /// Skip whitespace and both comment styles.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(ParseError::new(line, column, "unterminated comment"));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", expected, c))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn parse_value(&mut self) -> Result<PbxValue, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('{') => self.parse_dict().map(PbxValue::Dict),
            Some('(') => self.parse_array().map(PbxValue::Array),
            Some(_) => self.parse_string().map(PbxValue::String),
            None => Err(self.error("expected a value, found end of input")),
        }
    }

    fn parse_dict(&mut self) -> Result<PbxDict, ParseError> {
        self.expect('{')?;
        let mut dict = PbxDict::default();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(dict);
                }
                None => return Err(self.error("unterminated dictionary")),
                _ => {}
            }
            let key = self.parse_string()?;
            self.expect('=')?;
            let value = self.parse_value()?;
            self.expect(';')?;
            dict.entries.push((key, value));
        }
    }

    fn parse_array(&mut self) -> Result<Vec<PbxValue>, ParseError> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(')') => {
                    self.bump();
                    return Ok(items);
                }
                None => return Err(self.error("unterminated array")),
                _ => {}
            }
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                Some(c) => return Err(self.error(format!("expected ',' or ')', found '{}'", c))),
                None => return Err(self.error("unterminated array")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some('"') => self.parse_quoted(),
            Some(c) if is_bare_char(c) => {
                let mut word = String::new();
                while let Some(c) = self.peek() {
                    if !is_bare_char(c) {
                        break;
                    }
                    word.push(c);
                    self.bump();
                }
                Ok(word)
            }
            Some(c) => Err(self.error(format!("unexpected '{}'", c))),
            None => Err(self.error("expected a string, found end of input")),
        }
    }

    fn parse_quoted(&mut self) -> Result<String, ParseError> {
        let (line, column) = (self.line, self.column);
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => break,
                },
                Some(c) => out.push(c),
                None => break,
            }
        }
        Err(ParseError::new(line, column, "unterminated string"))
    }
}

fn is_bare_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '{' | '}' | '(' | ')' | '=' | ';' | ',' | '"')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 77;
	objects = {

/* Begin PBXBuildFile section */
		5B80D9BF2EDCB128000DBD74 /* ContentView.swift in Sources */ = {isa = PBXBuildFile; fileRef = 5B80D9BE2EDCB128000DBD74 /* ContentView.swift */; };
/* End PBXBuildFile section */

/* Begin PBXFileReference section */
		5B80D9BE2EDCB128000DBD74 /* ContentView.swift */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = ContentView.swift; sourceTree = "<group>"; };
/* End PBXFileReference section */
	};
	rootObject = 5B80D9B02EDCB128000DBD74 /* Project object */;
}
"#;

    #[test]
    fn test_parse_small_project() {
        let project = parse_project(SMALL).unwrap();
        assert_eq!(project.root.get_str("archiveVersion"), Some("1"));
        assert_eq!(project.root.get_str("rootObject"), Some("5B80D9B02EDCB128000DBD74"));
        let counts = project.isa_counts();
        assert_eq!(counts.get("PBXBuildFile"), Some(&1));
        assert_eq!(counts.get("PBXFileReference"), Some(&1));
    }

    #[test]
    fn test_sibling_ids_lookup() {
        let project = parse_project(SMALL).unwrap();
        let ids = project.sibling_ids("ContentView.swift").unwrap();
        assert_eq!(ids.file_reference, "5B80D9BE2EDCB128000DBD74");
        assert_eq!(ids.build_file, "5B80D9BF2EDCB128000DBD74");
        assert!(project.sibling_ids("Missing.swift").is_none());
    }

    #[test]
    fn test_quoted_strings_and_arrays() {
        let value = parse(r#"{ a = "x \"y\" z"; b = (one, "two", ); c = (); }"#).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.get_str("a"), Some("x \"y\" z"));
        assert_eq!(dict.get("b").and_then(PbxValue::as_array).map(|a| a.len()), Some(2));
        assert_eq!(dict.get("c").and_then(PbxValue::as_array).map(|a| a.len()), Some(0));
    }

    #[test]
    fn test_unbalanced_brace_is_positioned_error() {
        let err = parse("{\n\ta = 1;\n\tb = {\n\t\tc = 2;\n").unwrap_err();
        assert_eq!(err.message, "unterminated dictionary");
        assert_eq!(err.line, 5);
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse("{ a = 1 b = 2; }").unwrap_err();
        assert!(err.message.contains("expected ';'"), "{}", err);
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(parse("{ } }").is_err());
    }
}
