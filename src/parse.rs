//! Block Parser
//!
//! Extracts the marked structure of a generated artifact: the class identity
//! marker, the embedded configuration region (headers only) and the
//! identified blocks. Everything outside those spans is ignored; the
//! generator rebuilds it from the artifact template.
//!
//! ```text
//! // @sbx-class Sound
//! /* @sbx-config
//! { "members": { "Play": { "virtual": true } } }
//! @sbx-config-end */
//! // @sbx-begin keep Method:Play
//! ...verbatim text...
//! // @sbx-end
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::api::MemberKind;
use crate::config::ClassConfig;
use crate::error::{CodegenError, Result};

lazy_static! {
    static ref CLASS_RE: Regex =
        Regex::new(r"^\s*//\s*@sbx-class\s+([A-Za-z_][A-Za-z0-9_]*)\s*$").unwrap();

    /// Used to decide whether a file is an artifact at all
    static ref CLASS_ANYWHERE_RE: Regex =
        Regex::new(r"(?m)^\s*//\s*@sbx-class\s+[A-Za-z_][A-Za-z0-9_]*\s*\r?$").unwrap();

    static ref BEGIN_RE: Regex = Regex::new(r"^\s*//\s*@sbx-begin\s+(\S+)\s+(\S+)\s*$").unwrap();

    static ref END_RE: Regex = Regex::new(r"^\s*//\s*@sbx-end\s*$").unwrap();

    static ref CONFIG_BEGIN_RE: Regex = Regex::new(r"^\s*/\*\s*@sbx-config\s*$").unwrap();

    static ref CONFIG_END_RE: Regex = Regex::new(r"^\s*@sbx-config-end\s*\*/\s*$").unwrap();

    /// Anything that looks like a marker but matched none of the above
    static ref MARKER_PREFIX_RE: Regex = Regex::new(r"^\s*(//\s*@sbx-|/\*\s*@sbx-)").unwrap();
}

pub const CLASS_MARKER: &str = "// @sbx-class";
pub const BEGIN_MARKER: &str = "// @sbx-begin";
pub const END_MARKER: &str = "// @sbx-end";
pub const CONFIG_BEGIN_MARKER: &str = "/* @sbx-config";
pub const CONFIG_END_MARKER: &str = "@sbx-config-end */";

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCK TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Re-derived on every run.
    Generated,
    /// Carried forward verbatim.
    Preserved,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Generated => "gen",
            Origin::Preserved => "keep",
        }
    }
}

impl FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "gen" => Ok(Origin::Generated),
            "keep" => Ok(Origin::Preserved),
            other => Err(format!("unknown block origin '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockKind {
    Member(MemberKind),
    /// Fixed template regions not tied to a member.
    Section,
}

/// Stable identity of a block: kind plus name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId {
    pub kind: BlockKind,
    pub name: String,
}

impl BlockId {
    pub fn member(kind: MemberKind, name: &str) -> Self {
        Self {
            kind: BlockKind::Member(kind),
            name: name.to_string(),
        }
    }

    pub fn section(name: &str) -> Self {
        Self {
            kind: BlockKind::Section,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            BlockKind::Member(kind) => kind.as_str(),
            BlockKind::Section => "Section",
        };
        write!(f, "{}:{}", kind, self.name)
    }
}

impl FromStr for BlockId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, name) = s
            .split_once(':')
            .ok_or_else(|| format!("block identity '{}' is not Kind:Name", s))?;
        if name.is_empty() {
            return Err(format!("block identity '{}' has no name", s));
        }
        let kind = match kind {
            "Method" => BlockKind::Member(MemberKind::Method),
            "Property" => BlockKind::Member(MemberKind::Property),
            "Event" => BlockKind::Member(MemberKind::Event),
            "Callback" => BlockKind::Member(MemberKind::Callback),
            "Section" => BlockKind::Section,
            other => return Err(format!("unknown block kind '{}'", other)),
        };
        Ok(BlockId {
            kind,
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub origin: Origin,
    /// Lines between the markers, line endings included.
    pub text: String,
}

/// Blocks of one artifact in file order. Identities are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocks(Vec<Block>);

impl Blocks {
    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.0.iter().find(|b| &b.id == id)
    }

    /// Text of a preserved block with this identity, if any.
    pub fn preserved(&self, id: &BlockId) -> Option<&str> {
        self.get(id)
            .filter(|b| b.origin == Origin::Preserved)
            .map(|b| b.text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Block> for Blocks {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        Blocks(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    pub class_name: String,
    pub config: ClassConfig,
    pub blocks: Blocks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSource {
    pub class_name: String,
    pub blocks: Blocks,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a declaration artifact. `Ok(None)` when the file carries no class
/// marker; malformed markers are an error naming `path`.
pub fn parse_header(text: &str, path: &Path) -> Result<Option<ParsedHeader>> {
    Ok(scan_markers(text, path, true)?.map(|s| ParsedHeader {
        class_name: s.class_name,
        config: s.config.unwrap_or_default(),
        blocks: s.blocks,
    }))
}

/// Parse a definition artifact.
pub fn parse_source(text: &str, path: &Path) -> Result<Option<ParsedSource>> {
    Ok(scan_markers(text, path, false)?.map(|s| ParsedSource {
        class_name: s.class_name,
        blocks: s.blocks,
    }))
}

struct Scanned {
    class_name: String,
    config: Option<ClassConfig>,
    blocks: Blocks,
}

enum State {
    Outside,
    InBlock {
        id: BlockId,
        origin: Origin,
        start: usize,
        text: String,
    },
    InConfig {
        start: usize,
        text: String,
    },
}

fn scan_markers(text: &str, path: &Path, allow_config: bool) -> Result<Option<Scanned>> {
    if !CLASS_ANYWHERE_RE.is_match(text) {
        return Ok(None);
    }

    let mut class_name: Option<String> = None;
    let mut config: Option<ClassConfig> = None;
    let mut blocks: Vec<Block> = Vec::new();
    let mut state = State::Outside;

    for (idx, raw_line) in text.split_inclusive('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches(['\n', '\r']);

        state = match state {
            State::InConfig { start, mut text } => {
                if CONFIG_END_RE.is_match(line) {
                    let parsed = ClassConfig::from_json(&text).map_err(|e| {
                        CodegenError::parse(path, start, format!("invalid configuration: {}", e))
                    })?;
                    config = Some(parsed);
                    State::Outside
                } else {
                    text.push_str(raw_line);
                    State::InConfig { start, text }
                }
            }
            State::InBlock {
                id,
                origin,
                start,
                mut text,
            } => {
                if END_RE.is_match(line) {
                    blocks.push(Block { id, origin, text });
                    State::Outside
                } else if MARKER_PREFIX_RE.is_match(line) {
                    return Err(CodegenError::parse(
                        path,
                        line_no,
                        format!("marker inside block {} opened at line {}", id, start),
                    ));
                } else {
                    text.push_str(raw_line);
                    State::InBlock {
                        id,
                        origin,
                        start,
                        text,
                    }
                }
            }
            State::Outside => {
                if let Some(cap) = CLASS_RE.captures(line) {
                    if class_name.is_some() {
                        return Err(CodegenError::parse(path, line_no, "duplicate class marker"));
                    }
                    class_name = Some(cap[1].to_string());
                    State::Outside
                } else if let Some(cap) = BEGIN_RE.captures(line) {
                    let origin: Origin = cap[1]
                        .parse()
                        .map_err(|e: String| CodegenError::parse(path, line_no, e))?;
                    let id: BlockId = cap[2]
                        .parse()
                        .map_err(|e: String| CodegenError::parse(path, line_no, e))?;
                    if blocks.iter().any(|b| b.id == id) {
                        return Err(CodegenError::parse(
                            path,
                            line_no,
                            format!("duplicate block {}", id),
                        ));
                    }
                    State::InBlock {
                        id,
                        origin,
                        start: line_no,
                        text: String::new(),
                    }
                } else if END_RE.is_match(line) {
                    return Err(CodegenError::parse(path, line_no, "block end without begin"));
                } else if CONFIG_BEGIN_RE.is_match(line) {
                    if !allow_config {
                        return Err(CodegenError::parse(
                            path,
                            line_no,
                            "configuration region outside a header",
                        ));
                    }
                    if config.is_some() {
                        return Err(CodegenError::parse(
                            path,
                            line_no,
                            "duplicate configuration region",
                        ));
                    }
                    State::InConfig {
                        start: line_no,
                        text: String::new(),
                    }
                } else if MARKER_PREFIX_RE.is_match(line) {
                    return Err(CodegenError::parse(path, line_no, "malformed marker"));
                } else {
                    State::Outside
                }
            }
        };
    }

    match state {
        State::Outside => {}
        State::InBlock { id, start, .. } => {
            return Err(CodegenError::parse(
                path,
                start,
                format!("unterminated block {}", id),
            ));
        }
        State::InConfig { start, .. } => {
            return Err(CodegenError::parse(
                path,
                start,
                "unterminated configuration region",
            ));
        }
    }

    Ok(class_name.map(|class_name| Scanned {
        class_name,
        config,
        blocks: blocks.into_iter().collect(),
    }))
}
