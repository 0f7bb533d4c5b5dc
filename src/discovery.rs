//! Scanner
//!
//! Walks both artifact subtrees, parses every candidate file and pairs
//! headers with sources by the class marker they declare. Only a class with
//! exactly one header and exactly one source becomes a [`ScanRecord`].

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::config::ClassConfig;
use crate::error::{CodegenError, Result};
use crate::parse::{parse_header, parse_source, Blocks};
use crate::tree::{ArtifactTree, Subtree};

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRecord {
    pub class_name: String,
    /// Relative to the header subtree. `None` for a class never generated.
    pub header_path: Option<String>,
    /// Relative to the source subtree.
    pub source_path: Option<String>,
    pub config: ClassConfig,
    pub header_blocks: Blocks,
    pub source_blocks: Blocks,
}

impl ScanRecord {
    /// Record for a class with no artifacts yet.
    pub fn fresh(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            ..Default::default()
        }
    }

    pub fn header_path_or_default(&self) -> String {
        self.header_path
            .clone()
            .unwrap_or_else(|| format!("{}.hpp", self.class_name))
    }

    pub fn source_path_or_default(&self) -> String {
        self.source_path
            .clone()
            .unwrap_or_else(|| format!("{}.cpp", self.class_name))
    }
}

/// Why a class name was left out of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub headers: usize,
    pub sources: usize,
}

impl Exclusion {
    pub fn is_ambiguous(&self) -> bool {
        self.headers > 1 || self.sources > 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    records: BTreeMap<String, ScanRecord>,
    excluded: BTreeMap<String, Exclusion>,
}

impl ClassRegistry {
    pub fn get(&self, class_name: &str) -> Option<&ScanRecord> {
        self.records.get(class_name)
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.records.contains_key(class_name)
    }

    /// Records in class-name order.
    pub fn iter(&self) -> impl Iterator<Item = &ScanRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn excluded(&self) -> &BTreeMap<String, Exclusion> {
        &self.excluded
    }

    pub fn insert(&mut self, record: ScanRecord) {
        self.records.insert(record.class_name.clone(), record);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCAN
// ═══════════════════════════════════════════════════════════════════════════════

struct HeaderHit {
    path: String,
    config: ClassConfig,
    blocks: Blocks,
}

struct SourceHit {
    path: String,
    blocks: Blocks,
}

/// Build the registry from on-disk state. A parse error anywhere aborts the
/// scan. With `strict`, an ambiguous class is an error instead of a note.
pub fn scan<T: ArtifactTree + ?Sized>(tree: &T, strict: bool) -> Result<ClassRegistry> {
    let mut headers: BTreeMap<String, Vec<HeaderHit>> = BTreeMap::new();
    let mut sources: BTreeMap<String, Vec<SourceHit>> = BTreeMap::new();

    for rel in tree.list(Subtree::Headers)? {
        let text = tree.read(Subtree::Headers, &rel)?;
        let shown = tree.display_path(Subtree::Headers, &rel);
        if let Some(parsed) = parse_header(&text, &shown)? {
            debug!("{} declares {}", shown.display(), parsed.class_name);
            headers
                .entry(parsed.class_name)
                .or_default()
                .push(HeaderHit {
                    path: rel,
                    config: parsed.config,
                    blocks: parsed.blocks,
                });
        }
    }

    for rel in tree.list(Subtree::Sources)? {
        let text = tree.read(Subtree::Sources, &rel)?;
        let shown = tree.display_path(Subtree::Sources, &rel);
        if let Some(parsed) = parse_source(&text, &shown)? {
            debug!("{} defines {}", shown.display(), parsed.class_name);
            sources
                .entry(parsed.class_name)
                .or_default()
                .push(SourceHit {
                    path: rel,
                    blocks: parsed.blocks,
                });
        }
    }

    let names: BTreeSet<String> = headers.keys().chain(sources.keys()).cloned().collect();
    let mut registry = ClassRegistry::default();

    for name in names {
        let mut header_hits = headers.remove(&name).unwrap_or_default();
        let mut source_hits = sources.remove(&name).unwrap_or_default();

        if header_hits.len() == 1 && source_hits.len() == 1 {
            let (header, source) = match (header_hits.pop(), source_hits.pop()) {
                (Some(h), Some(s)) => (h, s),
                _ => continue,
            };
            registry.insert(ScanRecord {
                class_name: name,
                header_path: Some(header.path),
                source_path: Some(source.path),
                config: header.config,
                header_blocks: header.blocks,
                source_blocks: source.blocks,
            });
            continue;
        }

        let exclusion = Exclusion {
            headers: header_hits.len(),
            sources: source_hits.len(),
        };
        if exclusion.is_ambiguous() {
            if strict {
                return Err(CodegenError::Ambiguous {
                    class: name,
                    headers: exclusion.headers,
                    sources: exclusion.sources,
                });
            }
            info!(
                "Class {} is ambiguous ({} header(s), {} source(s)); treating as not generated",
                name, exclusion.headers, exclusion.sources
            );
        } else {
            info!(
                "Class {} is incomplete ({} header(s), {} source(s)); treating as not generated",
                name, exclusion.headers, exclusion.sources
            );
        }
        registry.excluded.insert(name, exclusion);
    }

    Ok(registry)
}
