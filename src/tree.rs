//! Artifact tree access.
//!
//! The generator never touches the filesystem directly; it goes through
//! [`ArtifactTree`], which has a disk implementation and an in-memory one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CodegenError, Result};

/// One of the two parallel artifact subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subtree {
    /// Declarations (`.hpp`).
    Headers,
    /// Definitions (`.cpp`).
    Sources,
}

impl Subtree {
    pub fn extension(&self) -> &'static str {
        match self {
            Subtree::Headers => "hpp",
            Subtree::Sources => "cpp",
        }
    }
}

pub trait ArtifactTree {
    /// Relative paths (forward slashes, sorted) of every artifact candidate.
    fn list(&self, subtree: Subtree) -> Result<Vec<String>>;

    fn read(&self, subtree: Subtree, rel_path: &str) -> Result<String>;

    /// Whole-file overwrite, creating parent directories as needed.
    fn write(&mut self, subtree: Subtree, rel_path: &str, contents: &str) -> Result<()>;

    /// Display path used in messages and parse errors.
    fn display_path(&self, subtree: Subtree, rel_path: &str) -> PathBuf;
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISK
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct DiskTree {
    include_dir: PathBuf,
    source_dir: PathBuf,
}

impl DiskTree {
    pub fn new(include_dir: impl Into<PathBuf>, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            include_dir: include_dir.into(),
            source_dir: source_dir.into(),
        }
    }

    fn root(&self, subtree: Subtree) -> &Path {
        match subtree {
            Subtree::Headers => &self.include_dir,
            Subtree::Sources => &self.source_dir,
        }
    }
}

impl ArtifactTree for DiskTree {
    fn list(&self, subtree: Subtree) -> Result<Vec<String>> {
        let root = self.root(subtree);
        if !root.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                CodegenError::io(path, e.into())
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != subtree.extension())
            {
                continue;
            }
            if let Ok(rel) = path.strip_prefix(root) {
                files.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
        files.sort();

        Ok(files)
    }

    fn read(&self, subtree: Subtree, rel_path: &str) -> Result<String> {
        let path = self.root(subtree).join(rel_path);
        fs::read_to_string(&path).map_err(|e| CodegenError::io(path, e))
    }

    fn write(&mut self, subtree: Subtree, rel_path: &str, contents: &str) -> Result<()> {
        let path = self.root(subtree).join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CodegenError::io(parent, e))?;
        }
        fs::write(&path, contents).map_err(|e| CodegenError::io(path, e))
    }

    fn display_path(&self, subtree: Subtree, rel_path: &str) -> PathBuf {
        self.root(subtree).join(rel_path)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MEMORY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTree {
    pub headers: BTreeMap<String, String>,
    pub sources: BTreeMap<String, String>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self, subtree: Subtree) -> &BTreeMap<String, String> {
        match subtree {
            Subtree::Headers => &self.headers,
            Subtree::Sources => &self.sources,
        }
    }

    pub fn get(&self, subtree: Subtree, rel_path: &str) -> Option<&str> {
        self.files(subtree).get(rel_path).map(String::as_str)
    }

    pub fn insert(&mut self, subtree: Subtree, rel_path: &str, contents: impl Into<String>) {
        let files = match subtree {
            Subtree::Headers => &mut self.headers,
            Subtree::Sources => &mut self.sources,
        };
        files.insert(rel_path.to_string(), contents.into());
    }
}

impl ArtifactTree for MemoryTree {
    fn list(&self, subtree: Subtree) -> Result<Vec<String>> {
        let suffix = format!(".{}", subtree.extension());
        Ok(self
            .files(subtree)
            .keys()
            .filter(|k| k.ends_with(&suffix))
            .cloned()
            .collect())
    }

    fn read(&self, subtree: Subtree, rel_path: &str) -> Result<String> {
        self.get(subtree, rel_path).map(str::to_string).ok_or_else(|| {
            CodegenError::io(
                self.display_path(subtree, rel_path),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such artifact"),
            )
        })
    }

    fn write(&mut self, subtree: Subtree, rel_path: &str, contents: &str) -> Result<()> {
        self.insert(subtree, rel_path, contents);
        Ok(())
    }

    fn display_path(&self, subtree: Subtree, rel_path: &str) -> PathBuf {
        let root = match subtree {
            Subtree::Headers => "include",
            Subtree::Sources => "src",
        };
        Path::new(root).join(rel_path)
    }
}
