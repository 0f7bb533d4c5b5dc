//! Tool settings.
//!
//! Read from an optional TOML file; every key has a default matching the
//! shadowblox repository layout. Relative paths resolve against the
//! directory of the settings file, or the working directory when there is
//! no file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CodegenError, Result};
use crate::types::{TypeMapper, TypeMapping};

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "sbxcg.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Root of the declaration subtree.
    pub include_dir: PathBuf,
    /// Root of the definition subtree.
    pub source_dir: PathBuf,
    pub dump_path: PathBuf,
    /// Include path prefix of generated headers, as seen by the compiler.
    pub include_prefix: String,
    pub namespace: String,
    /// Ambiguous classes abort the scan instead of being skipped.
    pub strict_scan: bool,
    /// Extra or overriding type mappings.
    pub types: BTreeMap<String, TypeMapping>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include_dir: PathBuf::from("shadowblox/include/Sbx/Classes"),
            source_dir: PathBuf::from("shadowblox/src/Classes"),
            dump_path: PathBuf::from("sbxcg/data/api_dump.json"),
            include_prefix: "Sbx/Classes".to_string(),
            namespace: "SBX::Classes".to_string(),
            strict_scan: false,
            types: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(text).map_err(|e| CodegenError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load `path`, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
        let settings = Self::from_toml(&text)
            .map_err(|e| CodegenError::Settings(format!("{}: {}", path.display(), e)))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        debug!("Loaded settings from {}", path.display());
        Ok(settings.rebased(base))
    }

    /// `explicit` if given (must exist), else [`DEFAULT_SETTINGS_FILE`] under
    /// `cwd` if present, else defaults rooted at `cwd`.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = cwd.join(DEFAULT_SETTINGS_FILE);
        if candidate.is_file() {
            return Self::load(&candidate);
        }
        debug!("No {} found, using defaults", DEFAULT_SETTINGS_FILE);
        Ok(Self::default().rebased(cwd))
    }

    fn rebased(mut self, base: &Path) -> Self {
        for path in [&mut self.include_dir, &mut self.source_dir, &mut self.dump_path] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.include_prefix.ends_with('/') {
            return Err(CodegenError::Settings(
                "include_prefix must not end with '/'".to_string(),
            ));
        }
        if self.namespace.trim().is_empty() {
            return Err(CodegenError::Settings("namespace is empty".to_string()));
        }
        if let Some((name, _)) = self.types.iter().find(|(_, m)| m.target.trim().is_empty()) {
            return Err(CodegenError::Settings(format!(
                "type mapping for {} has an empty target",
                name
            )));
        }
        Ok(())
    }

    /// Built-in mappings overlaid with `types`.
    pub fn type_mapper(&self) -> TypeMapper {
        TypeMapper::with_overrides(self.types.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::discover(None, dir.path()).unwrap();
        assert_eq!(
            settings.include_dir,
            dir.path().join("shadowblox/include/Sbx/Classes")
        );
        assert_eq!(settings.namespace, "SBX::Classes");
        assert!(!settings.strict_scan);
    }

    #[test]
    fn test_file_paths_resolve_against_file_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        fs::write(
            &path,
            r#"
include_dir = "inc"
strict_scan = true

[types.Vector2]
type = "DataTypes::Vector2"
include = '"Sbx/DataTypes/Vector2.hpp"'
"#,
        )
        .unwrap();

        let settings = Settings::discover(None, dir.path()).unwrap();
        assert_eq!(settings.include_dir, dir.path().join("inc"));
        assert_eq!(settings.source_dir, dir.path().join("shadowblox/src/Classes"));
        assert!(settings.strict_scan);

        let mapper = settings.type_mapper();
        assert_eq!(mapper.resolve("Vector2").unwrap().target, "DataTypes::Vector2");
        assert_eq!(mapper.resolve("float").unwrap().target, "float");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            Settings::from_toml("include_dirs = \"x\""),
            Err(CodegenError::Settings(_))
        ));
    }

    #[test]
    fn test_trailing_slash_prefix_is_rejected() {
        assert!(Settings::from_toml("include_prefix = \"Sbx/Classes/\"").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Settings::discover(Some(&missing), dir.path()),
            Err(CodegenError::Io { .. })
        ));
    }
}
