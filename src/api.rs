//! API Metadata Store
//!
//! Loads the engine API dump once and exposes it as an immutable handle.
//! The handle is passed explicitly to everything that needs metadata, so a
//! test can inject a fixture without any process-wide state.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{CodegenError, Result};

/// Superclass marker used by the dump for the hierarchy root.
pub const ROOT_SUPERCLASS: &str = "<<<ROOT>>>";

// ═══════════════════════════════════════════════════════════════════════════════
// METADATA TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub enum MemberKind {
    #[serde(rename = "Function")]
    Method,
    Property,
    Event,
    Callback,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Method => "Method",
            MemberKind::Property => "Property",
            MemberKind::Event => "Event",
            MemberKind::Callback => "Callback",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type reference as it appears in the dump (`{Category, Name}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeRef {
    #[serde(default)]
    pub category: String,
    pub name: String,
}

impl TypeRef {
    pub fn is_void(&self) -> bool {
        self.name == "null"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Security {
    pub read: String,
    pub write: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub parameters: Vec<Parameter>,
    /// Return type for methods and callbacks, value type for properties.
    pub return_type: Option<TypeRef>,
    pub tags: BTreeSet<String>,
    pub security: Security,
    pub thread_safety: String,
    /// Property category (`Data`, `Behavior`, ...).
    pub category: Option<String>,
    pub can_load: bool,
    pub can_save: bool,
}

impl Member {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub name: String,
    /// `None` for the hierarchy root.
    pub superclass: Option<String>,
    pub memory_category: String,
    pub members: Vec<Member>,
    pub tags: BTreeSet<String>,
}

impl ClassMetadata {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RAW DUMP FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawDump {
    classes: Vec<RawClass>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawClass {
    name: String,
    #[serde(default)]
    superclass: Option<String>,
    #[serde(default)]
    memory_category: Option<String>,
    #[serde(default)]
    members: Vec<RawMember>,
    #[serde(default)]
    tags: Vec<RawTag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawMember {
    member_type: MemberKind,
    name: String,
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(default)]
    return_type: Option<TypeRef>,
    #[serde(default)]
    value_type: Option<TypeRef>,
    #[serde(default)]
    tags: Vec<RawTag>,
    #[serde(default)]
    security: Option<RawSecurity>,
    #[serde(default)]
    thread_safety: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    serialization: Option<RawSerialization>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawParameter {
    name: String,
    #[serde(rename = "Type")]
    ty: TypeRef,
}

/// Tags are mostly strings; structured tags (e.g. preferred descriptors) are
/// not meaningful to the generator.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTag {
    Name(String),
    Structured(serde::de::IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSecurity {
    Single(String),
    #[serde(rename_all = "PascalCase")]
    Split { read: String, write: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawSerialization {
    #[serde(default = "default_true")]
    can_load: bool,
    #[serde(default = "default_true")]
    can_save: bool,
}

fn default_true() -> bool {
    true
}

fn tag_names(tags: Vec<RawTag>) -> BTreeSet<String> {
    tags.into_iter()
        .filter_map(|t| match t {
            RawTag::Name(name) => Some(name),
            RawTag::Structured(_) => None,
        })
        .collect()
}

impl From<RawMember> for Member {
    fn from(raw: RawMember) -> Self {
        let security = match raw.security {
            Some(RawSecurity::Single(level)) => Security {
                read: level.clone(),
                write: level,
            },
            Some(RawSecurity::Split { read, write }) => Security { read, write },
            None => Security {
                read: "None".to_string(),
                write: "None".to_string(),
            },
        };
        let (can_load, can_save) = raw
            .serialization
            .map(|s| (s.can_load, s.can_save))
            .unwrap_or((true, true));
        let return_type = match raw.member_type {
            MemberKind::Property => raw.value_type,
            MemberKind::Event => None,
            MemberKind::Method | MemberKind::Callback => raw.return_type,
        };

        Member {
            name: raw.name,
            kind: raw.member_type,
            parameters: raw
                .parameters
                .into_iter()
                .map(|p| Parameter {
                    name: p.name,
                    ty: p.ty,
                })
                .collect(),
            return_type,
            tags: tag_names(raw.tags),
            security,
            thread_safety: raw.thread_safety.unwrap_or_else(|| "Unsafe".to_string()),
            category: raw.category,
            can_load,
            can_save,
        }
    }
}

impl From<RawClass> for ClassMetadata {
    fn from(raw: RawClass) -> Self {
        ClassMetadata {
            name: raw.name,
            superclass: raw
                .superclass
                .filter(|s| !s.is_empty() && s != ROOT_SUPERCLASS),
            memory_category: raw.memory_category.unwrap_or_else(|| "Instances".to_string()),
            members: raw.members.into_iter().map(Member::from).collect(),
            tags: tag_names(raw.tags),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DUMP HANDLE
// ═══════════════════════════════════════════════════════════════════════════════

/// The loaded API dump. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct ApiDump {
    classes: Vec<ClassMetadata>,
    index: HashMap<String, usize>,
}

impl ApiDump {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawDump = serde_json::from_str(json)?;
        Ok(Self::from_classes(
            raw.classes.into_iter().map(ClassMetadata::from).collect(),
        ))
    }

    /// Missing or corrupt backing data is fatal; there is no partial mode.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;
        let dump = Self::from_json(&json)?;
        debug!("Loaded {} classes from {}", dump.classes.len(), path.display());
        Ok(dump)
    }

    pub fn from_classes(classes: Vec<ClassMetadata>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self { classes, index }
    }

    pub fn classes(&self) -> &[ClassMetadata] {
        &self.classes
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn find_class(&self, name: &str) -> Result<&ClassMetadata> {
        self.index
            .get(name)
            .map(|&i| &self.classes[i])
            .ok_or_else(|| CodegenError::class_not_found(name))
    }

    pub fn find_member(&self, class: &str, name: &str) -> Result<&Member> {
        self.find_class(class)?
            .member(name)
            .ok_or_else(|| CodegenError::member_not_found(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "Version": 1,
        "Classes": [
            {
                "Name": "Instance",
                "Superclass": "<<<ROOT>>>",
                "MemoryCategory": "Instances",
                "Tags": ["NotCreatable", "NotReplicated"],
                "Members": []
            },
            {
                "Name": "Sound",
                "Superclass": "Instance",
                "Tags": [],
                "Members": [
                    {
                        "MemberType": "Function",
                        "Name": "Play",
                        "Parameters": [],
                        "ReturnType": { "Category": "Primitive", "Name": "null" },
                        "Security": "None",
                        "ThreadSafety": "Unsafe",
                        "Tags": []
                    },
                    {
                        "MemberType": "Property",
                        "Name": "Volume",
                        "ValueType": { "Category": "Primitive", "Name": "float" },
                        "Security": { "Read": "None", "Write": "PluginSecurity" },
                        "Category": "Data",
                        "Serialization": { "CanLoad": true, "CanSave": false },
                        "Tags": ["ReadOnly", { "PreferredDescriptorName": "Loudness" }]
                    }
                ]
            }
        ],
        "Enums": []
    }"#;

    #[test]
    fn test_class_lookup() {
        let dump = ApiDump::from_json(DUMP).unwrap();
        let sound = dump.find_class("Sound").unwrap();
        assert_eq!(sound.superclass.as_deref(), Some("Instance"));
        assert_eq!(sound.memory_category, "Instances");
        assert!(dump.find_class("Workspace").is_err());
    }

    #[test]
    fn test_root_superclass_is_dropped() {
        let dump = ApiDump::from_json(DUMP).unwrap();
        assert_eq!(dump.find_class("Instance").unwrap().superclass, None);
    }

    #[test]
    fn test_member_normalization() {
        let dump = ApiDump::from_json(DUMP).unwrap();
        let volume = dump.find_member("Sound", "Volume").unwrap();
        assert_eq!(volume.kind, MemberKind::Property);
        assert_eq!(volume.return_type.as_ref().unwrap().name, "float");
        assert_eq!(volume.security.write, "PluginSecurity");
        assert!(!volume.can_save);
        // Structured tags are dropped
        assert_eq!(volume.tags.len(), 1);
        assert!(volume.has_tag("ReadOnly"));

        let play = dump.find_member("Sound", "Play").unwrap();
        assert_eq!(play.kind, MemberKind::Method);
        assert_eq!(play.security.read, "None");
        assert!(play.return_type.as_ref().unwrap().is_void());
    }

    #[test]
    fn test_missing_member() {
        let dump = ApiDump::from_json(DUMP).unwrap();
        assert!(matches!(
            dump.find_member("Sound", "Stop"),
            Err(CodegenError::NotFound { .. })
        ));
    }

    #[test]
    fn test_corrupt_dump_is_an_error() {
        assert!(matches!(
            ApiDump::from_json("{\"Classes\": 3}"),
            Err(CodegenError::Json(_))
        ));
    }
}
