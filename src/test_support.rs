//! Fixtures shared by the companion test modules.

use std::path::Path;

use crate::api::ApiDump;
use crate::codegen::{generate, GenContext, GeneratedClass};
use crate::config::ClassConfig;
use crate::discovery::{ClassRegistry, ScanRecord};
use crate::error::Result;
use crate::parse::{parse_header, parse_source};
use crate::types::TypeMapper;

pub const DUMP: &str = r#"{
    "Version": 1,
    "Classes": [
        {
            "Name": "Instance",
            "Superclass": "<<<ROOT>>>",
            "MemoryCategory": "Instances",
            "Tags": ["NotCreatable"],
            "Members": [
                {
                    "MemberType": "Property",
                    "Name": "Name",
                    "ValueType": { "Category": "Primitive", "Name": "string" },
                    "Category": "Data",
                    "Security": { "Read": "None", "Write": "None" },
                    "Serialization": { "CanLoad": true, "CanSave": true },
                    "ThreadSafety": "ReadSafe",
                    "Tags": []
                }
            ]
        },
        {
            "Name": "Sound",
            "Superclass": "Instance",
            "MemoryCategory": "Instances",
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
                    "MemberType": "Function",
                    "Name": "Resume",
                    "Parameters": [],
                    "ReturnType": { "Category": "Primitive", "Name": "null" },
                    "Security": "None",
                    "ThreadSafety": "Unsafe",
                    "Tags": []
                },
                {
                    "MemberType": "Function",
                    "Name": "Stop",
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
                    "Category": "Data",
                    "Security": { "Read": "None", "Write": "None" },
                    "Serialization": { "CanLoad": true, "CanSave": true },
                    "ThreadSafety": "Unsafe",
                    "Tags": []
                },
                {
                    "MemberType": "Property",
                    "Name": "Loudness",
                    "ValueType": { "Category": "Primitive", "Name": "double" },
                    "Category": "Data",
                    "Security": { "Read": "None", "Write": "None" },
                    "Serialization": { "CanLoad": false, "CanSave": false },
                    "ThreadSafety": "ReadSafe",
                    "Tags": ["ReadOnly", "NotReplicated"]
                },
                {
                    "MemberType": "Property",
                    "Name": "Emitter",
                    "ValueType": { "Category": "Class", "Name": "Instance" },
                    "Category": "Data",
                    "Security": { "Read": "None", "Write": "PluginSecurity" },
                    "ThreadSafety": "Unsafe",
                    "Tags": []
                },
                {
                    "MemberType": "Property",
                    "Name": "RollOffMode",
                    "ValueType": { "Category": "Enum", "Name": "RollOffMode" },
                    "Category": "Behavior",
                    "Security": { "Read": "None", "Write": "None" },
                    "ThreadSafety": "Unsafe",
                    "Tags": []
                },
                {
                    "MemberType": "Property",
                    "Name": "SoundId",
                    "ValueType": { "Category": "Primitive", "Name": "string" },
                    "Category": "Data",
                    "Security": { "Read": "None", "Write": "None" },
                    "ThreadSafety": "Unsafe",
                    "Tags": []
                },
                {
                    "MemberType": "Function",
                    "Name": "FadeTo",
                    "Parameters": [
                        { "Name": "volume", "Type": { "Category": "Primitive", "Name": "float" } },
                        { "Name": "duration", "Type": { "Category": "Primitive", "Name": "double" } }
                    ],
                    "ReturnType": { "Category": "Primitive", "Name": "bool" },
                    "Security": "None",
                    "ThreadSafety": "Unsafe",
                    "Tags": ["Yields"]
                },
                {
                    "MemberType": "Function",
                    "Name": "Reload",
                    "Parameters": [],
                    "ReturnType": { "Category": "Primitive", "Name": "null" },
                    "Security": "PluginSecurity",
                    "ThreadSafety": "Unsafe",
                    "Tags": ["CustomLuaState", "Deprecated"]
                },
                {
                    "MemberType": "Function",
                    "Name": "DebugDump",
                    "Parameters": [],
                    "ReturnType": { "Category": "Primitive", "Name": "null" },
                    "Security": "None",
                    "ThreadSafety": "Unsafe",
                    "Tags": ["NotScriptable"]
                },
                {
                    "MemberType": "Function",
                    "Name": "Seek",
                    "Parameters": [
                        { "Name": "positions", "Type": { "Category": "Group", "Name": "Tuple" } }
                    ],
                    "ReturnType": { "Category": "Primitive", "Name": "null" },
                    "Security": "None",
                    "ThreadSafety": "Unsafe",
                    "Tags": []
                },
                {
                    "MemberType": "Event",
                    "Name": "Ended",
                    "Parameters": [
                        { "Name": "soundId", "Type": { "Category": "Primitive", "Name": "string" } }
                    ],
                    "Security": "None",
                    "ThreadSafety": "Unsafe",
                    "Tags": []
                },
                {
                    "MemberType": "Callback",
                    "Name": "OnLoad",
                    "Parameters": [
                        { "Name": "asset", "Type": { "Category": "Primitive", "Name": "string" } }
                    ],
                    "ReturnType": { "Category": "Primitive", "Name": "bool" },
                    "Security": "None",
                    "ThreadSafety": "Unsafe",
                    "Tags": []
                }
            ]
        },
        {
            "Name": "Folder",
            "Superclass": "Instance",
            "MemoryCategory": "Instances",
            "Tags": [],
            "Members": []
        }
    ],
    "Enums": []
}"#;

pub fn dump() -> ApiDump {
    ApiDump::from_json(DUMP).unwrap()
}

/// The fixture dump with one member's JSON rewritten by `edit`.
pub fn edited_dump(
    class: &str,
    member: &str,
    edit: impl FnOnce(&mut serde_json::Value),
) -> ApiDump {
    let mut root: serde_json::Value = serde_json::from_str(DUMP).unwrap();
    let classes = root["Classes"].as_array_mut().unwrap();
    let class_json = classes.iter_mut().find(|c| c["Name"] == class).unwrap();
    let members = class_json["Members"].as_array_mut().unwrap();
    let member_json = members.iter_mut().find(|m| m["Name"] == member).unwrap();
    edit(member_json);
    ApiDump::from_json(&root.to_string()).unwrap()
}

pub fn record_with_config(class: &str, config_json: &str) -> ScanRecord {
    ScanRecord {
        config: ClassConfig::from_json(config_json).unwrap(),
        ..ScanRecord::fresh(class)
    }
}

/// Generate `class` from the fixture dump with no other generated classes.
pub fn generate_class(class: &str, record: &ScanRecord) -> Result<GeneratedClass> {
    let dump = dump();
    let types = TypeMapper::new();
    let registry = ClassRegistry::default();
    let ctx = GenContext {
        dump: &dump,
        types: &types,
        registry: &registry,
        include_prefix: "Sbx/Classes",
        namespace: "SBX::Classes",
    };
    generate(dump.find_class(class)?, record, &ctx)
}

/// The scan record a later run would see for this output.
pub fn reparse(generated: &GeneratedClass) -> ScanRecord {
    reparse_text(generated, &generated.header, &generated.source)
}

/// Like [`reparse`], for artifact text edited after generation.
pub fn reparse_text(generated: &GeneratedClass, header: &str, source: &str) -> ScanRecord {
    let header = parse_header(header, Path::new(&generated.header_path))
        .unwrap()
        .unwrap();
    let source = parse_source(source, Path::new(&generated.source_path))
        .unwrap()
        .unwrap();
    assert_eq!(header.class_name, source.class_name);
    ScanRecord {
        class_name: header.class_name,
        header_path: Some(generated.header_path.clone()),
        source_path: Some(generated.source_path.clone()),
        config: header.config,
        header_blocks: header.blocks,
        source_blocks: source.blocks,
    }
}
