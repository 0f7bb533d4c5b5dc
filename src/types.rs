//! Type Mapper
//!
//! Lookup table from API dump type names to C++ types. Value primitives need
//! no include; composite and engine types carry the include that declares
//! them. The table is data only: [`TypeMapper::insert`] and the `types` table
//! of the settings file extend it without touching the generator.

use lazy_static::lazy_static;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeMapping {
    /// Target type as written in signatures.
    #[serde(rename = "type")]
    pub target: String,
    /// Include directive argument, with its `<>` or `""` delimiters.
    #[serde(default)]
    pub include: Option<String>,
    /// Owning type for field storage when the signature type is a borrow.
    #[serde(default)]
    pub storage: Option<String>,
}

impl TypeMapping {
    pub fn value(target: &str) -> Self {
        Self {
            target: target.to_string(),
            include: None,
            storage: None,
        }
    }

    pub fn with_include(target: &str, include: &str) -> Self {
        Self {
            target: target.to_string(),
            include: Some(include.to_string()),
            storage: None,
        }
    }

    /// Type used for a backing field.
    pub fn storage_type(&self) -> &str {
        self.storage.as_deref().unwrap_or(&self.target)
    }

    pub fn is_value(&self) -> bool {
        self.include.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILT-IN MAP
// ═══════════════════════════════════════════════════════════════════════════════

const VARIANT_INCLUDE: &str = "\"Sbx/Classes/Variant.hpp\"";

lazy_static! {
    static ref BUILTIN_TYPES: HashMap<&'static str, TypeMapping> = {
        let mut m = HashMap::new();
        // Primitives
        m.insert("null", TypeMapping::value("void"));
        m.insert("bool", TypeMapping::value("bool"));
        m.insert("int", TypeMapping::value("int"));
        m.insert("int64", TypeMapping::with_include("int64_t", "<cstdint>"));
        m.insert("float", TypeMapping::value("float"));
        m.insert("double", TypeMapping::value("double"));
        m.insert(
            "string",
            TypeMapping {
                target: "const char *".to_string(),
                include: None,
                storage: Some("std::string".to_string()),
            },
        );
        // Groups
        m.insert("Function", TypeMapping::with_include("LuauFunction", VARIANT_INCLUDE));
        m.insert("Array", TypeMapping::with_include("std::vector<Variant>", VARIANT_INCLUDE));
        m.insert(
            "Dictionary",
            TypeMapping::with_include("std::unordered_map<std::string, Variant>", VARIANT_INCLUDE),
        );
        m.insert("Variant", TypeMapping::with_include("Variant", VARIANT_INCLUDE));
        // Data types
        m.insert(
            "RBXScriptSignal",
            TypeMapping::with_include(
                "DataTypes::RBXScriptSignal",
                "\"Sbx/DataTypes/RBXScriptSignal.hpp\"",
            ),
        );
        m.insert(
            "RBXScriptConnection",
            TypeMapping::with_include(
                "DataTypes::RBXScriptConnection",
                "\"Sbx/DataTypes/RBXScriptConnection.hpp\"",
            ),
        );
        m.insert(
            "Vector3",
            TypeMapping::with_include("DataTypes::Vector3", "\"Sbx/DataTypes/Vector3.hpp\""),
        );
        m.insert(
            "Color3",
            TypeMapping::with_include("DataTypes::Color3", "\"Sbx/DataTypes/Color3.hpp\""),
        );
        m
    };
}

/// Header declaring the generated enum types.
pub const ENUM_INCLUDE: &str = "\"Sbx/DataTypes/EnumTypes.gen.hpp\"";

// ═══════════════════════════════════════════════════════════════════════════════
// MAPPER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct TypeMapper {
    entries: HashMap<String, TypeMapping>,
}

impl Default for TypeMapper {
    fn default() -> Self {
        Self {
            entries: BUILTIN_TYPES
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

impl TypeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table extended (and overridden) by `extra`.
    pub fn with_overrides<'a>(extra: impl IntoIterator<Item = (&'a String, &'a TypeMapping)>) -> Self {
        let mut mapper = Self::default();
        for (name, mapping) in extra {
            mapper.insert(name, mapping.clone());
        }
        mapper
    }

    pub fn insert(&mut self, dump_name: &str, mapping: TypeMapping) {
        self.entries.insert(dump_name.to_string(), mapping);
    }

    /// Unmapped names yield `None`; callers turn that into a hard error.
    pub fn resolve(&self, dump_name: &str) -> Option<&TypeMapping> {
        self.entries.get(dump_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_need_no_include() {
        let mapper = TypeMapper::new();
        for name in ["bool", "int", "float", "double", "string", "null"] {
            let mapping = mapper.resolve(name).unwrap();
            assert!(mapping.is_value(), "{} should be a value type", name);
        }
    }

    #[test]
    fn composites_carry_includes() {
        let mapper = TypeMapper::new();
        let signal = mapper.resolve("RBXScriptSignal").unwrap();
        assert_eq!(signal.target, "DataTypes::RBXScriptSignal");
        assert_eq!(
            signal.include.as_deref(),
            Some("\"Sbx/DataTypes/RBXScriptSignal.hpp\"")
        );
        assert!(mapper.resolve("Dictionary").unwrap().include.is_some());
        assert!(mapper.resolve("Function").unwrap().include.is_some());
    }

    #[test]
    fn unmapped_types_fail_closed() {
        assert!(TypeMapper::new().resolve("Tuple").is_none());
    }

    #[test]
    fn overrides_extend_the_table() {
        let extra: HashMap<String, TypeMapping> = [(
            "CFrame".to_string(),
            TypeMapping::with_include("DataTypes::CFrame", "\"Sbx/DataTypes/CFrame.hpp\""),
        )]
        .into_iter()
        .collect();
        let mapper = TypeMapper::with_overrides(&extra);
        assert_eq!(mapper.resolve("CFrame").unwrap().target, "DataTypes::CFrame");
        assert_eq!(mapper.resolve("string").unwrap().storage_type(), "std::string");
    }
}
