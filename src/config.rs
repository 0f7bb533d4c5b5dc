//! Per-class binding configuration.
//!
//! The persisted form ([`ClassConfig`] / [`RawMemberConfig`]) is a flat JSON
//! record embedded in the generated header. It only becomes a typed
//! [`MemberConfig`] once paired with the member's metadata, because the kind
//! decides which flags are meaningful.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::{Member, MemberKind};
use crate::error::{CodegenError, Result};

/// Tag that makes a method's scripting wrapper hand-written by default.
pub const TAG_CUSTOM_LUA_STATE: &str = "CustomLuaState";
/// Tag that removes a property's setter by default.
pub const TAG_READ_ONLY: &str = "ReadOnly";
/// Tag that hides a member from scripts.
pub const TAG_NOT_SCRIPTABLE: &str = "NotScriptable";

/// Tags applied by the generator itself, never forwarded as member tags.
pub const AUTO_TAGS: &[&str] = &[TAG_READ_ONLY, TAG_CUSTOM_LUA_STATE, TAG_NOT_SCRIPTABLE];

// ═══════════════════════════════════════════════════════════════════════════════
// PERSISTED FORM
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub members: BTreeMap<String, RawMemberConfig>,
}

impl ClassConfig {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RawMemberConfig> {
        self.members.get(name)
    }

    /// Pretty JSON: member names sorted, entry fields in declaration order.
    /// Stable across parse/serialize cycles.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Flags are tri-state so an explicit `false` can override a tag default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawMemberConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(rename = "virtual", default, skip_serializing_if = "Option::is_none")]
    pub is_virtual: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pure: Option<bool>,
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub is_const: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_get: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_set: Option<bool>,
}

impl RawMemberConfig {
    /// `pure` implies `virtual`.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        if out.pure == Some(true) {
            out.is_virtual = Some(true);
        }
        out
    }

    fn method_flags(&self) -> [(&'static str, Option<bool>); 4] {
        [
            ("virtual", self.is_virtual),
            ("pure", self.pure),
            ("const", self.is_const),
            ("custom", self.custom),
        ]
    }

    fn property_flags(&self) -> [(&'static str, Option<bool>); 2] {
        [
            ("virtual_get", self.virtual_get),
            ("virtual_set", self.virtual_set),
        ]
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED FORM
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Static,
    Virtual,
    /// Virtual with no implementation in this class.
    Pure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodConfig {
    pub dispatch: Dispatch,
    pub is_const: bool,
    /// Scripting wrapper body is hand-written and preserved.
    pub custom: bool,
    /// Whether the member gets a scripting wrapper at all.
    pub scriptable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyConfig {
    pub virtual_get: bool,
    pub virtual_set: bool,
    pub writable: bool,
    pub scriptable: bool,
}

/// A member's resolved configuration: tag defaults layered under explicit
/// flags, validated against the member kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberConfig {
    Alias(String),
    Method(MethodConfig),
    Property(PropertyConfig),
    Event { scriptable: bool },
    Callback { scriptable: bool },
}

fn invalid(member: &str, reason: impl Into<String>) -> CodegenError {
    CodegenError::ConfigInvalid {
        member: member.to_string(),
        reason: reason.into(),
    }
}

fn reject_set<const N: usize>(
    member: &Member,
    flags: [(&'static str, Option<bool>); N],
) -> Result<()> {
    for (flag, value) in flags {
        if value.is_some() {
            return Err(invalid(
                &member.name,
                format!("{} does not apply to a {}", flag, member.kind),
            ));
        }
    }
    Ok(())
}

impl MemberConfig {
    pub fn resolve(raw: &RawMemberConfig, member: &Member) -> Result<Self> {
        let not_scriptable = member.has_tag(TAG_NOT_SCRIPTABLE);

        if let Some(target) = &raw.alias {
            let conflicting = raw
                .method_flags()
                .iter()
                .chain(raw.property_flags().iter())
                .filter(|(_, v)| *v == Some(true))
                .map(|(name, _)| *name)
                .collect::<Vec<_>>();
            if !conflicting.is_empty() {
                return Err(invalid(
                    &member.name,
                    format!("alias cannot be combined with {}", conflicting.join(", ")),
                ));
            }
            if target == &member.name {
                return Err(invalid(&member.name, "member aliases itself"));
            }
            if !matches!(member.kind, MemberKind::Method | MemberKind::Property) {
                return Err(invalid(
                    &member.name,
                    format!("a {} cannot be an alias", member.kind),
                ));
            }
            return Ok(MemberConfig::Alias(target.clone()));
        }

        match member.kind {
            MemberKind::Method => {
                reject_set(member, raw.property_flags())?;
                let raw = raw.normalized();
                let dispatch = match (raw.pure, raw.is_virtual) {
                    (Some(true), _) => Dispatch::Pure,
                    (_, Some(true)) => Dispatch::Virtual,
                    _ => Dispatch::Static,
                };
                let custom = raw
                    .custom
                    .unwrap_or_else(|| member.has_tag(TAG_CUSTOM_LUA_STATE));
                Ok(MemberConfig::Method(MethodConfig {
                    dispatch,
                    is_const: raw.is_const == Some(true),
                    custom,
                    scriptable: !not_scriptable || raw.custom == Some(true),
                }))
            }
            MemberKind::Property => {
                reject_set(member, raw.method_flags())?;
                let virtual_set = raw.virtual_set == Some(true);
                Ok(MemberConfig::Property(PropertyConfig {
                    virtual_get: raw.virtual_get == Some(true),
                    virtual_set,
                    writable: virtual_set || !member.has_tag(TAG_READ_ONLY),
                    scriptable: !not_scriptable,
                }))
            }
            MemberKind::Event => {
                reject_set(member, raw.method_flags())?;
                reject_set(member, raw.property_flags())?;
                Ok(MemberConfig::Event {
                    scriptable: !not_scriptable,
                })
            }
            MemberKind::Callback => {
                reject_set(member, raw.method_flags())?;
                reject_set(member, raw.property_flags())?;
                Ok(MemberConfig::Callback {
                    scriptable: !not_scriptable,
                })
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MUTATION OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Flag set accepted by the modify operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberOptions {
    pub add: bool,
    pub remove: bool,
    pub alias: Option<String>,
    pub is_virtual: bool,
    pub pure: bool,
    pub is_const: bool,
    pub custom: bool,
    pub virtual_get: bool,
    pub virtual_set: bool,
}

fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

impl MemberOptions {
    /// Builds the replacement entry for `member`, rejecting flags that do not
    /// apply to its kind or conflict with an alias.
    ///
    /// `custom` combines with `virtual`, `pure` and `const`: the declaration
    /// keeps its dispatch and qualifiers while the wrapper body stays
    /// hand-written.
    pub fn to_raw(&self, member: &Member) -> Result<RawMemberConfig> {
        if self.add && self.remove {
            return Err(invalid(&member.name, "add and remove are mutually exclusive"));
        }

        let raw = RawMemberConfig {
            alias: self.alias.clone(),
            is_virtual: flag(self.is_virtual),
            pure: flag(self.pure),
            is_const: flag(self.is_const),
            custom: flag(self.custom),
            virtual_get: flag(self.virtual_get),
            virtual_set: flag(self.virtual_set),
        }
        .normalized();

        MemberConfig::resolve(&raw, member)?;
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Security, TypeRef};
    use std::collections::BTreeSet;

    fn member(name: &str, kind: MemberKind, tags: &[&str]) -> Member {
        Member {
            name: name.to_string(),
            kind,
            parameters: vec![],
            return_type: Some(TypeRef {
                category: "Primitive".to_string(),
                name: "float".to_string(),
            }),
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            security: Security {
                read: "None".to_string(),
                write: "None".to_string(),
            },
            thread_safety: "Unsafe".to_string(),
            category: None,
            can_load: true,
            can_save: true,
        }
    }

    #[test]
    fn pure_implies_virtual() {
        let play = member("Play", MemberKind::Method, &[]);
        let options = MemberOptions {
            add: true,
            pure: true,
            ..Default::default()
        };
        let raw = options.to_raw(&play).unwrap();
        assert_eq!(raw.is_virtual, Some(true));
        assert_eq!(raw.pure, Some(true));
    }

    #[test]
    fn alias_conflicts_are_rejected() {
        let play = member("Play", MemberKind::Method, &[]);
        let options = MemberOptions {
            add: true,
            alias: Some("Resume".to_string()),
            is_virtual: true,
            ..Default::default()
        };
        assert!(matches!(
            options.to_raw(&play),
            Err(CodegenError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn add_and_remove_are_exclusive() {
        let play = member("Play", MemberKind::Method, &[]);
        let options = MemberOptions {
            add: true,
            remove: true,
            ..Default::default()
        };
        assert!(options.to_raw(&play).is_err());
    }

    #[test]
    fn property_flags_do_not_apply_to_methods() {
        let play = member("Play", MemberKind::Method, &[]);
        let raw = RawMemberConfig {
            virtual_get: Some(true),
            ..Default::default()
        };
        assert!(MemberConfig::resolve(&raw, &play).is_err());
    }

    #[test]
    fn read_only_tag_removes_setter_unless_overridden() {
        let volume = member("Volume", MemberKind::Property, &["ReadOnly"]);
        let MemberConfig::Property(cfg) =
            MemberConfig::resolve(&RawMemberConfig::default(), &volume).unwrap()
        else {
            panic!("expected property config");
        };
        assert!(!cfg.writable);

        let raw = RawMemberConfig {
            virtual_set: Some(true),
            ..Default::default()
        };
        let MemberConfig::Property(cfg) = MemberConfig::resolve(&raw, &volume).unwrap() else {
            panic!("expected property config");
        };
        assert!(cfg.writable);
    }

    #[test]
    fn custom_lua_state_defaults_to_custom() {
        let invoke = member("Invoke", MemberKind::Method, &["CustomLuaState"]);
        let MemberConfig::Method(cfg) =
            MemberConfig::resolve(&RawMemberConfig::default(), &invoke).unwrap()
        else {
            panic!("expected method config");
        };
        assert!(cfg.custom);

        let raw = RawMemberConfig {
            custom: Some(false),
            ..Default::default()
        };
        let MemberConfig::Method(cfg) = MemberConfig::resolve(&raw, &invoke).unwrap() else {
            panic!("expected method config");
        };
        assert!(!cfg.custom);
    }

    #[test]
    fn config_json_is_stable() {
        let json = r#"{"members":{"Play":{"pure":true,"virtual":true},"Volume":{"virtual_get":true}}}"#;
        let config = ClassConfig::from_json(json).unwrap();
        let out = config.to_json();
        assert_eq!(ClassConfig::from_json(&out).unwrap(), config);
        assert_eq!(ClassConfig::from_json(&out).unwrap().to_json(), out);
    }

    #[test]
    fn custom_keeps_dispatch_flags() {
        let play = member("Play", MemberKind::Method, &[]);
        let options = MemberOptions {
            add: true,
            custom: true,
            pure: true,
            is_const: true,
            ..Default::default()
        };
        let raw = options.to_raw(&play).unwrap();
        assert_eq!(raw.custom, Some(true));
        assert_eq!(raw.is_virtual, Some(true));
        assert_eq!(raw.is_const, Some(true));

        let MemberConfig::Method(cfg) = MemberConfig::resolve(&raw, &play).unwrap() else {
            panic!("expected method config");
        };
        assert_eq!(cfg.dispatch, Dispatch::Pure);
        assert!(cfg.is_const);
        assert!(cfg.custom);
    }

    #[test]
    fn entry_fields_keep_declaration_order() {
        let json = r#"{"members":{"Zoom":{"custom":true,"const":true,"virtual":true},"Play":{"alias":"Stop"}}}"#;
        let out = ClassConfig::from_json(json).unwrap().to_json();
        assert_eq!(
            out,
            "{\n  \"members\": {\n    \"Play\": {\n      \"alias\": \"Stop\"\n    },\n    \"Zoom\": {\n      \"virtual\": true,\n      \"const\": true,\n      \"custom\": true\n    }\n  }\n}"
        );
    }

    #[test]
    fn empty_config_serializes_to_empty_object() {
        assert_eq!(ClassConfig::default().to_json(), "{}");
    }
}
