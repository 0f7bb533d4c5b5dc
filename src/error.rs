//! Error taxonomy for the binding generator.
//!
//! Hard failures are [`CodegenError`] values. Conditions that only skip a
//! single member or class during a batch are [`Diagnostic`]s, collected into
//! a report and logged rather than aborting the run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const E_NOT_FOUND: &str = "SBX-E001";
pub const E_NOT_GENERATED: &str = "SBX-E002";
pub const E_AMBIGUOUS: &str = "SBX-E003";
pub const E_PARSE: &str = "SBX-E004";
pub const E_CONFIG_INVALID: &str = "SBX-E005";
pub const E_TYPE_UNRESOLVABLE: &str = "SBX-E006";
pub const E_IO: &str = "SBX-E007";
pub const E_JSON: &str = "SBX-E008";
pub const E_SETTINGS: &str = "SBX-E009";

// ═══════════════════════════════════════════════════════════════════════════════
// WARNING CODES
// ═══════════════════════════════════════════════════════════════════════════════

/// Configured member no longer exists in the API dump.
pub const W_STALE_MEMBER: &str = "SBX-W001";
/// Alias target is missing, unconfigured, of another kind, or cyclic.
pub const W_ALIAS_TARGET: &str = "SBX-W002";
/// Persisted member configuration is contradictory.
pub const W_INVALID_CONFIG: &str = "SBX-W003";
/// Generated class no longer exists in the API dump.
pub const W_STALE_CLASS: &str = "SBX-W004";
/// A hand-written body was replaced because the member is no longer custom.
pub const W_DISCARDED_BODY: &str = "SBX-W005";
/// `remove` requested for a member that is not configured.
pub const W_REMOVE_ABSENT: &str = "SBX-W006";
/// A preserved block with an identity the generator no longer emits.
pub const W_UNKNOWN_BLOCK: &str = "SBX-W007";

// ═══════════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// What kind of entity a lookup failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Class,
    Member,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Class => f.write_str("class"),
            EntityKind::Member => f.write_str("member"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CodegenError {
    /// Class or member absent from the API dump
    #[error("{kind} {name} does not exist")]
    NotFound { kind: EntityKind, name: String },

    /// Configuration requested for a class that has no artifact pair yet
    #[error("class {0} has not been generated")]
    NotGenerated(String),

    /// More than one artifact claims the same class (strict scan only)
    #[error("class {class} is declared by {headers} header(s) and {sources} source(s)")]
    Ambiguous {
        class: String,
        headers: usize,
        sources: usize,
    },

    /// Malformed block markers or configuration region
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Contradictory or inapplicable member configuration
    #[error("invalid configuration for {member}: {reason}")]
    ConfigInvalid { member: String, reason: String },

    /// A dump type with no mapping to a target type
    #[error("{class}.{member}: type {type_name} cannot be resolved")]
    TypeUnresolvable {
        class: String,
        member: String,
        type_name: String,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("API dump is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings are invalid: {0}")]
    Settings(String),
}

impl CodegenError {
    pub fn code(&self) -> &'static str {
        match self {
            CodegenError::NotFound { .. } => E_NOT_FOUND,
            CodegenError::NotGenerated(_) => E_NOT_GENERATED,
            CodegenError::Ambiguous { .. } => E_AMBIGUOUS,
            CodegenError::Parse { .. } => E_PARSE,
            CodegenError::ConfigInvalid { .. } => E_CONFIG_INVALID,
            CodegenError::TypeUnresolvable { .. } => E_TYPE_UNRESOLVABLE,
            CodegenError::Io { .. } => E_IO,
            CodegenError::Json(_) => E_JSON,
            CodegenError::Settings(_) => E_SETTINGS,
        }
    }

    pub fn class_not_found(name: &str) -> Self {
        CodegenError::NotFound {
            kind: EntityKind::Class,
            name: name.to_string(),
        }
    }

    pub fn member_not_found(name: &str) -> Self {
        CodegenError::NotFound {
            kind: EntityKind::Member,
            name: name.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodegenError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        CodegenError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T, E = CodegenError> = std::result::Result<T, E>;

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// A non-fatal condition reported during generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub class: String,
    pub member: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn class(code: &'static str, class: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            class: class.to_string(),
            member: None,
            message: message.into(),
        }
    }

    pub fn member(
        code: &'static str,
        class: &str,
        member: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            class: class.to_string(),
            member: Some(member.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.member {
            Some(member) => write!(
                f,
                "[{}] {}.{}: {}",
                self.code, self.class, member, self.message
            ),
            None => write!(f, "[{}] {}: {}", self.code, self.class, self.message),
        }
    }
}
