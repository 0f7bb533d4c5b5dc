//! # sbx-codegen
//!
//! Generates C++ binding classes for the shadowblox engine from the engine
//! API dump, and merges regenerated output with hand-written code.
//!
//! ## Artifact Invariants
//!
//! 1. **Pairing**: a class is *generated* only when exactly one header and
//!    exactly one source carry its class marker. File paths are not used for
//!    pairing.
//!
//! 2. **On-disk state only**: the artifacts (markers, embedded configuration,
//!    blocks) are the single source of truth. Nothing is cached between runs.
//!
//! 3. **Preservation**: `keep` blocks are carried forward byte-for-byte by
//!    identity. `gen` blocks and everything outside blocks are rebuilt.
//!
//! 4. **Idempotence**: regenerating unchanged inputs yields identical bytes,
//!    and unchanged artifacts are not rewritten.
//!
//! 5. **Fail closed**: an unmapped type fails its class; a stale or invalid
//!    member configuration skips the member with a diagnostic.

pub mod api;
pub mod codegen;
pub mod config;
pub mod discovery;
pub mod error;
pub mod licenser;
pub mod parse;
pub mod settings;
pub mod template;
pub mod tree;
pub mod types;
pub mod workspace;

#[cfg(test)]
mod licenser_tests;
#[cfg(test)]
mod test_support;

pub use api::{ApiDump, ClassMetadata, Member, MemberKind};
pub use codegen::{generate, GenContext, GeneratedClass};
pub use config::{ClassConfig, MemberConfig, MemberOptions, RawMemberConfig};
pub use discovery::{scan, ClassRegistry, ScanRecord};
pub use error::{CodegenError, Diagnostic, Result};
pub use settings::Settings;
pub use tree::{ArtifactTree, DiskTree, MemoryTree, Subtree};
pub use types::{TypeMapper, TypeMapping};
pub use workspace::{CheckReport, GenerationReport, Workspace};
