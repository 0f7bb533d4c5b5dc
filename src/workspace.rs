//! Orchestrator
//!
//! Entry points behind the command line: list generated classes, generate
//! one class, regenerate everything, check for drift, and change one
//! member's configuration. Every operation re-scans the artifact tree first,
//! so on-disk state is the only state.

use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::api::{ApiDump, ClassMetadata};
use crate::codegen::{generate, GenContext, GeneratedClass};
use crate::config::MemberOptions;
use crate::discovery::{scan, ClassRegistry, ScanRecord};
use crate::error::{
    CodegenError, Diagnostic, Result, W_REMOVE_ABSENT, W_STALE_CLASS,
};
use crate::settings::Settings;
use crate::tree::{ArtifactTree, Subtree};
use crate::types::TypeMapper;

// ═══════════════════════════════════════════════════════════════════════════════
// REPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// A class whose generation failed; the rest of the batch still ran.
#[derive(Debug)]
pub struct Failure {
    pub class: String,
    pub error: CodegenError,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub written: Vec<PathBuf>,
    /// Artifacts whose regenerated text matched what was on disk.
    pub unchanged: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<Failure>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CheckReport {
    /// Artifacts that regeneration would change or create.
    pub drifted: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<Failure>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.drifted.is_empty() && self.failures.is_empty()
    }
}

struct Batch {
    generated: Vec<GeneratedClass>,
    diagnostics: Vec<Diagnostic>,
    failures: Vec<Failure>,
}

fn log_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!("{}", diagnostic);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORKSPACE
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Workspace<'d, T: ArtifactTree> {
    tree: T,
    dump: &'d ApiDump,
    types: TypeMapper,
    include_prefix: String,
    namespace: String,
    strict_scan: bool,
}

impl<'d, T: ArtifactTree> Workspace<'d, T> {
    pub fn new(tree: T, dump: &'d ApiDump, settings: &Settings) -> Self {
        Self {
            tree,
            dump,
            types: settings.type_mapper(),
            include_prefix: settings.include_prefix.clone(),
            namespace: settings.namespace.clone(),
            strict_scan: settings.strict_scan,
        }
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn into_tree(self) -> T {
        self.tree
    }

    pub fn scan(&self) -> Result<ClassRegistry> {
        scan(&self.tree, self.strict_scan)
    }

    /// Names of every class with a complete artifact pair, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.scan()?.iter().map(|r| r.class_name.clone()).collect())
    }

    fn generate_with(
        &self,
        class: &ClassMetadata,
        record: &ScanRecord,
        registry: &ClassRegistry,
    ) -> Result<GeneratedClass> {
        let ctx = GenContext {
            dump: self.dump,
            types: &self.types,
            registry,
            include_prefix: &self.include_prefix,
            namespace: &self.namespace,
        };
        generate(class, record, &ctx)
    }

    /// Writes both artifacts, skipping any whose text is unchanged.
    fn write_generated(
        &mut self,
        generated: &GeneratedClass,
        report: &mut GenerationReport,
    ) -> Result<()> {
        let files = [
            (Subtree::Headers, &generated.header_path, &generated.header),
            (Subtree::Sources, &generated.source_path, &generated.source),
        ];
        for (subtree, rel, contents) in files {
            let shown = self.tree.display_path(subtree, rel);
            if self.tree.read(subtree, rel).ok().as_deref() == Some(contents.as_str()) {
                debug!("Unchanged {}", shown.display());
                report.unchanged.push(shown);
                continue;
            }
            self.tree.write(subtree, rel, contents)?;
            info!("Wrote {}", shown.display());
            report.written.push(shown);
        }
        Ok(())
    }

    /// Regenerate every registry class in memory.
    fn regenerate_registry(&self, registry: &ClassRegistry) -> Batch {
        let dump = self.dump;
        let mut batch = Batch {
            generated: Vec::new(),
            diagnostics: Vec::new(),
            failures: Vec::new(),
        };

        for record in registry.iter() {
            let Ok(class) = dump.find_class(&record.class_name) else {
                let diagnostic = Diagnostic::class(
                    W_STALE_CLASS,
                    &record.class_name,
                    "class no longer exists in the API dump; skipped",
                );
                warn!("{}", diagnostic);
                batch.diagnostics.push(diagnostic);
                continue;
            };

            match self.generate_with(class, record, registry) {
                Ok(mut generated) => {
                    log_diagnostics(&generated.diagnostics);
                    batch.diagnostics.append(&mut generated.diagnostics);
                    batch.generated.push(generated);
                }
                Err(e) => {
                    error!("{}: {}", record.class_name, e);
                    batch.failures.push(Failure {
                        class: record.class_name.clone(),
                        error: e,
                    });
                }
            }
        }

        batch
    }

    /// Generate (or regenerate) one class. A class with no artifacts yet is
    /// created at the conventional paths with empty configuration.
    pub fn generate(&mut self, class_name: &str) -> Result<GenerationReport> {
        let dump = self.dump;
        let class = dump.find_class(class_name)?;
        let registry = self.scan()?;
        let record = registry
            .get(class_name)
            .cloned()
            .unwrap_or_else(|| ScanRecord::fresh(class_name));

        let generated = self.generate_with(class, &record, &registry)?;
        log_diagnostics(&generated.diagnostics);

        let mut report = GenerationReport::default();
        self.write_generated(&generated, &mut report)?;
        report.diagnostics = generated.diagnostics;
        Ok(report)
    }

    /// Regenerate every generated class. Per-class failures are collected
    /// and do not stop the batch; artifacts already written stay written.
    pub fn update_all(&mut self) -> Result<GenerationReport> {
        let registry = self.scan()?;
        let batch = self.regenerate_registry(&registry);

        let mut report = GenerationReport {
            diagnostics: batch.diagnostics,
            failures: batch.failures,
            ..Default::default()
        };
        for generated in &batch.generated {
            self.write_generated(generated, &mut report)?;
        }
        info!(
            "Regenerated {} class(es): {} written, {} unchanged, {} failed",
            batch.generated.len(),
            report.written.len(),
            report.unchanged.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// Report which artifacts [`Workspace::update_all`] would change. Writes
    /// nothing.
    pub fn check(&self) -> Result<CheckReport> {
        let registry = self.scan()?;
        let batch = self.regenerate_registry(&registry);

        let mut drifted = Vec::new();
        for generated in &batch.generated {
            let files = [
                (Subtree::Headers, &generated.header_path, &generated.header),
                (Subtree::Sources, &generated.source_path, &generated.source),
            ];
            for (subtree, rel, contents) in files {
                if self.tree.read(subtree, rel).ok().as_deref() != Some(contents.as_str()) {
                    drifted.push(self.tree.display_path(subtree, rel));
                }
            }
        }

        Ok(CheckReport {
            drifted,
            diagnostics: batch.diagnostics,
            failures: batch.failures,
        })
    }

    /// Replace (or remove) one member's configuration entry and regenerate
    /// the class.
    ///
    /// The class must already be generated. Configuring a member that has no
    /// entry yet requires `options.add`; removing a member with no entry is a
    /// reported no-op.
    pub fn modify(
        &mut self,
        class_name: &str,
        member_name: &str,
        options: &MemberOptions,
    ) -> Result<GenerationReport> {
        let dump = self.dump;
        let class = dump.find_class(class_name)?;
        let registry = self.scan()?;
        let mut record = registry
            .get(class_name)
            .cloned()
            .ok_or_else(|| CodegenError::NotGenerated(class_name.to_string()))?;
        let member = class
            .member(member_name)
            .ok_or_else(|| CodegenError::member_not_found(member_name))?;

        let mut report = GenerationReport::default();

        if options.remove {
            if options.add {
                return Err(CodegenError::ConfigInvalid {
                    member: member_name.to_string(),
                    reason: "add and remove are mutually exclusive".to_string(),
                });
            }
            if record.config.members.remove(member_name).is_none() {
                let diagnostic = Diagnostic::member(
                    W_REMOVE_ABSENT,
                    class_name,
                    member_name,
                    "member is not configured; nothing to remove",
                );
                warn!("{}", diagnostic);
                report.diagnostics.push(diagnostic);
                return Ok(report);
            }
            info!("Removed {}.{} from configuration", class_name, member_name);
        } else {
            if !options.add && record.config.get(member_name).is_none() {
                return Err(CodegenError::ConfigInvalid {
                    member: member_name.to_string(),
                    reason: "member is not configured; use add to configure it".to_string(),
                });
            }
            let raw = options.to_raw(member)?;
            record.config.members.insert(member_name.to_string(), raw);
            info!("Configured {}.{}", class_name, member_name);
        }

        let generated = self.generate_with(class, &record, &registry)?;
        log_diagnostics(&generated.diagnostics);
        self.write_generated(&generated, &mut report)?;
        report.diagnostics.extend(generated.diagnostics);
        Ok(report)
    }
}
