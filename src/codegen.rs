//! Binding Generator
//!
//! Produces the full text of one class's artifact pair from its API
//! metadata, its persisted configuration and the blocks preserved from the
//! previous artifacts. Generation is pure: the same inputs always give the
//! same bytes, and nothing here touches the filesystem.

use lazy_static::lazy_static;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

use crate::api::{ApiDump, ClassMetadata, Member, TypeRef};
use crate::config::{
    ClassConfig, Dispatch, MemberConfig, MethodConfig, PropertyConfig, AUTO_TAGS,
    TAG_NOT_SCRIPTABLE, TAG_READ_ONLY,
};
use crate::discovery::{ClassRegistry, ScanRecord};
use crate::error::{
    CodegenError, Diagnostic, Result, W_ALIAS_TARGET, W_DISCARDED_BODY, W_INVALID_CONFIG,
    W_STALE_MEMBER, W_UNKNOWN_BLOCK,
};
use crate::parse::{BlockId, Blocks, Origin};
use crate::template::{
    render_header, render_source, HeaderLayout, Includes, RenderedBlock, SourceLayout,
    HEADER_KEEP_SECTIONS, SECTION_BIND, SECTION_FIELDS, SECTION_INCLUDES, SECTION_PRIVATE,
    SECTION_PROTECTED, SECTION_PUBLIC, SECTION_SOURCE, SOURCE_KEEP_SECTIONS,
};
use crate::types::{TypeMapper, ENUM_INCLUDE};

/// Base class for classes at the root of the hierarchy.
pub const DEFAULT_BASE: &str = "Object";

const DEFAULT_PROPERTY_CATEGORY: &str = "Data";
const DEFAULT_MEMORY_CATEGORY: &str = "Instances";

const KNOWN_MEMBER_TAGS: &[&str] = &[
    "CanYield",
    "Deprecated",
    "Hidden",
    "NoYield",
    "NotBrowsable",
    "NotReplicated",
    "Yields",
];

const KNOWN_CLASS_TAGS: &[&str] = &[
    "Deprecated",
    "NotBrowsable",
    "NotCreatable",
    "NotReplicated",
    "PlayerReplicated",
    "Service",
];

const KNOWN_MEMORY_CATEGORIES: &[&str] = &[
    "Animation",
    "GraphicsTexture",
    "Gui",
    "Instances",
    "Internal",
    "Script",
];

const KNOWN_SECURITY: &[&str] = &[
    "PluginSecurity",
    "LocalUserSecurity",
    "WritePlayerSecurity",
    "RobloxScriptSecurity",
    "RobloxSecurity",
    "NotAccessibleSecurity",
];

const KNOWN_THREAD_SAFETY: &[&str] = &["Unsafe", "ReadSafe", "Safe"];

lazy_static! {
    /// Identifiers a generated name must not collide with.
    static ref RESERVED_IDENTS: HashSet<&'static str> = [
        "alignas", "alignof", "and", "asm", "auto", "bool", "break", "case", "catch", "char",
        "class", "const", "constexpr", "continue", "default", "delete", "do", "double", "else",
        "enum", "explicit", "export", "extern", "false", "float", "for", "friend", "goto", "if",
        "inline", "int", "long", "mutable", "namespace", "new", "noexcept", "not", "nullptr",
        "operator", "or", "private", "protected", "public", "register", "return", "short",
        "signed", "sizeof", "static", "struct", "switch", "template", "this", "throw", "true",
        "try", "typedef", "typename", "union", "unsigned", "using", "virtual", "void",
        "volatile", "while", "xor",
        // Names used by the generated wrappers themselves
        "L", "self", "value",
    ]
    .into_iter()
    .collect();
}

// ═══════════════════════════════════════════════════════════════════════════════
// INPUT/OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything generation reads besides the class itself.
#[derive(Clone, Copy)]
pub struct GenContext<'a> {
    pub dump: &'a ApiDump,
    pub types: &'a TypeMapper,
    pub registry: &'a ClassRegistry,
    /// Prefix of include paths for generated headers (`Sbx/Classes`).
    pub include_prefix: &'a str,
    pub namespace: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedClass {
    pub class_name: String,
    pub header_path: String,
    pub source_path: String,
    pub header: String,
    pub source: String,
    /// Configuration as persisted into `header`.
    pub config: ClassConfig,
    pub diagnostics: Vec<Diagnostic>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAMING HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn security_level(dump_level: &str) -> &str {
    match dump_level {
        "None" | "" => "NoneSecurity",
        level if KNOWN_SECURITY.contains(&level) => level,
        // Unknown levels are treated as inaccessible
        _ => "NotAccessibleSecurity",
    }
}

fn thread_safety(dump_value: &str) -> &str {
    if KNOWN_THREAD_SAFETY.contains(&dump_value) {
        dump_value
    } else {
        "Unsafe"
    }
}

/// `{}` or `{ MemberTag::A, MemberTag::B }`. Automatic tags are never listed.
fn member_tag_list(member: &Member) -> String {
    let tags: Vec<String> = member
        .tags
        .iter()
        .filter(|t| KNOWN_MEMBER_TAGS.contains(&t.as_str()) && !AUTO_TAGS.contains(&t.as_str()))
        .map(|t| format!("MemberTag::{}", t))
        .collect();
    if tags.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", tags.join(", "))
    }
}

fn class_macro(class: &ClassMetadata, base: &str) -> String {
    let category = if KNOWN_MEMORY_CATEGORIES.contains(&class.memory_category.as_str()) {
        class.memory_category.as_str()
    } else {
        DEFAULT_MEMORY_CATEGORY
    };
    let mut args = vec![
        class.name.clone(),
        base.to_string(),
        format!("MemoryCategory::{}", category),
    ];
    args.extend(
        class
            .tags
            .iter()
            .filter(|t| KNOWN_CLASS_TAGS.contains(&t.as_str()))
            .map(|t| format!("ClassTag::{}", t)),
    );
    format!("SBXCLASS({});", args.join(", "))
}

/// Backing field for a property: `Volume` -> `volume`.
pub fn field_name(member_name: &str) -> String {
    let mut chars = member_name.chars();
    let mut name = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => "field".to_string(),
    };
    if RESERVED_IDENTS.contains(name.as_str()) {
        name.push_str("Value");
    }
    name
}

/// Parameter name safe to use as a C++ identifier.
fn param_ident(name: &str, index: usize) -> String {
    let mut ident: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if ident.is_empty() {
        return format!("arg{}", index + 1);
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RESERVED_IDENTS.contains(ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// `float volume`, `const char *name`.
fn decl(ty: &str, name: &str) -> String {
    if ty.ends_with('*') || ty.ends_with('&') {
        format!("{}{}", ty, name)
    } else {
        format!("{} {}", ty, name)
    }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s)
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION + PLANNING
// ═══════════════════════════════════════════════════════════════════════════════

/// What the generator will emit for one member, in metadata order.
enum Plan<'m> {
    Method(&'m Member, MethodConfig),
    Property(&'m Member, PropertyConfig),
    Event(&'m Member, bool),
    Callback(&'m Member, bool),
    MethodAlias {
        member: &'m Member,
        target: &'m Member,
    },
    PropertyAlias {
        member: &'m Member,
        target: &'m Member,
        target_config: PropertyConfig,
    },
}

/// Validates every persisted entry against the metadata. Returns the
/// configuration to persist (stale entries trimmed, flags normalized) and
/// the typed configuration of each valid entry.
fn resolve_config<'m>(
    class: &'m ClassMetadata,
    record: &ScanRecord,
    diagnostics: &mut Vec<Diagnostic>,
) -> (ClassConfig, BTreeMap<&'m str, MemberConfig>) {
    let mut persisted = ClassConfig::default();
    let mut resolved = BTreeMap::new();

    for (name, raw) in &record.config.members {
        let Some(member) = class.member(name) else {
            diagnostics.push(Diagnostic::member(
                W_STALE_MEMBER,
                &class.name,
                name,
                "configured member no longer exists in the API dump; dropped",
            ));
            continue;
        };

        persisted.members.insert(name.clone(), raw.normalized());
        match MemberConfig::resolve(raw, member) {
            Ok(config) => {
                resolved.insert(member.name.as_str(), config);
            }
            Err(e) => diagnostics.push(Diagnostic::member(
                W_INVALID_CONFIG,
                &class.name,
                name,
                format!("{}; member skipped", e),
            )),
        }
    }

    (persisted, resolved)
}

/// Follows an alias chain to the member that owns the implementation.
fn follow_alias<'m>(
    class: &'m ClassMetadata,
    record: &ScanRecord,
    resolved: &BTreeMap<&'m str, MemberConfig>,
    alias: &str,
    first_target: &str,
) -> std::result::Result<&'m Member, String> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    seen.insert(alias);
    let mut current = first_target;

    loop {
        if !seen.insert(current) {
            return Err(format!("alias chain through {} is cyclic", current));
        }
        let Some(member) = class.member(current) else {
            return Err(format!("alias target {} does not exist", current));
        };
        match resolved.get(current) {
            Some(MemberConfig::Alias(next)) => current = next.as_str(),
            Some(_) => return Ok(member),
            None if record.config.get(current).is_some() => {
                return Err(format!("alias target {} has invalid configuration", current));
            }
            None => return Err(format!("alias target {} is not configured", current)),
        }
    }
}

fn plan_members<'m>(
    class: &'m ClassMetadata,
    record: &ScanRecord,
    resolved: &BTreeMap<&'m str, MemberConfig>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Plan<'m>> {
    let mut plans = Vec::new();

    for member in &class.members {
        let Some(config) = resolved.get(member.name.as_str()) else {
            continue;
        };

        let plan = match config {
            MemberConfig::Method(cfg) => Plan::Method(member, cfg.clone()),
            MemberConfig::Property(cfg) => Plan::Property(member, cfg.clone()),
            MemberConfig::Event { scriptable } => Plan::Event(member, *scriptable),
            MemberConfig::Callback { scriptable } => Plan::Callback(member, *scriptable),
            MemberConfig::Alias(first) => {
                let target = follow_alias(class, record, resolved, &member.name, first)
                    .and_then(|target| {
                        if target.kind != member.kind {
                            return Err(format!(
                                "alias target {} is a {}, not a {}",
                                target.name, target.kind, member.kind
                            ));
                        }
                        match resolved.get(target.name.as_str()) {
                            Some(MemberConfig::Method(cfg)) if !cfg.scriptable => Err(format!(
                                "alias target {} has no scripting wrapper",
                                target.name
                            )),
                            Some(MemberConfig::Method(_)) => Ok(Plan::MethodAlias { member, target }),
                            Some(MemberConfig::Property(cfg)) => Ok(Plan::PropertyAlias {
                                member,
                                target,
                                target_config: cfg.clone(),
                            }),
                            _ => Err(format!("alias target {} cannot be aliased", target.name)),
                        }
                    });
                match target {
                    Ok(plan) => plan,
                    Err(reason) => {
                        diagnostics.push(Diagnostic::member(
                            W_ALIAS_TARGET,
                            &class.name,
                            &member.name,
                            format!("{}; member skipped", reason),
                        ));
                        continue;
                    }
                }
            }
        };
        plans.push(plan);
    }

    plans
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMITTER
// ═══════════════════════════════════════════════════════════════════════════════

/// A target type as it appears in signatures, plus its field storage type.
#[derive(Debug, Clone)]
struct CType {
    target: String,
    storage: String,
}

impl CType {
    fn same(target: String) -> Self {
        Self {
            storage: target.clone(),
            target,
        }
    }

    fn void() -> Self {
        Self::same("void".to_string())
    }

    fn is_void(&self) -> bool {
        self.target == "void"
    }

    /// Signature type is a borrowed C string over owned storage.
    fn is_borrowed_string(&self) -> bool {
        self.target != self.storage && self.target.ends_with('*')
    }
}

struct Param {
    name: String,
    ty: CType,
}

struct Emitter<'a> {
    class: &'a ClassMetadata,
    record: &'a ScanRecord,
    ctx: &'a GenContext<'a>,
    includes: Includes,
    header_blocks: Vec<RenderedBlock>,
    source_blocks: Vec<RenderedBlock>,
    bind: String,
    fields: String,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Emitter<'a> {
    fn new(class: &'a ClassMetadata, record: &'a ScanRecord, ctx: &'a GenContext<'a>) -> Self {
        Self {
            class,
            record,
            ctx,
            includes: Includes::default(),
            header_blocks: Vec::new(),
            source_blocks: Vec::new(),
            bind: String::new(),
            fields: String::new(),
            diagnostics: Vec::new(),
        }
    }

    fn class_name(&self) -> &'a str {
        &self.class.name
    }

    /// Include directive for another class's header.
    fn class_include(&self, name: &str) -> String {
        let rel = self
            .ctx
            .registry
            .get(name)
            .and_then(|r| r.header_path.clone())
            .unwrap_or_else(|| format!("{}.hpp", name));
        quoted(&format!("{}/{}", self.ctx.include_prefix, rel))
    }

    fn unresolvable(&self, member: &Member, type_name: &str) -> CodegenError {
        CodegenError::TypeUnresolvable {
            class: self.class.name.clone(),
            member: member.name.clone(),
            type_name: type_name.to_string(),
        }
    }

    fn resolve_type(&mut self, member: &Member, ty: &TypeRef) -> Result<CType> {
        match ty.category.as_str() {
            "Class" => {
                if !self.ctx.dump.has_class(&ty.name) {
                    return Err(self.unresolvable(member, &ty.name));
                }
                self.includes.insert("<memory>");
                if ty.name != self.class.name {
                    let include = self.class_include(&ty.name);
                    self.includes.insert(&include);
                }
                Ok(CType::same(format!("std::shared_ptr<{}>", ty.name)))
            }
            "Enum" => {
                self.includes.insert(ENUM_INCLUDE);
                Ok(CType::same(format!("EnumTypes::{}", ty.name)))
            }
            _ => {
                let types = self.ctx.types;
                let mapping = types
                    .resolve(&ty.name)
                    .ok_or_else(|| self.unresolvable(member, &ty.name))?;
                if let Some(include) = &mapping.include {
                    self.includes.insert(include);
                }
                Ok(CType {
                    target: mapping.target.clone(),
                    storage: mapping.storage_type().to_string(),
                })
            }
        }
    }

    fn params(&mut self, member: &Member) -> Result<Vec<Param>> {
        member
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Ok(Param {
                    name: param_ident(&p.name, i),
                    ty: self.resolve_type(member, &p.ty)?,
                })
            })
            .collect()
    }

    fn return_type(&mut self, member: &Member) -> Result<CType> {
        match &member.return_type {
            Some(ty) if !ty.is_void() => self.resolve_type(member, ty),
            _ => Ok(CType::void()),
        }
    }

    fn value_type(&mut self, member: &Member) -> Result<CType> {
        match &member.return_type {
            Some(ty) if !ty.is_void() => self.resolve_type(member, ty),
            _ => Err(self.unresolvable(member, "null")),
        }
    }

    fn push_header(&mut self, member: &Member, text: String) {
        self.header_blocks.push(RenderedBlock::generated(
            BlockId::member(member.kind, &member.name),
            text,
        ));
    }

    fn push_source(&mut self, member: &Member, text: String) {
        let id = BlockId::member(member.kind, &member.name);
        if self.record.source_blocks.preserved(&id).is_some() {
            self.diagnostics.push(Diagnostic::member(
                W_DISCARDED_BODY,
                &self.class.name,
                &member.name,
                "hand-written body replaced by generated code",
            ));
        }
        self.source_blocks.push(RenderedBlock::generated(id, text));
    }

    fn push_bind(&mut self, line: String) {
        self.bind.push_str("\t\t");
        self.bind.push_str(&line);
        self.bind.push('\n');
    }

    fn push_field(&mut self, line: String) {
        self.fields.push('\t');
        self.fields.push_str(&line);
        self.fields.push('\n');
    }

    fn emit(&mut self, plan: &Plan<'_>) -> Result<()> {
        match plan {
            Plan::Method(member, cfg) => self.emit_method(member, cfg),
            Plan::Property(member, cfg) => self.emit_property(member, cfg),
            Plan::Event(member, scriptable) => self.emit_event(member, *scriptable),
            Plan::Callback(member, scriptable) => self.emit_callback(member, *scriptable),
            Plan::MethodAlias { member, target } => self.emit_method_alias(member, target),
            Plan::PropertyAlias {
                member,
                target,
                target_config,
            } => self.emit_property_alias(member, target, target_config),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Methods
    // ───────────────────────────────────────────────────────────────────────────

    fn method_bind(&self, member: &Member, luau_name: &str, ret: &CType, params: &[Param]) -> String {
        let types: Vec<&str> = params.iter().map(|p| p.ty.target.as_str()).collect();
        let mut args = vec![member_tag_list(member)];
        args.extend(params.iter().map(|p| quoted(&p.name)));
        format!(
            "ClassDB::BindLuauMethod<T, \"{}\", {}({}), &T::{}, {}, ThreadSafety::{}>({});",
            member.name,
            ret.target,
            types.join(", "),
            luau_name,
            security_level(&member.security.read),
            thread_safety(&member.thread_safety),
            args.join(", ")
        )
    }

    fn emit_method(&mut self, member: &Member, cfg: &MethodConfig) -> Result<()> {
        let class = self.class_name();
        let params = self.params(member)?;
        let ret = self.return_type(member)?;

        let signature: Vec<String> = params.iter().map(|p| decl(&p.ty.target, &p.name)).collect();
        let prefix = if cfg.dispatch == Dispatch::Static { "" } else { "virtual " };
        let mut suffix = String::new();
        if cfg.is_const {
            suffix.push_str(" const");
        }
        if cfg.dispatch == Dispatch::Pure {
            suffix.push_str(" = 0");
        }

        let mut header = format!(
            "\t{}{}({}){};\n",
            prefix,
            decl(&ret.target, &member.name),
            signature.join(", "),
            suffix
        );

        if !cfg.scriptable {
            self.push_header(member, header);
            return Ok(());
        }

        let luau_name = format!("{}Luau", member.name);
        header.push_str(&format!("\tstatic int {}(lua_State *L);\n", luau_name));
        self.push_header(member, header);

        let id = BlockId::member(member.kind, &member.name);
        if cfg.custom {
            let body = self
                .record
                .source_blocks
                .preserved(&id)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!("int {}::{}(lua_State *L) {{\n\treturn 0;\n}}\n", class, luau_name)
                });
            self.source_blocks.push(RenderedBlock::preserved(id, body));
        } else {
            let mut body = format!("int {}::{}(lua_State *L) {{\n", class, luau_name);
            body.push_str(&format!(
                "\t{} *self = LuauStackOp<{} *>::Check(L, 1);\n",
                class, class
            ));
            for (i, p) in params.iter().enumerate() {
                body.push_str(&format!(
                    "\t{} = LuauStackOp<{}>::Check(L, {});\n",
                    decl(&p.ty.target, &p.name),
                    p.ty.target,
                    i + 2
                ));
            }
            let call = format!(
                "self->{}({})",
                member.name,
                params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
            );
            if ret.is_void() {
                body.push_str(&format!("\t{};\n\treturn 0;\n", call));
            } else {
                body.push_str(&format!(
                    "\tLuauStackOp<{}>::Push(L, {});\n\treturn 1;\n",
                    ret.target, call
                ));
            }
            body.push_str("}\n");
            self.push_source(member, body);
        }

        let bind = self.method_bind(member, &luau_name, &ret, &params);
        self.push_bind(bind);
        Ok(())
    }

    fn emit_method_alias(&mut self, member: &Member, target: &Member) -> Result<()> {
        let params = self.params(target)?;
        let ret = self.return_type(target)?;
        let luau_name = format!("{}Luau", member.name);

        self.push_header(
            member,
            format!(
                "\tstatic int {}(lua_State *L) {{ return {}Luau(L); }}\n",
                luau_name, target.name
            ),
        );

        if !member.has_tag(TAG_NOT_SCRIPTABLE) {
            let bind = self.method_bind(member, &luau_name, &ret, &params);
            self.push_bind(bind);
        }
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Properties
    // ───────────────────────────────────────────────────────────────────────────

    fn property_bind(&self, member: &Member, writable: bool, scriptable: bool) -> String {
        let class = self.class_name();
        let category = member
            .category
            .as_deref()
            .unwrap_or(DEFAULT_PROPERTY_CATEGORY);
        let getter = format!("&{}::Get{}", class, member.name);
        let setter = format!("&{}::Set{}", class, member.name);
        let read = security_level(&member.security.read);
        let write = security_level(&member.security.write);
        let safety = format!("ThreadSafety::{}", thread_safety(&member.thread_safety));
        let tags = member_tag_list(member);

        match (scriptable, writable) {
            (true, true) => format!(
                "ClassDB::BindProperty<T, \"{}\", \"{}\", {}, {}, {}, {}, {}, {}, {}>({});",
                member.name, category, getter, read, setter, write, safety, member.can_load,
                member.can_save, tags
            ),
            (true, false) => format!(
                "ClassDB::BindPropertyReadOnly<T, \"{}\", \"{}\", {}, {}, {}, {}>({});",
                member.name, category, getter, read, safety, member.can_save, tags
            ),
            (false, true) => format!(
                "ClassDB::BindPropertyNotScriptable<T, \"{}\", \"{}\", {}, {}, {}, {}, {}>({});",
                member.name, category, getter, setter, safety, member.can_load, member.can_save,
                tags
            ),
            (false, false) => format!(
                "ClassDB::BindPropertyNotScriptableReadOnly<T, \"{}\", \"{}\", {}, {}, {}>({});",
                member.name, category, getter, safety, member.can_save, tags
            ),
        }
    }

    fn emit_property(&mut self, member: &Member, cfg: &PropertyConfig) -> Result<()> {
        let class = self.class_name();
        let ty = self.value_type(member)?;
        let field = field_name(&member.name);
        let getter = decl(&ty.target, &format!("Get{}", member.name));
        let value = decl(&ty.target, "value");

        let mut header = if cfg.virtual_get {
            format!("\tvirtual {}() const = 0;\n", getter)
        } else if ty.is_borrowed_string() {
            format!("\t{}() const {{ return {}.c_str(); }}\n", getter, field)
        } else {
            format!("\t{}() const {{ return {}; }}\n", getter, field)
        };

        if cfg.writable {
            if cfg.virtual_set {
                header.push_str(&format!("\tvirtual void Set{}({}) = 0;\n", member.name, value));
            } else {
                header.push_str(&format!("\tvoid Set{}({});\n", member.name, value));
                let assign = if ty.is_borrowed_string() {
                    format!("{} = value ? value : \"\";", field)
                } else {
                    format!("{} = value;", field)
                };
                self.push_source(
                    member,
                    format!(
                        "void {}::Set{}({}) {{\n\t{}\n\tChanged<{}>(\"{}\");\n}}\n",
                        class, member.name, value, assign, class, member.name
                    ),
                );
            }
        }
        self.push_header(member, header);

        let needs_field = !cfg.virtual_get || (cfg.writable && !cfg.virtual_set);
        if needs_field {
            if ty.storage.contains("std::string") {
                self.includes.insert("<string>");
            }
            self.push_field(format!("{} {}{{}};", ty.storage, field));
        }

        let bind = self.property_bind(member, cfg.writable, cfg.scriptable);
        self.push_bind(bind);
        Ok(())
    }

    fn emit_property_alias(
        &mut self,
        member: &Member,
        target: &Member,
        target_config: &PropertyConfig,
    ) -> Result<()> {
        let ty = self.value_type(target)?;
        let mut header = format!(
            "\t{}() const {{ return Get{}(); }}\n",
            decl(&ty.target, &format!("Get{}", member.name)),
            target.name
        );
        let writable =
            target_config.writable && !member.has_tag(TAG_READ_ONLY);
        if writable {
            header.push_str(&format!(
                "\tvoid Set{}({}) {{ Set{}(value); }}\n",
                member.name,
                decl(&ty.target, "value"),
                target.name
            ));
        }
        self.push_header(member, header);

        let scriptable = !member.has_tag(TAG_NOT_SCRIPTABLE);
        let bind = self.property_bind(member, writable, scriptable);
        self.push_bind(bind);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Events and callbacks
    // ───────────────────────────────────────────────────────────────────────────

    fn emit_event(&mut self, member: &Member, scriptable: bool) -> Result<()> {
        let class = self.class_name();
        let params = self.params(member)?;
        let signature: Vec<String> = params.iter().map(|p| decl(&p.ty.target, &p.name)).collect();

        self.push_header(
            member,
            format!("\tvoid Fire{}({});\n", member.name, signature.join(", ")),
        );

        let mut emit_args = vec![quoted(&member.name)];
        emit_args.extend(params.iter().map(|p| p.name.clone()));
        self.push_source(
            member,
            format!(
                "void {}::Fire{}({}) {{\n\tEmit<{}>({});\n}}\n",
                class,
                member.name,
                signature.join(", "),
                class,
                emit_args.join(", ")
            ),
        );

        if scriptable {
            let types: Vec<&str> = params.iter().map(|p| p.ty.target.as_str()).collect();
            let mut args = vec![member_tag_list(member)];
            args.extend(params.iter().map(|p| quoted(&p.name)));
            self.push_bind(format!(
                "ClassDB::BindSignal<T, \"{}\", void({}), {}>({});",
                member.name,
                types.join(", "),
                security_level(&member.security.read),
                args.join(", ")
            ));
        }
        Ok(())
    }

    fn emit_callback(&mut self, member: &Member, scriptable: bool) -> Result<()> {
        let class = self.class_name();
        let params = self.params(member)?;
        let ret = self.return_type(member)?;
        let field = field_name(&member.name);

        self.push_header(
            member,
            format!("\tvoid Set{}(lua_State *L);\n", member.name),
        );
        self.push_field(format!("int {}Ref = LUA_NOREF;", field));
        self.push_field(format!("lua_State *{}State = nullptr;", field));

        self.push_source(
            member,
            format!(
                "void {c}::Set{name}(lua_State *L) {{\n\
                 \tif ({f}Ref != LUA_NOREF && {f}State) {{\n\
                 \t\tlua_unref({f}State, {f}Ref);\n\
                 \t}}\n\
                 \n\
                 \tif (lua_isfunction(L, -1)) {{\n\
                 \t\t{f}Ref = lua_ref(L, -1);\n\
                 \t\t{f}State = L;\n\
                 \t}} else if (lua_isnil(L, -1)) {{\n\
                 \t\t{f}Ref = LUA_NOREF;\n\
                 \t\t{f}State = nullptr;\n\
                 \t}} else {{\n\
                 \t\tluaL_typeerror(L, -1, \"function\");\n\
                 \t}}\n\
                 }}\n",
                c = class,
                name = member.name,
                f = field
            ),
        );

        if scriptable {
            let types: Vec<&str> = params.iter().map(|p| p.ty.target.as_str()).collect();
            let mut args = vec![member_tag_list(member)];
            args.extend(params.iter().map(|p| quoted(&p.name)));
            self.push_bind(format!(
                "ClassDB::BindCallback<T, \"{}\", {}({}), &{}::Set{}, {}, ThreadSafety::{}>({});",
                member.name,
                ret.target,
                types.join(", "),
                class,
                member.name,
                security_level(&member.security.write),
                thread_safety(&member.thread_safety),
                args.join(", ")
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

fn keep_section(blocks: &Blocks, name: &str) -> RenderedBlock {
    let id = BlockId::section(name);
    let text = blocks.preserved(&id).unwrap_or_default().to_string();
    RenderedBlock::preserved(id, text)
}

/// Reports preserved blocks from the previous artifact whose identity the new
/// one no longer has. Their text is dropped.
fn report_dropped(
    class: &str,
    previous: &Blocks,
    emitted: &[RenderedBlock],
    sections: &[&str],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for block in previous.iter() {
        if block.origin != Origin::Preserved {
            continue;
        }
        let carried = emitted.iter().any(|b| b.id == block.id)
            || sections
                .iter()
                .any(|s| block.id == BlockId::section(s));
        if !carried {
            diagnostics.push(Diagnostic::class(
                W_UNKNOWN_BLOCK,
                class,
                format!("preserved block {} is no longer emitted; dropped", block.id),
            ));
        }
    }
}

/// Generate the artifact pair for `class`. `record` is the class's scan
/// record, or [`ScanRecord::fresh`] for a class with no artifacts yet.
///
/// A member whose types cannot be resolved fails the whole class; stale and
/// invalid configuration only skips the member and is reported in
/// [`GeneratedClass::diagnostics`].
pub fn generate(
    class: &ClassMetadata,
    record: &ScanRecord,
    ctx: &GenContext<'_>,
) -> Result<GeneratedClass> {
    let mut diagnostics = Vec::new();
    let (config, resolved) = resolve_config(class, record, &mut diagnostics);
    let plans = plan_members(class, record, &resolved, &mut diagnostics);
    debug!(
        "Generating {}: {} of {} member(s) configured",
        class.name,
        plans.len(),
        class.members.len()
    );

    let mut emitter = Emitter::new(class, record, ctx);
    for plan in &plans {
        emitter.emit(plan)?;
    }

    let base = class.superclass.as_deref().unwrap_or(DEFAULT_BASE);
    let base_include = emitter.class_include(base);
    emitter.includes.insert(&base_include);

    let header_path = record.header_path_or_default();
    let source_path = record.source_path_or_default();

    report_dropped(
        &class.name,
        &record.source_blocks,
        &emitter.source_blocks,
        SOURCE_KEEP_SECTIONS,
        &mut emitter.diagnostics,
    );
    report_dropped(
        &class.name,
        &record.header_blocks,
        &emitter.header_blocks,
        HEADER_KEEP_SECTIONS,
        &mut emitter.diagnostics,
    );
    diagnostics.append(&mut emitter.diagnostics);

    let header = render_header(&HeaderLayout {
        class_name: &class.name,
        base_name: base,
        class_macro: class_macro(class, base),
        namespace: ctx.namespace,
        config_json: config.to_json(),
        includes: &emitter.includes,
        keep_includes: keep_section(&record.header_blocks, SECTION_INCLUDES),
        members: emitter.header_blocks,
        keep_public: keep_section(&record.header_blocks, SECTION_PUBLIC),
        bind: RenderedBlock::generated(BlockId::section(SECTION_BIND), emitter.bind),
        keep_protected: keep_section(&record.header_blocks, SECTION_PROTECTED),
        fields: RenderedBlock::generated(BlockId::section(SECTION_FIELDS), emitter.fields),
        keep_private: keep_section(&record.header_blocks, SECTION_PRIVATE),
    });

    let source = render_source(&SourceLayout {
        class_name: &class.name,
        own_header: quoted(&format!("{}/{}", ctx.include_prefix, header_path)),
        namespace: ctx.namespace,
        keep_includes: keep_section(&record.source_blocks, SECTION_INCLUDES),
        members: emitter.source_blocks,
        keep_source: keep_section(&record.source_blocks, SECTION_SOURCE),
    });

    Ok(GeneratedClass {
        class_name: class.name.clone(),
        header_path,
        source_path,
        header,
        source,
        config,
        diagnostics,
    })
}
