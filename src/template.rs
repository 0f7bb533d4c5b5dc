//! Artifact templates.
//!
//! Fixed layouts for the declaration and definition files. The generator
//! fills in blocks; everything between them is rebuilt from these templates
//! on every run, so output depends only on metadata, configuration and
//! preserved block text.

use std::collections::BTreeSet;

use crate::licenser::CPP_LICENSE_HEADER;
use crate::parse::{
    BlockId, Origin, BEGIN_MARKER, CLASS_MARKER, CONFIG_BEGIN_MARKER, CONFIG_END_MARKER,
    END_MARKER,
};

pub const SECTION_INCLUDES: &str = "Includes";
pub const SECTION_PUBLIC: &str = "Public";
pub const SECTION_PROTECTED: &str = "Protected";
pub const SECTION_PRIVATE: &str = "Private";
pub const SECTION_SOURCE: &str = "Source";
pub const SECTION_BIND: &str = "Bind";
pub const SECTION_FIELDS: &str = "Fields";

/// Preserved sections of the declaration file.
pub const HEADER_KEEP_SECTIONS: &[&str] = &[
    SECTION_INCLUDES,
    SECTION_PUBLIC,
    SECTION_PROTECTED,
    SECTION_PRIVATE,
];

/// Preserved sections of the definition file.
pub const SOURCE_KEEP_SECTIONS: &[&str] = &[SECTION_INCLUDES, SECTION_SOURCE];

// ═══════════════════════════════════════════════════════════════════════════════
// INCLUDES
// ═══════════════════════════════════════════════════════════════════════════════

/// De-duplicated include set. System includes render before quoted ones,
/// each group sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Includes(BTreeSet<String>);

impl Includes {
    pub fn insert(&mut self, directive: &str) {
        self.0.insert(directive.to_string());
    }

    fn system(&self) -> impl Iterator<Item = &String> {
        self.0.iter().filter(|i| i.starts_with('<'))
    }

    fn quoted(&self) -> impl Iterator<Item = &String> {
        self.0.iter().filter(|i| !i.starts_with('<'))
    }
}

fn push_include_group<'a>(out: &mut String, group: impl Iterator<Item = &'a String>) {
    let mut any = false;
    for include in group {
        out.push_str("#include ");
        out.push_str(include);
        out.push('\n');
        any = true;
    }
    if any {
        out.push('\n');
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCKS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub id: BlockId,
    pub origin: Origin,
    pub text: String,
}

impl RenderedBlock {
    pub fn generated(id: BlockId, text: String) -> Self {
        Self {
            id,
            origin: Origin::Generated,
            text,
        }
    }

    pub fn preserved(id: BlockId, text: String) -> Self {
        Self {
            id,
            origin: Origin::Preserved,
            text,
        }
    }
}

fn push_block(out: &mut String, indent: &str, block: &RenderedBlock) {
    out.push_str(indent);
    out.push_str(BEGIN_MARKER);
    out.push(' ');
    out.push_str(block.origin.as_str());
    out.push(' ');
    out.push_str(&block.id.to_string());
    out.push('\n');
    out.push_str(&block.text);
    if !block.text.is_empty() && !block.text.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(indent);
    out.push_str(END_MARKER);
    out.push('\n');
}

// ═══════════════════════════════════════════════════════════════════════════════
// HEADER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct HeaderLayout<'a> {
    pub class_name: &'a str,
    pub base_name: &'a str,
    /// Full class macro line, without indentation.
    pub class_macro: String,
    pub namespace: &'a str,
    pub config_json: String,
    pub includes: &'a Includes,
    pub keep_includes: RenderedBlock,
    pub members: Vec<RenderedBlock>,
    pub keep_public: RenderedBlock,
    pub bind: RenderedBlock,
    pub keep_protected: RenderedBlock,
    pub fields: RenderedBlock,
    pub keep_private: RenderedBlock,
}

pub fn render_header(layout: &HeaderLayout<'_>) -> String {
    let mut out = String::new();

    out.push_str(CPP_LICENSE_HEADER);
    out.push_str("#pragma once\n\n");
    out.push_str(&format!("{} {}\n\n", CLASS_MARKER, layout.class_name));

    out.push_str(CONFIG_BEGIN_MARKER);
    out.push('\n');
    out.push_str(&layout.config_json);
    out.push('\n');
    out.push_str(CONFIG_END_MARKER);
    out.push_str("\n\n");

    push_include_group(&mut out, layout.includes.system());
    out.push_str("#include \"lua.h\"\n\n");
    push_include_group(&mut out, layout.includes.quoted());
    push_block(&mut out, "", &layout.keep_includes);
    out.push('\n');

    out.push_str(&format!("namespace {} {{\n\n", layout.namespace));
    out.push_str(&format!(
        "class {} : public {} {{\n",
        layout.class_name, layout.base_name
    ));
    out.push('\t');
    out.push_str(&layout.class_macro);
    out.push_str("\n\npublic:\n");
    for block in &layout.members {
        push_block(&mut out, "\t", block);
        out.push('\n');
    }
    push_block(&mut out, "\t", &layout.keep_public);

    out.push_str("\nprotected:\n");
    out.push_str("\ttemplate <typename T>\n");
    out.push_str("\tstatic void BindMembers() {\n");
    out.push_str(&format!("\t\t{}::BindMembers<T>();\n\n", layout.base_name));
    push_block(&mut out, "\t\t", &layout.bind);
    out.push_str("\t}\n\n");
    push_block(&mut out, "\t", &layout.keep_protected);

    out.push_str("\nprivate:\n");
    push_block(&mut out, "\t", &layout.fields);
    out.push('\n');
    push_block(&mut out, "\t", &layout.keep_private);
    out.push_str("};\n\n");

    out.push_str(&format!("}} //namespace {}\n", layout.namespace));
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

pub struct SourceLayout<'a> {
    pub class_name: &'a str,
    /// Include directive argument for the class's own header.
    pub own_header: String,
    pub namespace: &'a str,
    pub keep_includes: RenderedBlock,
    pub members: Vec<RenderedBlock>,
    pub keep_source: RenderedBlock,
}

pub fn render_source(layout: &SourceLayout<'_>) -> String {
    let mut out = String::new();

    out.push_str(CPP_LICENSE_HEADER);
    out.push_str(&format!("#include {}\n\n", layout.own_header));
    out.push_str(&format!("{} {}\n\n", CLASS_MARKER, layout.class_name));
    out.push_str("#include \"lua.h\"\n\n");
    out.push_str("#include \"Sbx/Runtime/Stack.hpp\"\n\n");
    push_block(&mut out, "", &layout.keep_includes);
    out.push('\n');

    out.push_str(&format!("namespace {} {{\n\n", layout.namespace));
    for block in &layout.members {
        push_block(&mut out, "", block);
        out.push('\n');
    }
    push_block(&mut out, "", &layout.keep_source);
    out.push('\n');
    out.push_str(&format!("}} //namespace {}\n", layout.namespace));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_group_system_before_quoted() {
        let mut includes = Includes::default();
        includes.insert("\"Sbx/Classes/Instance.hpp\"");
        includes.insert("<memory>");
        includes.insert("<cstdint>");
        includes.insert("<memory>");

        let mut out = String::new();
        push_include_group(&mut out, includes.system());
        push_include_group(&mut out, includes.quoted());
        assert_eq!(
            out,
            "#include <cstdint>\n#include <memory>\n\n#include \"Sbx/Classes/Instance.hpp\"\n\n"
        );
    }

    #[test]
    fn empty_block_renders_adjacent_markers() {
        let mut out = String::new();
        push_block(
            &mut out,
            "\t",
            &RenderedBlock::preserved(BlockId::section(SECTION_PUBLIC), String::new()),
        );
        assert_eq!(
            out,
            "\t// @sbx-begin keep Section:Public\n\t// @sbx-end\n"
        );
    }
}
