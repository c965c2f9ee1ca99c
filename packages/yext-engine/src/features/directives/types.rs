//! Directive table types

use std::collections::BTreeMap;

use crate::features::tokenizer::KeyValue;
use crate::shared::models::{DeclaredType, Diagnostic, Span, Value};

/// `%PARAM` / `%LOCAL` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub alias: String,
    /// Declared default, `Null` when absent
    pub default: Value,
    pub declared_type: Option<DeclaredType>,
    pub span: Span,
}

/// `%IMPORT` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub alias: String,
    /// Target path as written, relative to the importing document
    pub path: String,
    /// `key=value` defaults, evaluated when the import is used
    pub defaults: Vec<KeyValue>,
    pub span: Span,
}

/// One `%PRIVATE` path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivatePath {
    pub segments: Vec<String>,
    pub span: Span,
}

impl PrivatePath {
    pub fn dotted(&self) -> String {
        self.segments.join(".")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveTable {
    /// Tag handle -> prefix
    pub tags: BTreeMap<String, String>,
    pub params: BTreeMap<String, VariableDecl>,
    pub locals: BTreeMap<String, VariableDecl>,
    pub imports: BTreeMap<String, ImportDecl>,
    pub private: Vec<PrivatePath>,
    /// Logical name from `%FILENAME`
    pub filename: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DirectiveTable {
    /// Expand a tag handle to its full prefix; unknown handles are kept.
    pub fn expand_tag(&self, handle: &str, suffix: &str) -> String {
        match handle {
            "!!" => format!("{}{}", CORE_TAG_PREFIX, suffix),
            _ => match self.tags.get(handle) {
                Some(prefix) => format!("{}{}", prefix, suffix),
                None => format!("{}{}", handle, suffix),
            },
        }
    }
}

pub const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Directive table plus the source text handed to the YAML parser
#[derive(Debug, Clone)]
pub struct ProcessedDirectives {
    pub table: DirectiveTable,
    /// Source with custom directive lines blanked to spaces, so byte
    /// offsets match the original
    pub body: String,
}
