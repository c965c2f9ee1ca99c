//! Syntax tree
//!
//! The YAML grammar itself comes from `yaml-rust2`; this feature turns its
//! marked event stream into an arena the resolver walks, keeping spans,
//! scalar styles, tags and anchor back-references.

mod loader;
mod node;
mod scalar;

pub use loader::load_tree;
pub use node::{NodeId, NodeKind, NodeTag, ScalarStyle, SyntaxNode, SyntaxTree};
pub use scalar::{coerce_core_tag, plain_scalar_value};
