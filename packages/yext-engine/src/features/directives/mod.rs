//! Directive processor
//!
//! `%TAG`, `%PARAM`, `%LOCAL`, `%IMPORT`, `%PRIVATE`, `%FILENAME`.

mod processor;
mod types;

pub use processor::{has_yaml_extension, process_directives};
pub use types::{
    DirectiveTable, ImportDecl, PrivatePath, ProcessedDirectives, VariableDecl, CORE_TAG_PREFIX,
};
