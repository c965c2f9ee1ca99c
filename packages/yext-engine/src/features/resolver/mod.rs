//! Resolver
//!
//! Walks the syntax tree of one document and produces its value:
//! expressions are evaluated lazily (so `$this` may point forward), template
//! calls re-evaluate a subtree under fresh locals, imports are delegated to
//! an [`ImportHost`] and private paths are stripped from the output.

mod context;
mod expression;
mod host;
mod output;
mod private;
mod stringify;
mod traverse;

pub use context::{resolve_document, NodeState, ResolveInput, Resolver};
pub use host::ImportHost;
pub use output::ResolvedDocument;
pub use private::remove_private;
pub use stringify::value_to_text;
pub use traverse::traverse_value;
