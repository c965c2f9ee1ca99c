//! Feature modules
//!
//! Leaves first: the tokenizer and the directive processor know nothing
//! about documents; the resolver drives them; the dependency graph and the
//! cache are owned by the pipeline; live reload sits above everything.

pub mod cache;
pub mod dependency;
pub mod directives;
pub mod file_watcher;
pub mod live_reload;
pub mod resolver;
pub mod syntax;
pub mod tags;
pub mod tokenizer;
