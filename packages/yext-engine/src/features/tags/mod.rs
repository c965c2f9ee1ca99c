//! Custom tags: registry of resolve/construct/represent hooks

mod registry;

pub use registry::{ConstructFn, RepresentFn, ResolveFn, TagDefinition, TagRegistry};
