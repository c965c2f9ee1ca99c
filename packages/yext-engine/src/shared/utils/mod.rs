//! Utility modules shared across features
//!
//! - `locals_stack`: Frames of template-call locals

pub mod locals_stack;

pub use locals_stack::LocalsStack;
