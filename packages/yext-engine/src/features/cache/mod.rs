//! Result cache
//!
//! Resolved documents are cached per (content hash, parameter hash). The
//! cache itself is generic over the stored value.

mod document_cache;
mod fingerprint;

pub use document_cache::{CacheEntry, CacheStats, ResultCache};
pub use fingerprint::{ContentHash, ParamHash};
