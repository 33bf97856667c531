//! Infrastructure layer for Sidecar
//!
//! Contains process execution, executable resolution and output parsing.

pub mod exec;
pub mod line_parser;
pub mod resolver;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash content for cache invalidation
#[inline]
pub fn hash_content(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}
