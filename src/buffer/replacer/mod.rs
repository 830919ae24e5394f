//! Eviction ordering (replacers).
//!
//! - [`LruReplacer`] - true least-recently-used order, the authoritative
//!   eviction policy of the page cache

mod lru;

pub use lru::{LruIter, LruReplacer};
