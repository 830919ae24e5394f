//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache between transactions and heap
//! files. Every page access goes through it and is gated by a page lock.
//!
//! # Components
//! - [`BufferPool`] - Lock-gated page access and transaction completion
//! - [`PageCache`] - Bounded resident-page map with no-steal eviction
//! - [`BufferedPage`] - A resident page + dirty owner + before-image
//! - [`BufferPoolStats`] - Counters
//! - [`replacer`] - LRU recency tracking

mod buffer_pool;
mod buffered_page;
mod page_cache;
pub mod replacer;
mod stats;

pub use buffer_pool::BufferPool;
pub use buffered_page::{BufferedPage, PageHandle};
pub use page_cache::PageCache;
pub use stats::{BufferPoolStats, StatsSnapshot};
