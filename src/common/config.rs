//! Configuration constants and buffer pool settings.

use std::time::Duration;

use crate::common::{Error, Result};

/// Size of a page in bytes (4KB).
///
/// Every heap file is a flat sequence of pages of exactly this size.
/// Page `k` lives at byte range `[k * PAGE_SIZE, (k + 1) * PAGE_SIZE)`.
pub const PAGE_SIZE: usize = 4096;

/// Default number of resident pages in a buffer pool.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Minimum time a lock request waits before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(1000);

/// Upper bound of the random extra wait added to each lock request.
///
/// Randomizing the bound keeps two transactions that wait on each other
/// from timing out in lockstep and retrying into the same cycle.
pub const DEFAULT_LOCK_TIMEOUT_JITTER: Duration = Duration::from_millis(2000);

/// Settings for a [`BufferPool`](crate::buffer::BufferPool).
///
/// # Example
/// ```
/// use std::time::Duration;
/// use strictpool::common::config::BufferPoolConfig;
///
/// let config = BufferPoolConfig::default()
///     .with_capacity(8)
///     .with_lock_timeout(Duration::from_millis(50))
///     .with_lock_timeout_jitter(Duration::ZERO);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Maximum number of resident pages.
    pub capacity: usize,

    /// Fixed part of the lock wait bound.
    pub lock_timeout: Duration,

    /// Random part of the lock wait bound, drawn uniformly from `[0, jitter)`.
    pub lock_timeout_jitter: Duration,
}

impl BufferPoolConfig {
    /// Set the number of resident pages.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the fixed lock wait bound.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the random lock wait jitter.
    pub fn with_lock_timeout_jitter(mut self, jitter: Duration) -> Self {
        self.lock_timeout_jitter = jitter;
        self
    }

    /// Check that the settings describe a usable pool.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig("capacity must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_PAGES,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_timeout_jitter: DEFAULT_LOCK_TIMEOUT_JITTER,
        }
    }
}
