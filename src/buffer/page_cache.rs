//! PageCache - the bounded map of resident pages.
//!
//! The [`PageCache`] owns the residency invariant: it never holds more than
//! `capacity` pages, and it only ever evicts a clean page. It does no I/O
//! and takes no locks of its own; the [`BufferPool`](super::BufferPool)
//! wraps it in a mutex and feeds it pages read from storage.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::buffer::replacer::LruReplacer;
use crate::buffer::PageHandle;
use crate::common::{Error, PageId, Result, TransactionId};

/// Bounded PageId → page map with LRU, no-steal eviction.
pub struct PageCache {
    capacity: usize,
    entries: HashMap<PageId, PageHandle>,
    recency: LruReplacer,
}

impl PageCache {
    /// Create an empty cache.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            recency: LruReplacer::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident pages.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, page_id: PageId) -> bool {
        self.entries.contains_key(&page_id)
    }

    /// Look up a page and mark it most recently used.
    pub fn get(&mut self, page_id: PageId) -> Option<PageHandle> {
        let handle = self.entries.get(&page_id)?;
        self.recency.record_access(page_id);
        Some(Arc::clone(handle))
    }

    /// Look up a page without touching recency.
    pub fn peek(&self, page_id: PageId) -> Option<&PageHandle> {
        self.entries.get(&page_id)
    }

    /// Make `handle` the resident copy of its page.
    ///
    /// Replaces any existing entry for the same page. A new page evicts the
    /// least recently used clean page when the cache is full; the evicted
    /// page id is returned.
    ///
    /// # Errors
    /// `Error::EvictionExhausted` if the cache is full and every resident
    /// page is dirty. Nothing is changed in that case.
    pub fn insert(&mut self, handle: PageHandle) -> Result<Option<PageId>> {
        let page_id = handle.page_id();

        let evicted = if self.entries.contains_key(&page_id) {
            None
        } else if self.entries.len() >= self.capacity {
            Some(self.evict()?)
        } else {
            None
        };

        self.entries.insert(page_id, handle);
        self.recency.record_access(page_id);
        debug_assert!(self.entries.len() <= self.capacity);
        Ok(evicted)
    }

    /// Drop the least recently used clean page.
    ///
    /// Clean pages equal their on-disk contents, so nothing is written.
    pub fn evict(&mut self) -> Result<PageId> {
        let entries = &self.entries;
        let victim = self
            .recency
            .victim(|page_id| entries.get(&page_id).is_some_and(|h| !h.is_dirty()))
            .ok_or(Error::EvictionExhausted {
                capacity: self.capacity,
            })?;

        self.remove(victim);
        debug!("evicted {}", victim);
        Ok(victim)
    }

    /// Remove a page unconditionally, dirty or not.
    pub fn remove(&mut self, page_id: PageId) -> Option<PageHandle> {
        self.recency.remove(page_id);
        self.entries.remove(&page_id)
    }

    /// Pages dirty-owned by `txn`, in page id order.
    pub fn dirty_pages(&self, txn: TransactionId) -> Vec<PageHandle> {
        let mut pages: Vec<PageHandle> = self
            .entries
            .values()
            .filter(|h| h.dirty_owner() == Some(txn))
            .cloned()
            .collect();
        pages.sort_by_key(|h| h.page_id());
        pages
    }

    /// Every dirty page, in page id order.
    pub fn all_dirty_pages(&self) -> Vec<PageHandle> {
        let mut pages: Vec<PageHandle> = self
            .entries
            .values()
            .filter(|h| h.is_dirty())
            .cloned()
            .collect();
        pages.sort_by_key(|h| h.page_id());
        pages
    }

    /// Resident page ids from least to most recently used.
    pub fn recency_order(&self) -> Vec<PageId> {
        self.recency.iter().collect()
    }
}
