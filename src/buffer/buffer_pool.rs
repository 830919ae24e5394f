//! Buffer Pool - the lock-gated page cache.
//!
//! The [`BufferPool`] provides:
//! - Page access under strict two-phase locking
//! - Bounded residency with no-steal LRU eviction
//! - Tuple insert/delete routed through each table's heap file
//! - Transaction completion: commit flush or abort restore, then unlock

use std::sync::Arc;
use std::time::Duration;

use log::{trace, warn};
use parking_lot::Mutex;
use rand::Rng;

use crate::buffer::{BufferPoolStats, BufferedPage, PageCache, PageHandle};
use crate::catalog::Catalog;
use crate::common::config::BufferPoolConfig;
use crate::common::{FileId, PageId, Result, TransactionId};
use crate::concurrency::{LockGrant, LockManager, LockMode, Transaction};
use crate::recovery::{RecoveryCoordinator, WriteAheadLog};
use crate::storage::RecordId;

/// Mediates every access to on-disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                        BufferPool                           │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ lock_manager │  │      cache: Mutex<PageCache>      │   │
/// │  │ PageId→Locks │  │  PageId → BufferedPage  +  LRU    │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │   catalog    │  │   recovery   │  │    stats     │      │
/// │  │ FileId→Heap  │  │ log + passes │  │   atomics    │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// - `lock_manager`: its own mutex, held for one grant/release decision
/// - `cache`: `Mutex`, held for one lookup/insert/evict, or for the whole
///   flush/restore pass of one completing transaction
/// - `stats`: No lock, all atomic counters
///
/// Storage reads on a miss happen outside the cache mutex. Waiting for a
/// page lock is the only place a caller blocks.
///
/// # Usage
/// ```ignore
/// let handle = pool.get_page(txn.id(), page_id, LockMode::Exclusive)?;
/// handle.write_as(txn.id()).as_mut_slice()[0] = 0xAB;
/// pool.mark_dirty(txn.id(), &[handle])?;
/// pool.transaction_complete(&mut txn, true)?;
/// ```
pub struct BufferPool {
    config: BufferPoolConfig,
    catalog: Arc<Catalog>,
    lock_manager: LockManager,
    cache: Mutex<PageCache>,
    recovery: RecoveryCoordinator,
    stats: BufferPoolStats,
}

impl BufferPool {
    /// Create a buffer pool over the tables in `catalog`.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if `config` does not validate.
    pub fn new(
        config: BufferPoolConfig,
        catalog: Arc<Catalog>,
        log: Arc<dyn WriteAheadLog>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            cache: Mutex::new(PageCache::new(config.capacity)),
            config,
            catalog,
            lock_manager: LockManager::new(),
            recovery: RecoveryCoordinator::new(log),
            stats: BufferPoolStats::new(),
        })
    }

    // ========================================================================
    // Public API: Page access
    // ========================================================================

    /// Lock `page_id` for `txn` in `mode` and return the resident page.
    ///
    /// A resident page is returned without touching storage. Otherwise the
    /// page is read from its heap file, evicting the least recently used
    /// clean page if the pool is full.
    ///
    /// # Errors
    /// - `Error::LockTimeout` if the lock is not granted within the wait
    ///   bound; the caller must abort `txn`
    /// - `Error::EvictionExhausted` if every resident page is dirty
    /// - `Error::NoSuchTable` / `Error::PageOutOfRange` / `Error::Io` from
    ///   resolving the miss
    ///
    /// Only `LockTimeout` leaves the lock table untouched. On every other
    /// error the lock on `page_id` has been granted and stays held until
    /// `txn` completes.
    pub fn get_page(&self, txn: TransactionId, page_id: PageId, mode: LockMode) -> Result<PageHandle> {
        self.lock_page(txn, page_id, mode)?;

        if let Some(handle) = self.cache.lock().get(page_id) {
            self.stats.record_hit();
            return Ok(handle);
        }

        self.stats.record_miss();
        let file = self.catalog.file_for(page_id.file_id)?;
        let page = file.read_page(page_id.page_no)?;
        trace!("{} read {} from storage", txn, page_id);

        let mut cache = self.cache.lock();
        // Another sharer may have loaded it while we were reading
        if let Some(handle) = cache.get(page_id) {
            return Ok(handle);
        }

        let handle = Arc::new(BufferedPage::new(page_id, page));
        self.install(&mut cache, Arc::clone(&handle))?;
        Ok(handle)
    }

    /// Mark `pages` dirty-owned by `txn` and make them the resident copies.
    ///
    /// # Errors
    /// `Error::EvictionExhausted` if a page is not resident and nothing can
    /// be evicted to make room for it.
    pub fn mark_dirty(&self, txn: TransactionId, pages: &[PageHandle]) -> Result<()> {
        let mut cache = self.cache.lock();
        for handle in pages {
            handle.mark_dirty(txn);
            self.install(&mut cache, Arc::clone(handle))?;
        }
        Ok(())
    }

    /// Remove a page from the cache without writing it back.
    ///
    /// Uncommitted changes on the page are lost.
    pub fn discard_page(&self, page_id: PageId) -> bool {
        self.cache.lock().remove(page_id).is_some()
    }

    fn install(&self, cache: &mut PageCache, handle: PageHandle) -> Result<()> {
        match cache.insert(handle) {
            Ok(Some(_)) => {
                self.stats.record_eviction();
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }

    // ========================================================================
    // Public API: Tuples
    // ========================================================================

    /// Insert `data` into `table` on behalf of `txn`.
    pub fn insert_tuple(&self, txn: TransactionId, table: FileId, data: &[u8]) -> Result<RecordId> {
        let file = self.catalog.file_for(table)?;
        let (record_id, pages) = file.insert_tuple(txn, data, self)?;
        self.mark_dirty(txn, &pages)?;
        Ok(record_id)
    }

    /// Delete the tuple at `record_id` on behalf of `txn`.
    pub fn delete_tuple(&self, txn: TransactionId, record_id: RecordId) -> Result<()> {
        let file = self.catalog.file_for(record_id.page_id.file_id)?;
        let pages = file.delete_tuple(txn, record_id, self)?;
        self.mark_dirty(txn, &pages)
    }

    // ========================================================================
    // Public API: Locks
    // ========================================================================

    /// Whether `txn` holds any lock on `page_id`.
    pub fn holds_lock(&self, txn: TransactionId, page_id: PageId) -> bool {
        self.lock_manager.holds(page_id, txn)
    }

    /// Release one lock before `txn` completes.
    ///
    /// This breaks strict two-phase locking. It is only sound for a page
    /// `txn` has merely looked at and whose contents did not influence
    /// anything it wrote.
    pub fn unsafe_release_page(&self, txn: TransactionId, page_id: PageId) -> bool {
        self.lock_manager.release(page_id, txn)
    }

    fn lock_page(&self, txn: TransactionId, page_id: PageId, mode: LockMode) -> Result<()> {
        if self.lock_manager.acquire(page_id, txn, mode) == LockGrant::Granted {
            return Ok(());
        }

        self.stats.record_lock_wait();
        self.lock_manager
            .acquire_timeout(page_id, txn, mode, self.wait_bound())
            .map_err(|e| {
                self.stats.record_lock_timeout();
                e
            })
    }

    /// Fixed timeout plus a uniformly random share of the jitter.
    fn wait_bound(&self) -> Duration {
        let jitter = self.config.lock_timeout_jitter;
        if jitter.is_zero() {
            return self.config.lock_timeout;
        }
        self.config.lock_timeout + jitter.mul_f64(rand::thread_rng().gen::<f64>())
    }

    // ========================================================================
    // Public API: Transaction completion
    // ========================================================================

    /// Commit or abort `txn`, then release all of its locks.
    ///
    /// Commit logs, forces and writes back every page `txn` dirtied. If any
    /// of that fails, the remaining dirty pages are rolled back as in an
    /// abort and the error is returned. Abort restores every page `txn`
    /// dirtied from storage. Either way `txn` ends up `Completed` with no
    /// locks held.
    ///
    /// # Errors
    /// `Error::TransactionCompleted` if `txn` is not active; otherwise the
    /// first failure of the commit flush.
    pub fn transaction_complete(&self, txn: &mut Transaction, commit: bool) -> Result<()> {
        txn.begin_completion(commit)?;
        let id = txn.id();

        let outcome = {
            let mut cache = self.cache.lock();
            if commit {
                match self.recovery.commit(&mut cache, &self.catalog, id) {
                    Ok(written) => {
                        self.stats.record_writes(written);
                        Ok(())
                    }
                    Err(e) => {
                        warn!("commit of {} failed, rolling back: {}", id, e);
                        self.recovery.abort(&mut cache, &self.catalog, id);
                        Err(e)
                    }
                }
            } else {
                self.recovery.abort(&mut cache, &self.catalog, id);
                Ok(())
            }
        };

        self.recovery.release_locks(&self.lock_manager, id);
        txn.finish();
        self.stats.record_completion(commit && outcome.is_ok());
        outcome
    }

    // ========================================================================
    // Public API: Flush
    // ========================================================================

    /// Write back every dirty page, whoever owns it.
    ///
    /// This breaks no-steal: uncommitted writes reach storage. Meant for
    /// tests and orderly shutdown. Returns how many pages were written.
    pub fn flush_all_pages(&self) -> Result<usize> {
        let cache = self.cache.lock();
        let pages = cache.all_dirty_pages();
        for handle in &pages {
            self.recovery.flush_page(handle, &self.catalog)?;
            self.stats.record_writes(1);
        }
        Ok(pages.len())
    }

    /// Write back the pages `txn` dirtied without completing it.
    ///
    /// The pages stay dirty-owned by `txn` and keep their before-images, so
    /// they are still not evictable and an abort of `txn` writes the
    /// before-images back to storage. Returns how many pages were written.
    pub fn flush_pages(&self, txn: TransactionId) -> Result<usize> {
        let cache = self.cache.lock();
        let pages = cache.dirty_pages(txn);
        for handle in &pages {
            self.recovery.flush_uncommitted(handle, &self.catalog)?;
            self.stats.record_writes(1);
        }
        Ok(pages.len())
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    pub fn config(&self) -> &BufferPoolConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Maximum number of resident pages.
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Number of pages currently resident.
    pub fn resident_count(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.cache.lock().contains(page_id)
    }

    /// The resident copy of `page_id`, without locking or touching recency.
    pub fn peek_page(&self, page_id: PageId) -> Option<PageHandle> {
        self.cache.lock().peek(page_id).cloned()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.config)
            .field("resident", &self.resident_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::recovery::NullLog;
    use crate::storage::page::Page;
    use std::io;
    use tempfile::tempdir;

    /// Helper to create a pool over one table of `pages` empty pages.
    fn create_test_pool(capacity: usize, pages: u32) -> (BufferPool, FileId, tempfile::TempDir) {
        create_test_pool_with_log(capacity, pages, Arc::new(NullLog))
    }

    fn create_test_pool_with_log(
        capacity: usize,
        pages: u32,
        log: Arc<dyn WriteAheadLog>,
    ) -> (BufferPool, FileId, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(Catalog::new());
        let id = catalog.create_table("t", dir.path().join("t.dat"), 8).unwrap();
        let file = catalog.file_for(id).unwrap();
        for _ in 0..pages {
            file.append_empty_page().unwrap();
        }

        let config = BufferPoolConfig::default()
            .with_capacity(capacity)
            .with_lock_timeout(Duration::from_millis(50))
            .with_lock_timeout_jitter(Duration::ZERO);
        (BufferPool::new(config, catalog, log).unwrap(), id, dir)
    }

    fn txn(n: u64) -> Transaction {
        Transaction::new(TransactionId::new(n))
    }

    /// Write `byte` at offset 0 of `page_id` as `txn` and register the change.
    fn scribble(pool: &BufferPool, txn: TransactionId, page_id: PageId, byte: u8) -> Result<()> {
        let handle = pool.get_page(txn, page_id, LockMode::Exclusive)?;
        handle.write_as(txn).as_mut_slice()[0] = byte;
        pool.mark_dirty(txn, &[handle])
    }

    struct FailingForce;

    impl WriteAheadLog for FailingForce {
        fn log_write(&self, _: TransactionId, _: PageId, _: &Page, _: &Page) -> Result<()> {
            Ok(())
        }

        fn force(&self) -> Result<()> {
            Err(Error::Io(io::Error::new(io::ErrorKind::Other, "disk full")))
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = BufferPoolConfig::default().with_capacity(0);
        let err = BufferPool::new(config, Arc::new(Catalog::new()), Arc::new(NullLog)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_get_page_miss_then_hit() {
        let (pool, id, _dir) = create_test_pool(4, 2);
        let t = txn(1);
        let pid = PageId::new(id, 0);

        pool.get_page(t.id(), pid, LockMode::Shared).unwrap();
        pool.get_page(t.id(), pid, LockMode::Shared).unwrap();

        let snapshot = pool.stats().snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 1);
        assert!(pool.holds_lock(t.id(), pid));
    }

    #[test]
    fn test_page_out_of_range() {
        let (pool, id, _dir) = create_test_pool(4, 1);
        let t = TransactionId::new(1);
        let pid = PageId::new(id, 5);
        let err = pool.get_page(t, pid, LockMode::Shared).unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { num_pages: 1, .. }));
        // The lock was granted before the miss failed and is kept
        assert_eq!(pool.lock_manager().lock_mode(pid, t), Some(LockMode::Shared));
    }

    #[test]
    fn test_unknown_table() {
        let (pool, _id, _dir) = create_test_pool(4, 1);
        let err = pool
            .get_page(TransactionId::new(1), PageId::new(FileId(42), 0), LockMode::Shared)
            .unwrap_err();
        assert!(matches!(err, Error::NoSuchTable(42)));
    }

    #[test]
    fn test_residency_is_bounded() {
        let (pool, id, _dir) = create_test_pool(3, 10);
        let t = txn(1);

        for n in 0..10 {
            pool.get_page(t.id(), PageId::new(id, n), LockMode::Shared).unwrap();
            assert!(pool.resident_count() <= 3);
        }
        assert_eq!(pool.stats().snapshot().evictions, 7);
    }

    #[test]
    fn test_all_dirty_exhausts_eviction() {
        let (pool, id, _dir) = create_test_pool(2, 3);
        let a = TransactionId::new(1);

        scribble(&pool, a, PageId::new(id, 0), 1).unwrap();
        scribble(&pool, a, PageId::new(id, 1), 2).unwrap();

        let err = pool.get_page(a, PageId::new(id, 2), LockMode::Shared).unwrap_err();
        assert!(matches!(err, Error::EvictionExhausted { capacity: 2 }));
        assert!(pool.is_resident(PageId::new(id, 0)));
        assert!(pool.is_resident(PageId::new(id, 1)));
    }

    #[test]
    fn test_clean_page_evicted_before_dirty() {
        let (pool, id, _dir) = create_test_pool(2, 3);
        let a = TransactionId::new(1);

        scribble(&pool, a, PageId::new(id, 0), 1).unwrap();
        pool.get_page(a, PageId::new(id, 1), LockMode::Shared).unwrap();
        pool.get_page(a, PageId::new(id, 2), LockMode::Shared).unwrap();

        assert!(pool.is_resident(PageId::new(id, 0)));
        assert!(!pool.is_resident(PageId::new(id, 1)));
    }

    #[test]
    fn test_lock_timeout_leaves_holder_alone() {
        let (pool, id, _dir) = create_test_pool(4, 1);
        let (a, b) = (TransactionId::new(1), TransactionId::new(2));
        let pid = PageId::new(id, 0);

        pool.get_page(a, pid, LockMode::Exclusive).unwrap();
        let err = pool.get_page(b, pid, LockMode::Shared).unwrap_err();

        assert!(err.is_abort());
        assert_eq!(pool.lock_manager().locks_on(pid).len(), 1);
        assert_eq!(pool.lock_manager().lock_mode(pid, a), Some(LockMode::Exclusive));
        assert_eq!(pool.stats().snapshot().lock_timeouts, 1);
    }

    #[test]
    fn test_commit_writes_and_unlocks() {
        let (pool, id, _dir) = create_test_pool(4, 1);
        let mut t = txn(1);
        let pid = PageId::new(id, 0);

        scribble(&pool, t.id(), pid, 0x5A).unwrap();
        pool.transaction_complete(&mut t, true).unwrap();

        let file = pool.catalog().file_for(id).unwrap();
        assert_eq!(file.read_page(0).unwrap().as_slice()[0], 0x5A);
        assert!(!pool.holds_lock(t.id(), pid));
        assert!(!pool.peek_page(pid).unwrap().is_dirty());
        assert_eq!(pool.stats().snapshot().commits, 1);
    }

    #[test]
    fn test_abort_restores_and_unlocks() {
        let (pool, id, _dir) = create_test_pool(4, 1);
        let mut t = txn(1);
        let pid = PageId::new(id, 0);

        scribble(&pool, t.id(), pid, 0x5A).unwrap();
        pool.transaction_complete(&mut t, false).unwrap();

        let resident = pool.peek_page(pid).unwrap();
        assert_eq!(resident.read().as_slice()[0], 0);
        assert!(!resident.is_dirty());
        assert_eq!(pool.lock_manager().locked_page_count(), 0);
    }

    #[test]
    fn test_complete_twice_fails() {
        let (pool, _id, _dir) = create_test_pool(4, 1);
        let mut t = txn(1);

        pool.transaction_complete(&mut t, true).unwrap();
        let err = pool.transaction_complete(&mut t, false).unwrap_err();
        assert!(matches!(err, Error::TransactionCompleted(_)));
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let (pool, id, _dir) = create_test_pool_with_log(4, 1, Arc::new(FailingForce));
        let mut t = txn(1);
        let pid = PageId::new(id, 0);

        scribble(&pool, t.id(), pid, 0x77).unwrap();
        let err = pool.transaction_complete(&mut t, true).unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert_eq!(t.state(), crate::concurrency::TransactionState::Completed);
        assert_eq!(pool.lock_manager().locked_page_count(), 0);
        let file = pool.catalog().file_for(id).unwrap();
        assert_eq!(file.read_page(0).unwrap().as_slice()[0], 0);
        assert_eq!(pool.peek_page(pid).unwrap().read().as_slice()[0], 0);
    }

    #[test]
    fn test_unsafe_release_page() {
        let (pool, id, _dir) = create_test_pool(4, 1);
        let (a, b) = (TransactionId::new(1), TransactionId::new(2));
        let pid = PageId::new(id, 0);

        pool.get_page(a, pid, LockMode::Exclusive).unwrap();
        assert!(pool.unsafe_release_page(a, pid));
        assert!(!pool.unsafe_release_page(a, pid));

        pool.get_page(b, pid, LockMode::Exclusive).unwrap();
    }

    #[test]
    fn test_discard_page() {
        let (pool, id, _dir) = create_test_pool(4, 1);
        let pid = PageId::new(id, 0);

        scribble(&pool, TransactionId::new(1), pid, 9).unwrap();
        assert!(pool.discard_page(pid));
        assert!(!pool.is_resident(pid));
        assert!(!pool.discard_page(pid));
    }

    #[test]
    fn test_flush_all_pages() {
        let (pool, id, _dir) = create_test_pool(4, 3);
        let a = TransactionId::new(1);
        let b = TransactionId::new(2);

        scribble(&pool, a, PageId::new(id, 0), 1).unwrap();
        scribble(&pool, b, PageId::new(id, 2), 3).unwrap();

        assert_eq!(pool.flush_pages(a).unwrap(), 1);
        // a's page is on disk but still owned by a
        assert_eq!(pool.flush_all_pages().unwrap(), 2);
        assert_eq!(pool.flush_all_pages().unwrap(), 0);

        let file = pool.catalog().file_for(id).unwrap();
        assert_eq!(file.read_page(0).unwrap().as_slice()[0], 1);
        assert_eq!(file.read_page(2).unwrap().as_slice()[0], 3);
        assert_eq!(pool.stats().snapshot().pages_written, 3);
    }

    #[test]
    fn test_flush_pages_then_abort_restores_storage() {
        let (pool, id, _dir) = create_test_pool(4, 1);
        let mut t = txn(1);
        let pid = PageId::new(id, 0);
        let file = pool.catalog().file_for(id).unwrap();

        scribble(&pool, t.id(), pid, 0x5A).unwrap();
        assert_eq!(pool.flush_pages(t.id()).unwrap(), 1);
        assert_eq!(file.read_page(0).unwrap().as_slice()[0], 0x5A);
        assert_eq!(pool.peek_page(pid).unwrap().dirty_owner(), Some(t.id()));

        pool.transaction_complete(&mut t, false).unwrap();

        assert_eq!(file.read_page(0).unwrap().as_slice()[0], 0);
        let resident = pool.peek_page(pid).unwrap();
        assert_eq!(resident.read().as_slice()[0], 0);
        assert!(!resident.is_dirty());
    }

    #[test]
    fn test_flushed_page_stays_pinned_by_owner() {
        let (pool, id, _dir) = create_test_pool(1, 2);
        let a = TransactionId::new(1);

        scribble(&pool, a, PageId::new(id, 0), 0x11).unwrap();
        pool.flush_pages(a).unwrap();

        let err = pool
            .get_page(a, PageId::new(id, 1), LockMode::Shared)
            .unwrap_err();
        assert!(matches!(err, Error::EvictionExhausted { capacity: 1 }));
    }

    #[test]
    fn test_wait_bound_spreads_sub_millisecond_jitter() {
        let (pool, _id, _dir) = create_test_pool(1, 0);
        let config = pool
            .config()
            .with_lock_timeout(Duration::from_millis(5))
            .with_lock_timeout_jitter(Duration::from_micros(500));
        let pool = BufferPool::new(config, Arc::clone(pool.catalog()), Arc::new(NullLog)).unwrap();

        let bounds: Vec<Duration> = (0..32).map(|_| pool.wait_bound()).collect();
        for bound in &bounds {
            assert!(*bound >= Duration::from_millis(5));
            assert!(*bound < Duration::from_micros(5_500));
        }
        assert!(bounds.iter().any(|b| *b > Duration::from_millis(5)));
    }

    #[test]
    fn test_insert_and_delete_tuple() {
        let (pool, id, _dir) = create_test_pool(4, 0);
        let mut t = txn(1);

        let rid = pool.insert_tuple(t.id(), id, &[7u8; 8]).unwrap();
        assert_eq!(rid.page_id, PageId::new(id, 0));
        assert_eq!(rid.slot, 0);

        pool.delete_tuple(t.id(), rid).unwrap();
        let err = pool.delete_tuple(t.id(), rid).unwrap_err();
        assert!(matches!(err, Error::TupleNotFound { .. }));

        pool.transaction_complete(&mut t, true).unwrap();
    }

    #[test]
    fn test_insert_wrong_width() {
        let (pool, id, _dir) = create_test_pool(4, 0);
        let err = pool.insert_tuple(TransactionId::new(1), id, &[0u8; 3]).unwrap_err();
        assert!(matches!(err, Error::TupleSizeMismatch { expected: 8, actual: 3 }));
    }

    #[test]
    fn test_concurrent_readers_share_page() {
        use std::thread;

        let (pool, id, _dir) = create_test_pool(4, 1);
        let pool = Arc::new(pool);
        let pid = PageId::new(id, 0);

        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let handle = pool.get_page(TransactionId::new(n), pid, LockMode::Shared).unwrap();
                    assert_eq!(handle.read().as_slice()[0], 0);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.lock_manager().locks_on(pid).len(), 8);
        assert_eq!(pool.resident_count(), 1);
    }
}
