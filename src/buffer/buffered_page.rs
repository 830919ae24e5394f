//! BufferedPage - one resident page in the buffer pool.
//!
//! A [`BufferedPage`] holds a [`Page`] plus the metadata the pool needs
//! for no-steal eviction and rollback:
//! - Which transaction has uncommitted writes on it (the dirty owner)
//! - The before-image: the page as of the last commit
//! - Whether uncommitted bytes already reached storage

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{PageId, TransactionId};
use crate::storage::page::Page;

/// Shared handle to a resident page.
///
/// Handles stay valid after the page leaves the cache; they then refer to
/// a detached copy that the pool no longer serves.
pub type PageHandle = Arc<BufferedPage>;

/// A resident page and its transaction metadata.
///
/// # Thread Safety
/// All fields use interior mutability:
/// - `page`: `RwLock` so a reader never sees a half-written tuple
/// - `dirty_owner`: `Mutex`, read by eviction under the cache mutex
/// - `before_image`: `Mutex`, replaced on first write and after commit
/// - `written_back`: `AtomicBool`, set by an early flush, cleared on commit
///
/// Page-level locks in the [`LockManager`](crate::concurrency::LockManager)
/// decide *who* may read or write; these latches only make each access
/// memory-safe.
pub struct BufferedPage {
    page_id: PageId,

    /// The current contents, including uncommitted writes.
    page: RwLock<Page>,

    /// Transaction whose uncommitted writes are on this page.
    dirty_owner: Mutex<Option<TransactionId>>,

    /// Contents as of the last commit epoch.
    before_image: Mutex<Page>,

    /// Uncommitted contents were written to storage ahead of commit.
    written_back: AtomicBool,
}

impl BufferedPage {
    /// Wrap a clean page freshly read from storage.
    pub fn new(page_id: PageId, page: Page) -> Self {
        Self {
            page_id,
            before_image: Mutex::new(page.clone()),
            page: RwLock::new(page),
            dirty_owner: Mutex::new(None),
            written_back: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    // ========================================================================
    // Page access (RwLock)
    // ========================================================================

    /// Acquire read latch on the page.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write latch on the page on behalf of `txn`.
    ///
    /// Marks the page dirty-owned by `txn` before any byte can change. If
    /// the page was clean, its current contents become the before-image.
    /// The caller must hold an exclusive lock on the page.
    pub fn write_as(&self, txn: TransactionId) -> RwLockWriteGuard<'_, Page> {
        let guard = self.page.write();
        let mut owner = self.dirty_owner.lock();
        debug_assert!(
            owner.is_none() || *owner == Some(txn),
            "{} dirtied by {:?} while {} writes",
            self.page_id,
            *owner,
            txn
        );
        if owner.is_none() {
            self.before_image.lock().copy_from(&guard);
        }
        *owner = Some(txn);
        guard
    }

    // ========================================================================
    // Dirty ownership
    // ========================================================================

    /// Transaction with uncommitted writes on this page, if any.
    #[inline]
    pub fn dirty_owner(&self) -> Option<TransactionId> {
        *self.dirty_owner.lock()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty_owner().is_some()
    }

    /// Record `txn` as the dirty owner without writing.
    ///
    /// Used when a page was mutated through [`write_as`](Self::write_as)
    /// and is being reinstalled in the cache.
    pub fn mark_dirty(&self, txn: TransactionId) {
        let page = self.page.read();
        let mut owner = self.dirty_owner.lock();
        if owner.is_none() {
            self.before_image.lock().copy_from(&page);
        }
        *owner = Some(txn);
    }

    /// Clear dirty ownership after the page reached storage.
    ///
    /// The flushed contents become the new before-image, starting the next
    /// commit epoch.
    pub fn mark_clean(&self) {
        let page = self.page.read();
        self.before_image.lock().copy_from(&page);
        *self.dirty_owner.lock() = None;
        self.written_back.store(false, Ordering::Release);
    }

    /// Record that the uncommitted contents reached storage while the page
    /// stays dirty-owned. Abort must then write the before-image back.
    pub fn mark_written_back(&self) {
        self.written_back.store(true, Ordering::Release);
    }

    /// Whether storage holds uncommitted contents of this page.
    #[inline]
    pub fn is_written_back(&self) -> bool {
        self.written_back.load(Ordering::Acquire)
    }

    /// Copy of the page as of the last commit.
    pub fn before_image(&self) -> Page {
        self.before_image.lock().clone()
    }
}

impl std::fmt::Debug for BufferedPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedPage")
            .field("page_id", &self.page_id)
            .field("dirty_owner", &self.dirty_owner())
            .finish()
    }
}
