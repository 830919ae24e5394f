//! Transaction completion: commit flushes, abort restores.

use std::sync::Arc;

use log::{debug, warn};

use crate::buffer::{BufferedPage, PageCache, PageHandle};
use crate::catalog::Catalog;
use crate::common::{Result, TransactionId};
use crate::concurrency::LockManager;
use crate::recovery::WriteAheadLog;
use crate::storage::page::Page;

/// Runs the commit and abort passes over a transaction's dirty pages.
///
/// The caller holds the page cache mutex for the whole pass, so no other
/// transaction can install or evict pages in between.
pub struct RecoveryCoordinator {
    log: Arc<dyn WriteAheadLog>,
}

impl RecoveryCoordinator {
    pub fn new(log: Arc<dyn WriteAheadLog>) -> Self {
        Self { log }
    }

    pub fn log(&self) -> &Arc<dyn WriteAheadLog> {
        &self.log
    }

    /// Flush every page `txn` dirtied. Returns how many were written.
    ///
    /// Stops at the first failure; pages flushed before it stay clean and
    /// the rest stay dirty.
    pub fn commit(&self, cache: &mut PageCache, catalog: &Catalog, txn: TransactionId) -> Result<usize> {
        let pages = cache.dirty_pages(txn);
        for handle in &pages {
            self.flush_page(handle, catalog)?;
        }
        debug!("{} committed {} pages", txn, pages.len());
        Ok(pages.len())
    }

    /// Write one dirty page back under the log-before-data rule.
    ///
    /// The write record is logged and forced before the page is written
    /// to its heap file; only then does the page become clean. Clean pages
    /// are left alone.
    pub fn flush_page(&self, handle: &PageHandle, catalog: &Catalog) -> Result<()> {
        if self.write_back(handle, catalog)? {
            handle.mark_clean();
        }
        Ok(())
    }

    /// Write one dirty page back while its owner is still running.
    ///
    /// The page keeps its dirty owner and before-image, so an abort of the
    /// owner still restores storage.
    pub fn flush_uncommitted(&self, handle: &PageHandle, catalog: &Catalog) -> Result<()> {
        if self.write_back(handle, catalog)? {
            handle.mark_written_back();
        }
        Ok(())
    }

    /// Log, force, then write. Returns false for a clean page.
    fn write_back(&self, handle: &PageHandle, catalog: &Catalog) -> Result<bool> {
        let Some(owner) = handle.dirty_owner() else {
            return Ok(false);
        };
        let page_id = handle.page_id();
        let file = catalog.file_for(page_id.file_id)?;

        let page = handle.read();
        let before = handle.before_image();
        self.log.log_write(owner, page_id, &before, &page)?;
        self.log.force()?;
        file.write_page(page_id.page_no, &page)?;

        Ok(true)
    }

    /// Replace every page `txn` dirtied with its durable contents.
    ///
    /// Pages whose uncommitted contents were already written back get their
    /// before-image written to storage again, logged like any other write.
    /// A page that cannot be restored is dropped from the cache instead, so
    /// the next access reads storage again. Returns how many pages were
    /// restored.
    pub fn abort(&self, cache: &mut PageCache, catalog: &Catalog, txn: TransactionId) -> usize {
        let mut restored = 0;
        for handle in cache.dirty_pages(txn) {
            let page_id = handle.page_id();
            let durable = if handle.is_written_back() {
                self.undo_write_back(&handle, catalog, txn)
            } else {
                catalog
                    .file_for(page_id.file_id)
                    .and_then(|file| file.read_page(page_id.page_no))
            };

            match durable {
                Ok(page) => {
                    let fresh = Arc::new(BufferedPage::new(page_id, page));
                    // Already resident, so this replaces without evicting
                    if cache.insert(fresh).is_ok() {
                        restored += 1;
                    }
                }
                Err(e) => {
                    warn!("discarding {} after failed restore on abort: {}", page_id, e);
                    cache.remove(page_id);
                }
            }
        }
        debug!("{} aborted, restored {} pages", txn, restored);
        restored
    }

    fn undo_write_back(&self, handle: &PageHandle, catalog: &Catalog, txn: TransactionId) -> Result<Page> {
        let page_id = handle.page_id();
        let file = catalog.file_for(page_id.file_id)?;
        let before = handle.before_image();

        self.log.log_write(txn, page_id, &handle.read(), &before)?;
        self.log.force()?;
        file.write_page(page_id.page_no, &before)?;

        debug!("{} rewrote before-image of {}", txn, page_id);
        Ok(before)
    }

    /// Release every lock `txn` holds, one page at a time.
    ///
    /// A lock that vanished in the meantime is skipped.
    pub fn release_locks(&self, lock_manager: &LockManager, txn: TransactionId) -> usize {
        lock_manager
            .pages_locked_by(txn)
            .into_iter()
            .filter(|&page_id| lock_manager.release(page_id, txn))
            .count()
    }
}

impl std::fmt::Debug for RecoveryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryCoordinator").finish_non_exhaustive()
    }
}
