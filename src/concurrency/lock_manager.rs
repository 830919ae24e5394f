//! Page-level lock table for strict two-phase locking.
//!
//! The [`LockManager`] grants Shared and Exclusive locks on pages to
//! transactions:
//! - Any number of transactions may share a page
//! - An Exclusive lock is always the only lock on its page
//! - Requests are reentrant, and a sole Shared holder upgrades in place
//!
//! Every decision happens under one table-wide mutex. Blocked requests
//! sleep on a condition variable that is signalled whenever a lock is
//! released, and give up at a deadline. Giving up is how deadlocks are
//! broken: the caller aborts, releasing everything it holds.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use log::{trace, warn};
use parking_lot::{Condvar, Mutex};

use crate::common::{Error, PageId, Result, TransactionId};

/// Lock strength. `Exclusive` is stronger than `Shared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Outcome of a single non-blocking lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockGrant {
    Granted,
    MustWait,
}

/// One transaction's lock on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    pub txn: TransactionId,
    pub mode: LockMode,
}

#[derive(Debug, Default)]
struct LockTable {
    /// Locks held on each page, in grant order.
    rows: HashMap<PageId, Vec<Lock>>,

    /// Pages each transaction holds a lock on.
    held: HashMap<TransactionId, HashSet<PageId>>,
}

impl LockTable {
    fn try_grant(&mut self, page_id: PageId, txn: TransactionId, mode: LockMode) -> LockGrant {
        let row = self.rows.entry(page_id).or_default();

        if row.is_empty() {
            row.push(Lock { txn, mode });
            self.held.entry(txn).or_default().insert(page_id);
            return LockGrant::Granted;
        }

        if let Some(pos) = row.iter().position(|l| l.txn == txn) {
            if row[pos].mode >= mode {
                return LockGrant::Granted;
            }
            // Shared → Exclusive, only as the sole holder
            if row.len() == 1 {
                row[pos].mode = LockMode::Exclusive;
                return LockGrant::Granted;
            }
            return LockGrant::MustWait;
        }

        if row[0].mode == LockMode::Exclusive {
            debug_assert_eq!(row.len(), 1, "exclusive lock shares {}", page_id);
            return LockGrant::MustWait;
        }

        match mode {
            LockMode::Shared => {
                row.push(Lock { txn, mode });
                self.held.entry(txn).or_default().insert(page_id);
                LockGrant::Granted
            }
            LockMode::Exclusive => LockGrant::MustWait,
        }
    }

    fn release(&mut self, page_id: PageId, txn: TransactionId) -> bool {
        let Some(row) = self.rows.get_mut(&page_id) else {
            return false;
        };
        let Some(pos) = row.iter().position(|l| l.txn == txn) else {
            return false;
        };

        row.remove(pos);
        if row.is_empty() {
            self.rows.remove(&page_id);
        }
        if let Some(pages) = self.held.get_mut(&txn) {
            pages.remove(&page_id);
            if pages.is_empty() {
                self.held.remove(&txn);
            }
        }
        true
    }
}

/// Reentrant shared/exclusive page lock table.
///
/// # Example
/// ```
/// use strictpool::concurrency::{LockGrant, LockManager, LockMode};
/// use strictpool::{FileId, PageId, TransactionId};
///
/// let lm = LockManager::new();
/// let page = PageId::new(FileId(0), 0);
/// let (a, b) = (TransactionId::new(1), TransactionId::new(2));
///
/// assert_eq!(lm.acquire(page, a, LockMode::Shared), LockGrant::Granted);
/// assert_eq!(lm.acquire(page, b, LockMode::Shared), LockGrant::Granted);
/// // a cannot upgrade while b shares the page
/// assert_eq!(lm.acquire(page, a, LockMode::Exclusive), LockGrant::MustWait);
/// ```
#[derive(Debug, Default)]
pub struct LockManager {
    table: Mutex<LockTable>,
    released: Condvar,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try once to lock `page_id` for `txn` in `mode`.
    pub fn acquire(&self, page_id: PageId, txn: TransactionId, mode: LockMode) -> LockGrant {
        self.table.lock().try_grant(page_id, txn, mode)
    }

    /// Lock `page_id` for `txn`, waiting at most `timeout`.
    ///
    /// # Errors
    /// `Error::LockTimeout` if the lock is still unavailable at the
    /// deadline. The lock table is left as if the request was never made.
    pub fn acquire_timeout(
        &self,
        page_id: PageId,
        txn: TransactionId,
        mode: LockMode,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut table = self.table.lock();

        loop {
            if table.try_grant(page_id, txn, mode) == LockGrant::Granted {
                return Ok(());
            }
            trace!("{} waits for {:?} on {}", txn, mode, page_id);

            if self.released.wait_until(&mut table, deadline).timed_out() {
                // One last look: a release may have raced the timeout
                if table.try_grant(page_id, txn, mode) == LockGrant::Granted {
                    return Ok(());
                }
                warn!("{} timed out waiting for {:?} on {}", txn, mode, page_id);
                return Err(Error::LockTimeout { txn, page_id });
            }
        }
    }

    /// Drop `txn`'s lock on `page_id`.
    ///
    /// Returns false, changing nothing, if `txn` held no lock there.
    pub fn release(&self, page_id: PageId, txn: TransactionId) -> bool {
        let released = self.table.lock().release(page_id, txn);
        if released {
            self.released.notify_all();
        }
        released
    }

    /// Drop every lock `txn` holds. Returns how many were released.
    pub fn release_all(&self, txn: TransactionId) -> usize {
        let count = {
            let mut table = self.table.lock();
            let pages: Vec<PageId> = table
                .held
                .get(&txn)
                .map(|pages| pages.iter().copied().collect())
                .unwrap_or_default();
            pages
                .into_iter()
                .filter(|&page_id| table.release(page_id, txn))
                .count()
        };
        if count > 0 {
            self.released.notify_all();
        }
        count
    }

    /// Whether `txn` holds any lock on `page_id`.
    pub fn holds(&self, page_id: PageId, txn: TransactionId) -> bool {
        self.lock_mode(page_id, txn).is_some()
    }

    /// The mode `txn` holds `page_id` in, if any.
    pub fn lock_mode(&self, page_id: PageId, txn: TransactionId) -> Option<LockMode> {
        let table = self.table.lock();
        table
            .rows
            .get(&page_id)?
            .iter()
            .find(|l| l.txn == txn)
            .map(|l| l.mode)
    }

    /// Snapshot of the locks on `page_id`, in grant order.
    pub fn locks_on(&self, page_id: PageId) -> Vec<Lock> {
        let table = self.table.lock();
        table.rows.get(&page_id).cloned().unwrap_or_default()
    }

    /// Pages `txn` currently holds locks on, in page id order.
    pub fn pages_locked_by(&self, txn: TransactionId) -> Vec<PageId> {
        let table = self.table.lock();
        let mut pages: Vec<PageId> = table
            .held
            .get(&txn)
            .map(|pages| pages.iter().copied().collect())
            .unwrap_or_default();
        pages.sort();
        pages
    }

    /// Number of pages with at least one lock.
    pub fn locked_page_count(&self) -> usize {
        self.table.lock().rows.len()
    }
}
