//! The write-ahead log contract.

use crate::common::{PageId, Result, TransactionId};
use crate::storage::page::Page;

/// Sink for page-level write records.
///
/// The commit path calls [`log_write`](Self::log_write) and then
/// [`force`](Self::force) for a page before that page's bytes reach its
/// heap file. Implementations only need to make everything logged before
/// a `force` durable by the time it returns.
pub trait WriteAheadLog: Send + Sync {
    /// Record that `txn` changed `page_id` from `before` to `after`.
    fn log_write(
        &self,
        txn: TransactionId,
        page_id: PageId,
        before: &Page,
        after: &Page,
    ) -> Result<()>;

    /// Make every record logged so far durable.
    fn force(&self) -> Result<()>;
}

/// A log that records nothing.
///
/// Commits still write pages to their heap files; there is just no
/// redo/undo trail.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl WriteAheadLog for NullLog {
    fn log_write(&self, _: TransactionId, _: PageId, _: &Page, _: &Page) -> Result<()> {
        Ok(())
    }

    fn force(&self) -> Result<()> {
        Ok(())
    }
}
