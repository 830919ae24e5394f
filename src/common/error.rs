//! Error types for strictpool.

use thiserror::Error;

use crate::common::{PageId, TransactionId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
///
/// Callers branch on this rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transaction must abort; retrying it from scratch may succeed.
    Abort,
    /// The buffer pool has no clean page to give up.
    Capacity,
    /// Corruption or I/O failure. Not retried.
    Fatal,
    /// The caller asked for something that does not exist or is malformed.
    Usage,
}

/// All possible errors in strictpool.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a heap file or the log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock could not be acquired before the wait bound expired.
    #[error("{txn} timed out waiting for a lock on {page_id}")]
    LockTimeout {
        txn: TransactionId,
        page_id: PageId,
    },

    /// Every resident page is dirty; nothing can be evicted.
    #[error("cannot evict: all {capacity} resident pages are dirty")]
    EvictionExhausted { capacity: usize },

    /// Requested page lies beyond the end of its file.
    #[error("{page_id} is out of range (file has {num_pages} pages)")]
    PageOutOfRange { page_id: PageId, num_pages: u32 },

    /// File length is not a whole number of pages.
    #[error("file length {len} is not a multiple of the page size")]
    CorruptFileLength { len: u64 },

    /// A log record failed its checksum or is truncated.
    #[error("corrupt log record at offset {offset}")]
    CorruptLogRecord { offset: u64 },

    /// No table is registered under this id.
    #[error("no table with id {0}")]
    NoSuchTable(u32),

    /// No table is registered under this name.
    #[error("no table named {0:?}")]
    NoSuchTableName(String),

    /// A table with this name is already registered.
    #[error("table {0:?} already exists")]
    DuplicateTable(String),

    /// Tuple bytes do not match the file's fixed tuple width.
    #[error("tuple is {actual} bytes, table expects {expected}")]
    TupleSizeMismatch { expected: usize, actual: usize },

    /// Tuple width cannot fit even one slot on a page.
    #[error("tuple size {0} does not fit on a page")]
    InvalidTupleSize(usize),

    /// The addressed slot is empty.
    #[error("no tuple in slot {slot} of {page_id}")]
    TupleNotFound { page_id: PageId, slot: u16 },

    /// `transaction_complete` called on a transaction that already finished.
    #[error("{0} has already completed")]
    TransactionCompleted(TransactionId),

    /// Rejected configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::LockTimeout { .. } => ErrorKind::Abort,
            Error::EvictionExhausted { .. } => ErrorKind::Capacity,
            Error::Io(_)
            | Error::PageOutOfRange { .. }
            | Error::CorruptFileLength { .. }
            | Error::CorruptLogRecord { .. } => ErrorKind::Fatal,
            Error::NoSuchTable(_)
            | Error::NoSuchTableName(_)
            | Error::DuplicateTable(_)
            | Error::TupleSizeMismatch { .. }
            | Error::InvalidTupleSize(_)
            | Error::TupleNotFound { .. }
            | Error::TransactionCompleted(_)
            | Error::InvalidConfig(_) => ErrorKind::Usage,
        }
    }

    /// True if the caller must abort the transaction.
    pub fn is_abort(&self) -> bool {
        self.kind() == ErrorKind::Abort
    }
}
