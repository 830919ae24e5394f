//! strictpool - a page buffer pool with strict two-phase locking.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Database (database.rs)                      │
//! │           begin / commit / abort / run, table registry          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Buffer Pool (buffer/)                     │   │
//! │  │  get_page → LockManager → PageCache → HeapFile on miss   │   │
//! │  │  no-steal LRU eviction, BufferPoolStats                  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │         ↓                    ↓                     ↓            │
//! │  ┌──────────────┐  ┌─────────────────────┐  ┌──────────────┐   │
//! │  │ concurrency/ │  │      recovery/      │  │  catalog.rs  │   │
//! │  │ LockManager  │  │ RecoveryCoordinator │  │ FileId→Heap  │   │
//! │  │ Transaction  │  │ WriteAheadLog       │  └──────────────┘   │
//! │  └──────────────┘  └─────────────────────┘                     │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │        HeapFile + Page + SlotLayout + Tuple              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, TransactionId, Error, config)
//! - [`storage`] - Heap files and page formats
//! - [`concurrency`] - Page locks and transaction lifecycle
//! - [`buffer`] - The buffer pool and its page cache
//! - [`recovery`] - Write-ahead logging and commit/abort passes
//! - [`catalog`] - Table registry
//! - [`database`] - The context object tying it all together
//!
//! # Quick Start
//! ```no_run
//! use strictpool::{BufferPoolConfig, Database};
//!
//! let db = Database::open("my_database", BufferPoolConfig::default())?;
//! let table = db.create_table("points", 8)?;
//!
//! let mut txn = db.begin();
//! db.pool().insert_tuple(txn.id(), table, &42u64.to_le_bytes())?;
//! db.commit(&mut txn)?;
//!
//! let rows = db.run(|txn| db.scan(txn, table))?;
//! assert_eq!(rows.len(), 1);
//! # Ok::<(), strictpool::Error>(())
//! ```

pub mod buffer;
pub mod catalog;
pub mod common;
pub mod concurrency;
pub mod database;
pub mod recovery;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{BufferPoolConfig, PAGE_SIZE};
pub use common::{Error, ErrorKind, FileId, PageId, Result, TransactionId};

pub use buffer::{BufferPool, BufferPoolStats, PageHandle, StatsSnapshot};
pub use catalog::Catalog;
pub use concurrency::{LockMode, Transaction, TransactionState};
pub use database::Database;
pub use recovery::{LogFile, NullLog, WriteAheadLog};
pub use storage::page::Page;
pub use storage::{HeapFile, RecordId, Tuple};
