//! Database - the context object tying tables, pool and log together.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::buffer::BufferPool;
use crate::catalog::Catalog;
use crate::common::config::BufferPoolConfig;
use crate::common::{FileId, Result, TransactionId};
use crate::concurrency::Transaction;
use crate::recovery::{LogFile, WriteAheadLog};
use crate::storage::Tuple;

/// File name of the write-ahead log inside a database directory.
pub const LOG_FILE_NAME: &str = "wal.log";

/// A directory of heap files sharing one buffer pool and one log.
///
/// There is no process-wide state; open as many as you like.
///
/// # Example
/// ```no_run
/// use strictpool::{BufferPoolConfig, Database};
///
/// let db = Database::open("/tmp/strictpool-demo", BufferPoolConfig::default())?;
/// let users = db.create_table("users", 16)?;
///
/// let record_id = db.run(|txn| db.pool().insert_tuple(txn, users, &[0u8; 16]))?;
/// println!("inserted at {}", record_id);
/// # Ok::<(), strictpool::Error>(())
/// ```
pub struct Database {
    dir: PathBuf,
    catalog: Arc<Catalog>,
    pool: Arc<BufferPool>,
    log: Arc<dyn WriteAheadLog>,
    next_txn: AtomicU64,
}

impl Database {
    /// Open (creating if needed) the database in `dir`, logging to
    /// `dir/wal.log`.
    pub fn open<P: AsRef<Path>>(dir: P, config: BufferPoolConfig) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        let log = LogFile::open(dir.as_ref().join(LOG_FILE_NAME))?;
        let db = Self::with_log(dir, config, Arc::new(log))?;
        info!(
            "opened database at {} ({} pages)",
            db.dir.display(),
            db.pool.capacity()
        );
        Ok(db)
    }

    /// Open the database in `dir` with a caller-supplied log.
    pub fn with_log<P: AsRef<Path>>(
        dir: P,
        config: BufferPoolConfig,
        log: Arc<dyn WriteAheadLog>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        let catalog = Arc::new(Catalog::new());
        let pool = Arc::new(BufferPool::new(config, Arc::clone(&catalog), Arc::clone(&log))?);

        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
            catalog,
            pool,
            log,
            next_txn: AtomicU64::new(1),
        })
    }

    /// Open or create the table `name`, stored as `dir/{name}.dat`.
    pub fn create_table(&self, name: &str, tuple_size: usize) -> Result<FileId> {
        let path = self.dir.join(format!("{name}.dat"));
        self.catalog.create_table(name, path, tuple_size)
    }

    /// Start a transaction with a fresh id.
    pub fn begin(&self) -> Transaction {
        let id = TransactionId::new(self.next_txn.fetch_add(1, Ordering::Relaxed));
        debug!("begin {}", id);
        Transaction::new(id)
    }

    pub fn commit(&self, txn: &mut Transaction) -> Result<()> {
        self.pool.transaction_complete(txn, true)
    }

    pub fn abort(&self, txn: &mut Transaction) -> Result<()> {
        self.pool.transaction_complete(txn, false)
    }

    /// Run `f` in a new transaction.
    ///
    /// Commits if `f` succeeds. If `f` fails, the transaction is aborted
    /// (rolled back and unlocked) before its error is returned, so a
    /// `LockTimeout` can simply be retried.
    pub fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(TransactionId) -> Result<T>,
    {
        let mut txn = self.begin();
        match f(txn.id()) {
            Ok(value) => {
                self.commit(&mut txn)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = self.abort(&mut txn) {
                    warn!("abort of {} failed: {}", txn.id(), abort_err);
                }
                Err(e)
            }
        }
    }

    /// Every tuple in `table`, read under Shared locks held by `txn`.
    pub fn scan(&self, txn: TransactionId, table: FileId) -> Result<Vec<Tuple>> {
        let file = self.catalog.file_for(table)?;
        file.scan(txn, &self.pool).collect()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub fn log(&self) -> &Arc<dyn WriteAheadLog> {
        &self.log
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("dir", &self.dir)
            .field("tables", &self.catalog.len())
            .finish_non_exhaustive()
    }
}
