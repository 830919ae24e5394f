//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use strictpool::{BufferPoolConfig, Database, WriteAheadLog};
use tempfile::TempDir;

/// Route `log` output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Small pool with short, deterministic lock waits.
pub fn test_config(capacity: usize) -> BufferPoolConfig {
    BufferPoolConfig::default()
        .with_capacity(capacity)
        .with_lock_timeout(Duration::from_millis(50))
        .with_lock_timeout_jitter(Duration::ZERO)
}

/// A database in a fresh temporary directory, logging to `wal.log`.
pub fn open_db(config: BufferPoolConfig) -> (Database, TempDir) {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path(), config).unwrap();
    (db, dir)
}

/// A database in a fresh temporary directory with a caller-supplied log.
pub fn open_db_with_log(config: BufferPoolConfig, log: Arc<dyn WriteAheadLog>) -> (Database, TempDir) {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let db = Database::with_log(dir.path(), config, log).unwrap();
    (db, dir)
}

/// A tuple of `size` bytes all equal to `byte`.
pub fn tuple(size: usize, byte: u8) -> Vec<u8> {
    vec![byte; size]
}
