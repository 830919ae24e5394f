//! Write-ahead logging and transaction completion.
//!
//! # Components
//! - [`WriteAheadLog`] - The log contract the commit path depends on
//! - [`LogFile`] - Checksummed, file-backed log
//! - [`NullLog`] - A log that records nothing
//! - [`RecoveryCoordinator`] - Commit flush and abort restore passes

mod coordinator;
mod log_file;
mod wal;

pub use coordinator::RecoveryCoordinator;
pub use log_file::{LogFile, LogRecord};
pub use wal::{NullLog, WriteAheadLog};
