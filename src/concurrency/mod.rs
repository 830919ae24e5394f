//! Concurrency control.
//!
//! # Components
//! - [`LockManager`] - Reentrant shared/exclusive page locks
//! - [`Transaction`] - Caller-owned transaction handle and its lifecycle

mod lock_manager;
mod transaction;

pub use lock_manager::{Lock, LockGrant, LockManager, LockMode};
pub use transaction::{Transaction, TransactionState};
