//! Common types and utilities shared across strictpool.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`config::BufferPoolConfig`]
//! - Error types
//! - Identifiers (PageId, FileId, TransactionId)

pub mod config;
pub mod error;
mod page_id;
mod transaction_id;

pub use error::{Error, ErrorKind, Result};
pub use page_id::{FileId, PageId};
pub use transaction_id::TransactionId;
