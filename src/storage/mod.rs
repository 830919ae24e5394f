//! Storage layer - heap files and page formats.
//!
//! This module handles persistent storage:
//! - [`HeapFile`] - Page I/O and tuple placement for one table
//! - [`page`] - Page type and slot layout
//! - [`Tuple`] / [`RecordId`] - Stored tuples and their locations

mod heap_file;
pub mod page;
mod tuple;

pub use heap_file::{HeapFile, HeapScan};
pub use tuple::{RecordId, Tuple};
