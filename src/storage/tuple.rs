//! Tuples and record identifiers.

use std::fmt;

use crate::common::PageId;

/// Location of a tuple: page plus slot number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    #[inline]
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page_id, self.slot)
    }
}

/// A stored tuple: its location and its fixed-width bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub record_id: RecordId,
    pub data: Vec<u8>,
}
