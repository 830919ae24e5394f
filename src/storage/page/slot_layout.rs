//! Fixed-width slotted layout for heap pages.
//!
//! Every tuple in a heap file has the same width, so a page is simply a
//! used-slot bitmap followed by an array of equally sized slots:
//!
//! ```text
//! ┌──────────────────────┬────────┬────────┬─────┬────────┬─────────┐
//! │ header bitmap        │ slot 0 │ slot 1 │ ... │ slot N │ padding │
//! │ ceil(N / 8) bytes    │        │        │     │        │         │
//! └──────────────────────┴────────┴────────┴─────┴────────┴─────────┘
//! ```
//!
//! Each slot costs `tuple_size * 8 + 1` bits (data plus its header bit),
//! so `N = floor(PAGE_SIZE * 8 / (tuple_size * 8 + 1))`. Slot `i` is used
//! when bit `i % 8` (LSB first) of header byte `i / 8` is set.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result};

/// Geometry of a heap page for one tuple width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    tuple_size: usize,
    slot_count: usize,
    header_len: usize,
}

impl SlotLayout {
    /// Compute the layout for tuples of `tuple_size` bytes.
    ///
    /// # Errors
    /// `Error::InvalidTupleSize` if not even one tuple fits on a page.
    pub fn new(tuple_size: usize) -> Result<Self> {
        if tuple_size == 0 {
            return Err(Error::InvalidTupleSize(tuple_size));
        }
        let slot_count = (PAGE_SIZE * 8) / (tuple_size * 8 + 1);
        if slot_count == 0 {
            return Err(Error::InvalidTupleSize(tuple_size));
        }
        Ok(Self {
            tuple_size,
            slot_count,
            header_len: slot_count.div_ceil(8),
        })
    }

    #[inline]
    pub fn tuple_size(&self) -> usize {
        self.tuple_size
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    #[inline]
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Whether slot `slot` holds a tuple.
    #[inline]
    pub fn is_used(&self, data: &[u8], slot: usize) -> bool {
        debug_assert!(slot < self.slot_count);
        data[slot / 8] & (1 << (slot % 8)) != 0
    }

    fn set_used(&self, data: &mut [u8], slot: usize, used: bool) {
        let mask = 1u8 << (slot % 8);
        if used {
            data[slot / 8] |= mask;
        } else {
            data[slot / 8] &= !mask;
        }
    }

    fn slot_range(&self, slot: usize) -> std::ops::Range<usize> {
        let start = self.header_len + slot * self.tuple_size;
        start..start + self.tuple_size
    }

    /// Lowest-numbered empty slot, if any.
    pub fn free_slot(&self, data: &[u8]) -> Option<usize> {
        (0..self.slot_count).find(|&slot| !self.is_used(data, slot))
    }

    /// Number of empty slots on the page.
    pub fn free_slot_count(&self, data: &[u8]) -> usize {
        (0..self.slot_count)
            .filter(|&slot| !self.is_used(data, slot))
            .count()
    }

    /// Iterate the numbers of used slots in ascending order.
    pub fn used_slots<'a>(&'a self, data: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
        (0..self.slot_count).filter(move |&slot| self.is_used(data, slot))
    }

    /// Bytes of the tuple in `slot`, or `None` if the slot is empty.
    pub fn tuple<'a>(&self, data: &'a [u8], slot: usize) -> Option<&'a [u8]> {
        if slot >= self.slot_count || !self.is_used(data, slot) {
            return None;
        }
        Some(&data[self.slot_range(slot)])
    }

    /// Place `tuple` into the first free slot and return its number.
    ///
    /// Returns `None` if the page is full. The caller has checked the
    /// tuple width.
    pub fn insert(&self, data: &mut [u8], tuple: &[u8]) -> Option<usize> {
        debug_assert_eq!(tuple.len(), self.tuple_size);
        let slot = self.free_slot(data)?;
        data[self.slot_range(slot)].copy_from_slice(tuple);
        self.set_used(data, slot, true);
        Some(slot)
    }

    /// Clear `slot`. Returns false if it was already empty.
    pub fn delete(&self, data: &mut [u8], slot: usize) -> bool {
        if slot >= self.slot_count || !self.is_used(data, slot) {
            return false;
        }
        self.set_used(data, slot, false);
        data[self.slot_range(slot)].fill(0);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::Page;

    #[test]
    fn test_layout_geometry() {
        // 8-byte tuples: 32768 / 65 = 504 slots, 63 header bytes.
        let layout = SlotLayout::new(8).unwrap();
        assert_eq!(layout.slot_count(), 504);
        assert_eq!(layout.header_len(), 63);
        assert!(layout.header_len() + layout.slot_count() * 8 <= PAGE_SIZE);
    }

    #[test]
    fn test_invalid_tuple_sizes() {
        assert!(SlotLayout::new(0).is_err());
        assert!(SlotLayout::new(PAGE_SIZE).is_err());
        assert!(SlotLayout::new(PAGE_SIZE - 1).is_ok());
    }

    #[test]
    fn test_insert_fills_lowest_slot_first() {
        let layout = SlotLayout::new(16).unwrap();
        let mut page = Page::new();

        assert_eq!(layout.insert(page.as_mut_slice(), &[1u8; 16]), Some(0));
        assert_eq!(layout.insert(page.as_mut_slice(), &[2u8; 16]), Some(1));
        assert!(layout.delete(page.as_mut_slice(), 0));
        assert_eq!(layout.insert(page.as_mut_slice(), &[3u8; 16]), Some(0));

        assert_eq!(layout.tuple(page.as_slice(), 0), Some(&[3u8; 16][..]));
        assert_eq!(layout.tuple(page.as_slice(), 1), Some(&[2u8; 16][..]));
        assert_eq!(layout.tuple(page.as_slice(), 2), None);
    }

    #[test]
    fn test_full_page_rejects_insert() {
        let layout = SlotLayout::new(1000).unwrap();
        let mut page = Page::new();

        for _ in 0..layout.slot_count() {
            assert!(layout.insert(page.as_mut_slice(), &[9u8; 1000]).is_some());
        }
        assert_eq!(layout.free_slot_count(page.as_slice()), 0);
        assert_eq!(layout.insert(page.as_mut_slice(), &[9u8; 1000]), None);
    }

    #[test]
    fn test_delete_empty_slot() {
        let layout = SlotLayout::new(4).unwrap();
        let mut page = Page::new();
        assert!(!layout.delete(page.as_mut_slice(), 3));
        assert!(!layout.delete(page.as_mut_slice(), layout.slot_count()));
    }

    #[test]
    fn test_used_slots() {
        let layout = SlotLayout::new(4).unwrap();
        let mut page = Page::new();
        for _ in 0..5 {
            layout.insert(page.as_mut_slice(), &[1, 2, 3, 4]);
        }
        layout.delete(page.as_mut_slice(), 2);
        let used: Vec<usize> = layout.used_slots(page.as_slice()).collect();
        assert_eq!(used, vec![0, 1, 3, 4]);
    }
}
