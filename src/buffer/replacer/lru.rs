//! LRU (Least Recently Used) recency tracking.
//!
//! Resident pages are kept on an intrusive doubly linked list threaded
//! through a slab of nodes, with a `HashMap` index for O(1) lookup:
//!
//! ```text
//!  index: PageId → slot
//!
//!  head (LRU)                                   tail (MRU)
//!   ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
//!   │ P3   │ ⇄  │ P0   │ ⇄  │ P7   │ ⇄  │ P1   │
//!   └──────┘    └──────┘    └──────┘    └──────┘
//! ```
//!
//! Touching a page unlinks it and relinks it at the tail. Eviction walks
//! from the head and takes the first page the caller says is evictable,
//! so a dirty page near the head is skipped rather than dropped.

use std::collections::HashMap;

use crate::common::PageId;

#[derive(Debug, Clone, Copy)]
struct Node {
    page_id: PageId,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Least-recently-used ordering over resident pages.
#[derive(Debug, Default)]
pub struct LruReplacer {
    /// Node storage; `None` entries are on the free list.
    nodes: Vec<Option<Node>>,

    /// Reusable slab slots.
    free: Vec<usize>,

    /// PageId → slab slot.
    index: HashMap<PageId, usize>,

    /// Least recently used.
    head: Option<usize>,

    /// Most recently used.
    tail: Option<usize>,
}

impl LruReplacer {
    /// Create an empty replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty replacer with room for `capacity` pages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Record that a page was accessed, making it the most recently used.
    ///
    /// Unknown pages are added at the MRU end.
    pub fn record_access(&mut self, page_id: PageId) {
        let slot = match self.index.get(&page_id) {
            Some(&slot) => {
                self.unlink(slot);
                slot
            }
            None => {
                let node = Node {
                    page_id,
                    prev: None,
                    next: None,
                };
                let slot = match self.free.pop() {
                    Some(slot) => {
                        self.nodes[slot] = Some(node);
                        slot
                    }
                    None => {
                        self.nodes.push(Some(node));
                        self.nodes.len() - 1
                    }
                };
                self.index.insert(page_id, slot);
                slot
            }
        };
        self.push_back(slot);
    }

    /// Stop tracking a page. Returns false if it was not tracked.
    pub fn remove(&mut self, page_id: PageId) -> bool {
        let Some(slot) = self.index.remove(&page_id) else {
            return false;
        };
        self.unlink(slot);
        self.nodes[slot] = None;
        self.free.push(slot);
        true
    }

    /// Find the least recently used page accepted by `evictable`.
    ///
    /// The page stays tracked; the caller removes it once it has really
    /// been dropped.
    pub fn victim<F>(&self, mut evictable: F) -> Option<PageId>
    where
        F: FnMut(PageId) -> bool,
    {
        self.iter().find(|&page_id| evictable(page_id))
    }

    /// Iterate tracked pages from least to most recently used.
    pub fn iter(&self) -> LruIter<'_> {
        LruIter {
            replacer: self,
            cursor: self.head,
        }
    }

    /// Whether `page_id` is tracked.
    pub fn contains(&self, page_id: PageId) -> bool {
        self.index.contains_key(&page_id)
    }

    /// Number of tracked pages.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn node(&self, slot: usize) -> &Node {
        self.nodes[slot].as_ref().expect("linked slot must be occupied")
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node {
        self.nodes[slot].as_mut().expect("linked slot must be occupied")
    }

    fn unlink(&mut self, slot: usize) {
        let Node { prev, next, .. } = *self.node(slot);

        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }

        let node = self.node_mut(slot);
        node.prev = None;
        node.next = None;
    }

    fn push_back(&mut self, slot: usize) {
        let old_tail = self.tail;
        {
            let node = self.node_mut(slot);
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => self.node_mut(t).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }
}

/// Iterator over pages in LRU → MRU order.
pub struct LruIter<'a> {
    replacer: &'a LruReplacer,
    cursor: Option<usize>,
}

impl Iterator for LruIter<'_> {
    type Item = PageId;

    fn next(&mut self) -> Option<PageId> {
        let slot = self.cursor?;
        let node = self.replacer.node(slot);
        self.cursor = node.next;
        Some(node.page_id)
    }
}
