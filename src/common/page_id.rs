//! Page and file identifier types.

use std::fmt;

/// Identifies a heap file (one table) within a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File({})", self.0)
    }
}

/// Identifies a page on disk: which file, and which page within it.
///
/// This is the key of both the page cache and the lock table.
/// Equality and hashing are by value.
///
/// # Example
/// ```
/// use strictpool::{FileId, PageId};
///
/// let page_id = PageId::new(FileId(1), 42);
/// assert_eq!(page_id.page_no, 42);
/// assert_eq!(page_id.offset(), 42 * 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    pub file_id: FileId,
    pub page_no: u32,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(file_id: FileId, page_no: u32) -> Self {
        PageId { file_id, page_no }
    }

    /// Byte offset of this page within its file.
    #[inline]
    pub fn offset(&self) -> u64 {
        (self.page_no as u64) * (crate::common::config::PAGE_SIZE as u64)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}:{})", self.file_id.0, self.page_no)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(FileId(3), 42);
        assert_eq!(pid.file_id, FileId(3));
        assert_eq!(pid.page_no, 42);
    }

    #[test]
    fn test_page_id_hash_by_value() {
        let mut set = HashSet::new();
        set.insert(PageId::new(FileId(1), 2));
        assert!(set.contains(&PageId::new(FileId(1), 2)));
        assert!(!set.contains(&PageId::new(FileId(2), 1)));
    }

    #[test]
    fn test_page_id_ordering() {
        assert!(PageId::new(FileId(0), 1) < PageId::new(FileId(0), 2));
        assert!(PageId::new(FileId(1), 0) > PageId::new(FileId(0), 9));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(FileId(2), 42)), "Page(2:42)");
    }
}
