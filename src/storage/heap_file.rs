//! Heap File - page I/O and tuple placement for one table.
//!
//! The [`HeapFile`] handles all direct file operations for a table:
//! - Reading and writing whole pages
//! - Growing the file by one empty page
//! - Placing and removing fixed-width tuples (through the buffer pool)

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;

use crate::buffer::{BufferPool, PageHandle};
use crate::common::config::PAGE_SIZE;
use crate::common::{Error, FileId, PageId, Result, TransactionId};
use crate::concurrency::LockMode;
use crate::storage::page::{Page, SlotLayout};
use crate::storage::{RecordId, Tuple};

/// Stores one table as a flat sequence of pages.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// There is no header page; the page count is the file length divided by
/// `PAGE_SIZE`, and a length that is not a whole number of pages is
/// treated as corruption.
///
/// # Thread Safety
/// The file handle sits behind a `Mutex`, so page reads, page writes and
/// appends are each atomic. Appends compute the new page number and extend
/// the file inside one critical section; two transactions growing the
/// file at once get distinct pages.
///
/// # Durability
/// Every page write and every append is followed by `sync_data()`.
pub struct HeapFile {
    id: FileId,
    path: PathBuf,
    file: Mutex<File>,
    layout: SlotLayout,
}

impl HeapFile {
    /// Create a new, empty heap file.
    ///
    /// # Errors
    /// Fails if the file already exists, or `tuple_size` does not fit a page.
    pub fn create<P: AsRef<Path>>(path: P, id: FileId, tuple_size: usize) -> Result<Self> {
        let layout = SlotLayout::new(tuple_size)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Ok(Self {
            id,
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(file),
            layout,
        })
    }

    /// Open an existing heap file.
    ///
    /// # Errors
    /// Fails if the file is missing or its length is not a multiple of
    /// `PAGE_SIZE`.
    pub fn open<P: AsRef<Path>>(path: P, id: FileId, tuple_size: usize) -> Result<Self> {
        let layout = SlotLayout::new(tuple_size)?;
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let heap_file = Self {
            id,
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(file),
            layout,
        };
        heap_file.num_pages()?;
        Ok(heap_file)
    }

    /// Open an existing heap file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P, id: FileId, tuple_size: usize) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path, id, tuple_size)
        } else {
            Self::create(path, id, tuple_size)
        }
    }

    #[inline]
    pub fn id(&self) -> FileId {
        self.id
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    #[inline]
    pub fn tuple_size(&self) -> usize {
        self.layout.tuple_size()
    }

    // ========================================================================
    // Page I/O
    // ========================================================================

    /// Number of pages, derived from the file length.
    ///
    /// # Errors
    /// `Error::CorruptFileLength` if the length is not a whole number of pages.
    pub fn num_pages(&self) -> Result<u32> {
        let file = self.file.lock();
        Self::page_count(&file)
    }

    fn page_count(file: &File) -> Result<u32> {
        let len = file.metadata()?.len();
        if len % PAGE_SIZE as u64 != 0 {
            return Err(Error::CorruptFileLength { len });
        }
        Ok((len / PAGE_SIZE as u64) as u32)
    }

    /// Read page `page_no` from disk.
    ///
    /// # Errors
    /// `Error::PageOutOfRange` if the page does not exist. A short read
    /// surfaces as `Error::Io`.
    pub fn read_page(&self, page_no: u32) -> Result<Page> {
        let page_id = PageId::new(self.id, page_no);
        let mut file = self.file.lock();

        let num_pages = Self::page_count(&file)?;
        if page_no >= num_pages {
            return Err(Error::PageOutOfRange { page_id, num_pages });
        }

        file.seek(SeekFrom::Start(page_id.offset()))?;
        let mut page = Page::new();
        file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    /// Write `page` over page `page_no` on disk.
    ///
    /// The page must already exist; growth only happens through
    /// [`append_empty_page`](Self::append_empty_page).
    ///
    /// # Errors
    /// `Error::PageOutOfRange` if the page does not exist. A short write
    /// surfaces as `Error::Io`.
    pub fn write_page(&self, page_no: u32, page: &Page) -> Result<()> {
        let page_id = PageId::new(self.id, page_no);
        let mut file = self.file.lock();

        let num_pages = Self::page_count(&file)?;
        if page_no >= num_pages {
            return Err(Error::PageOutOfRange { page_id, num_pages });
        }

        file.seek(SeekFrom::Start(page_id.offset()))?;
        file.write_all(page.as_slice())?;
        file.sync_data()?;

        Ok(())
    }

    /// Extend the file by exactly one zeroed page and return its number.
    pub fn append_empty_page(&self) -> Result<u32> {
        let mut file = self.file.lock();

        let page_no = Self::page_count(&file)?;
        let offset = PageId::new(self.id, page_no).offset();

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(Page::new().as_slice())?;
        file.sync_data()?;

        debug!("{} grew to {} pages", self.id, page_no + 1);
        Ok(page_no)
    }

    // ========================================================================
    // Tuple placement (through the buffer pool)
    // ========================================================================

    fn check_width(&self, data: &[u8]) -> Result<()> {
        if data.len() != self.tuple_size() {
            return Err(Error::TupleSizeMismatch {
                expected: self.tuple_size(),
                actual: data.len(),
            });
        }
        Ok(())
    }

    /// Insert `data` as a new tuple on behalf of `txn`.
    ///
    /// Visits pages in page-number order under Shared locks and upgrades the
    /// first page with a free slot to Exclusive. Full pages the transaction
    /// had not locked before the check are unlocked again right away. If
    /// every page is full, one empty page is appended and used.
    ///
    /// An appended page is visible to other transactions before this one
    /// locks it. If another transaction fills it first, the search starts
    /// over.
    ///
    /// Returns the new tuple's location and the pages that were modified
    /// (always exactly one). The caller must hand those pages to
    /// [`BufferPool::mark_dirty`].
    pub fn insert_tuple(
        &self,
        txn: TransactionId,
        data: &[u8],
        pool: &BufferPool,
    ) -> Result<(RecordId, Vec<PageHandle>)> {
        self.check_width(data)?;

        loop {
            if let Some(placed) = self.insert_into_existing(txn, data, pool)? {
                return Ok(placed);
            }

            let page_no = self.append_empty_page()?;
            let page_id = PageId::new(self.id, page_no);
            let handle = pool.get_page(txn, page_id, LockMode::Exclusive)?;
            if let Some(record_id) = self.place(txn, &handle, data) {
                return Ok((record_id, vec![handle]));
            }
            debug!("{} filled by another transaction before {} claimed it", page_id, txn);
        }
    }

    fn insert_into_existing(
        &self,
        txn: TransactionId,
        data: &[u8],
        pool: &BufferPool,
    ) -> Result<Option<(RecordId, Vec<PageHandle>)>> {
        let num_pages = self.num_pages()?;
        for page_no in 0..num_pages {
            let page_id = PageId::new(self.id, page_no);
            let held_before = pool.holds_lock(txn, page_id);

            let handle = pool.get_page(txn, page_id, LockMode::Shared)?;
            let has_room = self.layout.free_slot(handle.read().as_slice()).is_some();
            if !has_room {
                if !held_before {
                    pool.unsafe_release_page(txn, page_id);
                }
                continue;
            }

            let handle = pool.get_page(txn, page_id, LockMode::Exclusive)?;
            if let Some(record_id) = self.place(txn, &handle, data) {
                return Ok(Some((record_id, vec![handle])));
            }
        }
        Ok(None)
    }

    fn place(&self, txn: TransactionId, handle: &PageHandle, data: &[u8]) -> Option<RecordId> {
        let mut page = handle.write_as(txn);
        let slot = self.layout.insert(page.as_mut_slice(), data)?;
        Some(RecordId::new(handle.page_id(), slot as u16))
    }

    /// Delete the tuple at `record_id` on behalf of `txn`.
    ///
    /// Returns the modified pages (always exactly one).
    ///
    /// # Errors
    /// `Error::TupleNotFound` if the slot is empty or belongs to another file.
    pub fn delete_tuple(
        &self,
        txn: TransactionId,
        record_id: RecordId,
        pool: &BufferPool,
    ) -> Result<Vec<PageHandle>> {
        let RecordId { page_id, slot } = record_id;
        let not_found = Error::TupleNotFound { page_id, slot };

        if page_id.file_id != self.id || slot as usize >= self.layout.slot_count() {
            return Err(not_found);
        }

        let handle = pool.get_page(txn, page_id, LockMode::Exclusive)?;
        if !self.layout.is_used(handle.read().as_slice(), slot as usize) {
            return Err(not_found);
        }

        let mut page = handle.write_as(txn);
        self.layout.delete(page.as_mut_slice(), slot as usize);
        drop(page);

        Ok(vec![handle])
    }

    /// Iterate every tuple in the file on behalf of `txn`.
    ///
    /// Pages are locked Shared one at a time as the scan reaches them, and
    /// stay locked until `txn` completes.
    pub fn scan<'a>(&'a self, txn: TransactionId, pool: &'a BufferPool) -> HeapScan<'a> {
        HeapScan {
            file: self,
            pool,
            txn,
            next_page: 0,
            num_pages: None,
            buffered: VecDeque::new(),
            done: false,
        }
    }
}

impl std::fmt::Debug for HeapFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapFile")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("tuple_size", &self.tuple_size())
            .finish()
    }
}

/// Page-at-a-time iterator over a heap file's tuples.
pub struct HeapScan<'a> {
    file: &'a HeapFile,
    pool: &'a BufferPool,
    txn: TransactionId,
    next_page: u32,
    num_pages: Option<u32>,
    buffered: VecDeque<Tuple>,
    done: bool,
}

impl HeapScan<'_> {
    fn load_next_page(&mut self) -> Result<bool> {
        let num_pages = match self.num_pages {
            Some(n) => n,
            None => {
                let n = self.file.num_pages()?;
                self.num_pages = Some(n);
                n
            }
        };
        if self.next_page >= num_pages {
            return Ok(false);
        }

        let page_id = PageId::new(self.file.id(), self.next_page);
        self.next_page += 1;

        let handle = self.pool.get_page(self.txn, page_id, LockMode::Shared)?;
        let page = handle.read();
        let layout = self.file.layout();
        for slot in layout.used_slots(page.as_slice()) {
            if let Some(bytes) = layout.tuple(page.as_slice(), slot) {
                self.buffered.push_back(Tuple {
                    record_id: RecordId::new(page_id, slot as u16),
                    data: bytes.to_vec(),
                });
            }
        }
        Ok(true)
    }
}

impl Iterator for HeapScan<'_> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Result<Tuple>> {
        loop {
            if let Some(tuple) = self.buffered.pop_front() {
                return Some(Ok(tuple));
            }
            if self.done {
                return None;
            }
            match self.load_next_page() {
                Ok(true) => continue,
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.dat");

        let hf = HeapFile::create(&path, FileId(1), 8).unwrap();
        assert_eq!(hf.num_pages().unwrap(), 0);
        assert_eq!(hf.id(), FileId(1));
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.dat");

        HeapFile::create(&path, FileId(1), 8).unwrap();
        assert!(HeapFile::create(&path, FileId(1), 8).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        assert!(HeapFile::open(dir.path().join("missing.dat"), FileId(1), 8).is_err());
    }

    #[test]
    fn test_append_and_read_page() {
        let dir = tempdir().unwrap();
        let hf = HeapFile::create(dir.path().join("t.dat"), FileId(1), 8).unwrap();

        assert_eq!(hf.append_empty_page().unwrap(), 0);
        assert_eq!(hf.append_empty_page().unwrap(), 1);
        assert_eq!(hf.num_pages().unwrap(), 2);

        let page = hf.read_page(1).unwrap();
        assert_eq!(page, Page::new());
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let hf = HeapFile::create(dir.path().join("t.dat"), FileId(1), 8).unwrap();
        hf.append_empty_page().unwrap();

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[4095] = 0xEF;
        hf.write_page(0, &page).unwrap();

        assert_eq!(hf.read_page(0).unwrap(), page);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.dat");

        {
            let hf = HeapFile::create(&path, FileId(1), 8).unwrap();
            hf.append_empty_page().unwrap();
            let mut page = Page::new();
            page.as_mut_slice()[0] = 0x42;
            hf.write_page(0, &page).unwrap();
        }

        {
            let hf = HeapFile::open(&path, FileId(1), 8).unwrap();
            assert_eq!(hf.num_pages().unwrap(), 1);
            assert_eq!(hf.read_page(0).unwrap().as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_read_out_of_range() {
        let dir = tempdir().unwrap();
        let hf = HeapFile::create(dir.path().join("t.dat"), FileId(1), 8).unwrap();
        hf.append_empty_page().unwrap();

        let err = hf.read_page(1).unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { num_pages: 1, .. }));
    }

    #[test]
    fn test_write_out_of_range() {
        let dir = tempdir().unwrap();
        let hf = HeapFile::create(dir.path().join("t.dat"), FileId(1), 8).unwrap();

        let err = hf.write_page(0, &Page::new()).unwrap_err();
        assert!(matches!(err, Error::PageOutOfRange { num_pages: 0, .. }));
    }

    #[test]
    fn test_partial_page_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.dat");
        std::fs::write(&path, vec![0u8; PAGE_SIZE + 10]).unwrap();

        let err = HeapFile::open(&path, FileId(1), 8).unwrap_err();
        assert!(matches!(err, Error::CorruptFileLength { len } if len == PAGE_SIZE as u64 + 10));
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.dat");

        {
            let hf = HeapFile::open_or_create(&path, FileId(1), 8).unwrap();
            hf.append_empty_page().unwrap();
        }
        {
            let hf = HeapFile::open_or_create(&path, FileId(1), 8).unwrap();
            assert_eq!(hf.num_pages().unwrap(), 1);
        }
    }

    #[test]
    fn test_concurrent_appends_get_distinct_pages() {
        use std::sync::Arc;
        use std::thread;

        let dir = tempdir().unwrap();
        let hf = Arc::new(HeapFile::create(dir.path().join("t.dat"), FileId(1), 8).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let hf = Arc::clone(&hf);
                thread::spawn(move || hf.append_empty_page().unwrap())
            })
            .collect();

        let mut pages: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        pages.sort();
        assert_eq!(pages, (0..8).collect::<Vec<u32>>());
        assert_eq!(hf.num_pages().unwrap(), 8);
    }
}
