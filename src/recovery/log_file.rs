//! LogFile - an append-only, checksummed file of page write records.
//!
//! # Record Format
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬──────────┬───────────┬───────────┐
//! │ len (4B) │ crc (4B) │ txn (8B) │ file(4B) │ page(4B) │ before    │ after     │
//! │          │          │          │          │          │ (4096B)   │ (4096B)   │
//! └──────────┴──────────┴──────────┴──────────┴──────────┴───────────┴───────────┘
//! ```
//! `len` counts the bytes after the `crc` field; `crc` is the CRC-32 of
//! those same bytes. All integers are little-endian.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use log::trace;
use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, FileId, PageId, Result, TransactionId};
use crate::recovery::WriteAheadLog;
use crate::storage::page::Page;

const PREFIX_LEN: usize = 8;
const BODY_LEN: usize = 8 + 4 + 4 + 2 * PAGE_SIZE;

/// One logged page write, as read back from a [`LogFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub txn: TransactionId,
    pub page_id: PageId,
    pub before: Page,
    pub after: Page,
}

impl LogRecord {
    fn encode_body(
        txn: TransactionId,
        page_id: PageId,
        before: &Page,
        after: &Page,
        buf: &mut Vec<u8>,
    ) {
        buf.extend_from_slice(&txn.0.to_le_bytes());
        buf.extend_from_slice(&page_id.file_id.0.to_le_bytes());
        buf.extend_from_slice(&page_id.page_no.to_le_bytes());
        buf.extend_from_slice(before.as_slice());
        buf.extend_from_slice(after.as_slice());
    }

    fn decode_body(body: &[u8]) -> Self {
        debug_assert_eq!(body.len(), BODY_LEN);
        let u32_at = |at: usize| u32::from_le_bytes([body[at], body[at + 1], body[at + 2], body[at + 3]]);

        let mut txn = [0u8; 8];
        txn.copy_from_slice(&body[0..8]);
        let pages = &body[16..];

        Self {
            txn: TransactionId(u64::from_le_bytes(txn)),
            page_id: PageId::new(FileId(u32_at(8)), u32_at(12)),
            before: Page::from_bytes(&pages[..PAGE_SIZE]),
            after: Page::from_bytes(&pages[PAGE_SIZE..]),
        }
    }
}

/// File-backed [`WriteAheadLog`].
///
/// Records are buffered in memory until [`force`](WriteAheadLog::force),
/// which flushes the buffer and calls `sync_data()`.
pub struct LogFile {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl LogFile {
    /// Open a log for appending, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every durable record, verifying checksums.
    ///
    /// Records still sitting in the write buffer are flushed first.
    ///
    /// # Errors
    /// `Error::CorruptLogRecord` at the first record that is truncated or
    /// fails its checksum.
    pub fn records(&self) -> Result<Vec<LogRecord>> {
        self.writer.lock().flush()?;

        let mut bytes = Vec::new();
        File::open(&self.path)?.read_to_end(&mut bytes)?;

        let mut records = Vec::new();
        let mut offset = 0usize;
        while offset < bytes.len() {
            let corrupt = || Error::CorruptLogRecord {
                offset: offset as u64,
            };
            let prefix = bytes.get(offset..offset + PREFIX_LEN).ok_or_else(corrupt)?;
            let len = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
            let crc = u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]);

            let start = offset + PREFIX_LEN;
            let body = match bytes.get(start..start + len) {
                Some(body) if len == BODY_LEN && crc32fast::hash(body) == crc => body,
                _ => return Err(corrupt()),
            };

            records.push(LogRecord::decode_body(body));
            offset = start + len;
        }

        Ok(records)
    }
}

impl WriteAheadLog for LogFile {
    fn log_write(
        &self,
        txn: TransactionId,
        page_id: PageId,
        before: &Page,
        after: &Page,
    ) -> Result<()> {
        let mut body = Vec::with_capacity(BODY_LEN);
        LogRecord::encode_body(txn, page_id, before, after, &mut body);

        let mut hasher = Hasher::new();
        hasher.update(&body);
        let crc = hasher.finalize();

        let mut writer = self.writer.lock();
        writer.write_all(&(body.len() as u32).to_le_bytes())?;
        writer.write_all(&crc.to_le_bytes())?;
        writer.write_all(&body)?;

        trace!("logged write of {} by {}", page_id, txn);
        Ok(())
    }

    fn force(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }
}

impl std::fmt::Debug for LogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFile").field("path", &self.path).finish()
    }
}
