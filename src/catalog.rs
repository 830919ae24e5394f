//! Catalog - the registry of tables and their heap files.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::common::{Error, FileId, Result};
use crate::storage::HeapFile;

#[derive(Debug, Default)]
struct Tables {
    files: HashMap<FileId, Arc<HeapFile>>,
    names: HashMap<String, FileId>,
    next_id: u32,
}

/// Maps table ids and names to heap files.
///
/// The buffer pool resolves every cache miss through
/// [`file_for`](Self::file_for).
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<Tables>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or create the heap file at `path` and register it as `name`.
    ///
    /// # Errors
    /// `Error::DuplicateTable` if `name` is taken; otherwise any error from
    /// opening the file.
    pub fn create_table<P: AsRef<Path>>(&self, name: &str, path: P, tuple_size: usize) -> Result<FileId> {
        let mut tables = self.tables.write();
        if tables.names.contains_key(name) {
            return Err(Error::DuplicateTable(name.to_string()));
        }

        let id = FileId(tables.next_id);
        let file = HeapFile::open_or_create(path, id, tuple_size)?;
        tables.next_id += 1;
        tables.files.insert(id, Arc::new(file));
        tables.names.insert(name.to_string(), id);

        debug!("registered table {:?} as {}", name, id);
        Ok(id)
    }

    /// Register an already-open heap file under `name`, keeping its id.
    ///
    /// # Errors
    /// `Error::DuplicateTable` if either the name or the file id is taken.
    pub fn add_table(&self, name: &str, file: Arc<HeapFile>) -> Result<FileId> {
        let mut tables = self.tables.write();
        let id = file.id();
        if tables.names.contains_key(name) || tables.files.contains_key(&id) {
            return Err(Error::DuplicateTable(name.to_string()));
        }

        tables.next_id = tables.next_id.max(id.0 + 1);
        tables.files.insert(id, file);
        tables.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// The heap file for table `id`.
    pub fn file_for(&self, id: FileId) -> Result<Arc<HeapFile>> {
        self.tables
            .read()
            .files
            .get(&id)
            .cloned()
            .ok_or(Error::NoSuchTable(id.0))
    }

    /// The id of the table called `name`.
    pub fn table_id(&self, name: &str) -> Result<FileId> {
        self.tables
            .read()
            .names
            .get(name)
            .copied()
            .ok_or_else(|| Error::NoSuchTableName(name.to_string()))
    }

    /// All registered table ids, ascending.
    pub fn table_ids(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = self.tables.read().files.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.tables.read().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
