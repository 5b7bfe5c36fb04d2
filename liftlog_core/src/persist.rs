//! Key-value blob persistence.
//!
//! The log is stored as a single text blob under a fixed key. Two backends:
//! - [`FileBlobStore`]: one `<key>.json` file per key, locked reads and
//!   atomic replace on write
//! - [`MemoryBlobStore`]: in-process map
//!
//! A single `put` is atomic, but a load-modify-save cycle is not. Processes
//! sharing a data directory hold [`FileBlobStore::lock`] for the whole cycle.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Persistence collaborator: read and write whole blobs by key
pub trait BlobStore {
    /// Returns `None` when nothing was saved under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn put(&mut self, key: &str, value: &str) -> Result<()>;
}

/// File-backed blob store rooted at a data directory
#[derive(Clone, Debug)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Take the writer lock for `key`, blocking until it is free.
    ///
    /// The lock lives on a sibling `<key>.lock` file, which is never
    /// replaced, and is released when the guard is dropped.
    pub fn lock(&self, key: &str) -> Result<StoreLock> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.lock", key));

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)?;
        file.lock_exclusive()?;

        tracing::debug!("Acquired lock {:?}", path);
        Ok(StoreLock { file, path })
    }
}

/// Exclusive hold on one key of a [`FileBlobStore`]
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release lock {:?}: {}", self.path, e);
        } else {
            tracing::debug!("Released lock {:?}", self.path);
        }
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            tracing::debug!("No blob at {:?}", path);
            return Ok(None);
        }

        let file = File::open(&path)?;

        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        tracing::debug!("Read {} bytes from {:?}", contents.len(), path);
        Ok(Some(contents))
    }

    /// Atomically writes the blob by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        let temp = NamedTempFile::new_in(&self.dir)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}

/// In-memory blob store
#[derive(Clone, Debug, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
    writes: usize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one blob
    pub fn with_blob(key: &str, value: &str) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(key.to_string(), value.to_string());
        Self { blobs, writes: 0 }
    }

    /// Number of `put` calls so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}
