//! Append-only JSON-lines record repository.
//!
//! One record per line. The whole file is read once at startup to build an
//! in-memory email index; after that, reads never touch the disk and writes
//! are single flushed appends. Duplicate check and append happen under the
//! same lock, so insert-if-absent is atomic for every caller sharing this
//! handle. The file itself carries no uniqueness constraint — a second
//! process writing concurrently is out of contract.

use super::{IdentityRecord, InsertOutcome, RecordRepository};
use crate::error::RepoError;
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub struct FlatFileRepository {
    path: PathBuf,
    index: Mutex<Index>,
}

/// In-memory view of the file: records in file order plus an email → slot map.
#[derive(Default)]
struct Index {
    records: Vec<IdentityRecord>,
    by_email: std::collections::HashMap<String, usize>,
}

impl Index {
    fn insert(&mut self, record: IdentityRecord) -> bool {
        if self.by_email.contains_key(&record.email) {
            return false;
        }
        self.by_email
            .insert(record.email.clone(), self.records.len());
        self.records.push(record);
        true
    }
}

impl FlatFileRepository {
    /// Open the store, creating the file if needed and rebuilding the index
    /// from any existing lines.
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        let mut index = Index::default();

        if path.exists() {
            let file = std::fs::File::open(path)?;
            for (line_no, line) in BufReader::new(file).lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let record: IdentityRecord =
                    serde_json::from_str(&line).map_err(|e| RepoError::Corrupt {
                        path: path.display().to_string(),
                        line: line_no + 1,
                        detail: e.to_string(),
                    })?;
                // First occurrence wins; later duplicates are leftovers from
                // the pre-index era and are ignored.
                if !index.insert(record) {
                    tracing::warn!(
                        "duplicate email at {} line {} ignored",
                        path.display(),
                        line_no + 1
                    );
                }
            }
        } else {
            // Create up front so a read-only deployment fails at startup,
            // not on the first registration.
            OpenOptions::new().create(true).append(true).open(path)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            index: Mutex::new(index),
        })
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.index.lock().records.len()
    }
}

impl RecordRepository for FlatFileRepository {
    fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, RepoError> {
        let index = self.index.lock();
        Ok(index
            .by_email
            .get(email)
            .map(|&slot| index.records[slot].clone()))
    }

    fn insert_if_absent(&self, record: &IdentityRecord) -> Result<InsertOutcome, RepoError> {
        let mut index = self.index.lock();
        if index.by_email.contains_key(&record.email) {
            return Ok(InsertOutcome::DuplicateEmail);
        }

        // Append while still holding the lock: the index only learns about
        // the record once the line is durably on disk.
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;

        index.insert(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn iterate_all(&self) -> Result<Vec<IdentityRecord>, RepoError> {
        Ok(self.index.lock().records.clone())
    }
}
