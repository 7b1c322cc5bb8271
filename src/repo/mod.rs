//! Record repository abstraction and backends.
//!
//! The credential store talks to storage only through [`RecordRepository`]:
//! lookup by email, atomic insert-if-absent, and full iteration. Two backends
//! implement it — SQLite ([`sqlite::SqliteRepository`]) and an append-only
//! JSON-lines file ([`flatfile::FlatFileRepository`]). Exactly one is chosen
//! at startup from configuration.

pub mod flatfile;
pub mod sqlite;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::RepoError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One registered alumnus, as persisted. `secret_salt`/`secret_hash` are the
/// only derived fields; the raw password is never stored.
///
/// Serialized camelCase to match the JSON shape the frontends already use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub batch: String,
    pub department: String,
    /// Caller-supplied, stored verbatim.
    pub registration_date: String,
    /// Server-assigned RFC 3339 timestamp.
    pub created_at: String,
    pub secret_salt: String,
    pub secret_hash: String,
}

/// Result of an [`RecordRepository::insert_if_absent`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same email already exists; nothing was written.
    DuplicateEmail,
}

/// Storage contract consumed by the credential store.
///
/// Email comparison is case-sensitive exact match throughout. Insert must be
/// atomic at the storage boundary: two racing inserts for the same email
/// resolve to one `Inserted` and one `DuplicateEmail`, never two rows.
pub trait RecordRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, RepoError>;

    fn insert_if_absent(&self, record: &IdentityRecord) -> Result<InsertOutcome, RepoError>;

    /// Every stored record, in insertion order.
    fn iterate_all(&self) -> Result<Vec<IdentityRecord>, RepoError>;
}

/// Construct the repository backend named by the config.
pub fn create_repository(config: &StorageConfig) -> Result<Arc<dyn RecordRepository>> {
    match config.backend {
        StorageBackend::Sqlite => {
            let repo = sqlite::SqliteRepository::open(&config.path)?;
            tracing::info!("sqlite repository opened at {}", config.path.display());
            Ok(Arc::new(repo))
        }
        StorageBackend::Flatfile => {
            let repo = flatfile::FlatFileRepository::open(&config.path)?;
            tracing::info!(
                "flat-file repository opened at {} ({} records indexed)",
                config.path.display(),
                repo.len()
            );
            Ok(Arc::new(repo))
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_record(email: &str) -> IdentityRecord {
    IdentityRecord {
        email: email.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        phone: "555-0100".to_string(),
        batch: "2020".to_string(),
        department: "CS".to_string(),
        registration_date: "2024-01-01".to_string(),
        created_at: "2024-01-02T03:04:05+00:00".to_string(),
        secret_salt: "00112233445566778899aabbccddeeff".to_string(),
        secret_hash: "deadbeef".to_string(),
    }
}
