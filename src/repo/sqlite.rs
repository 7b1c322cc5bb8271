//! SQLite-backed record repository.
//!
//! One table, `users`, keyed by email with binary collation so uniqueness is
//! case-sensitive exact match. The primary-key constraint makes
//! insert-if-absent atomic: a racing duplicate surfaces as a constraint
//! violation, not a second row.

use super::{IdentityRecord, InsertOutcome, RecordRepository};
use crate::error::RepoError;
use parking_lot::Mutex;
use std::path::Path;

pub struct SqliteRepository {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteRepository {
    /// Open (or create) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, RepoError> {
        let conn = rusqlite::Connection::open(db_path)?;

        // WAL mode for concurrent reads + crash safety
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                email TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                batch TEXT NOT NULL,
                department TEXT NOT NULL,
                registration_date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                secret_salt TEXT NOT NULL,
                secret_hash TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<IdentityRecord> {
    Ok(IdentityRecord {
        email: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        phone: row.get(3)?,
        batch: row.get(4)?,
        department: row.get(5)?,
        registration_date: row.get(6)?,
        created_at: row.get(7)?,
        secret_salt: row.get(8)?,
        secret_hash: row.get(9)?,
    })
}

const RECORD_COLUMNS: &str = "email, first_name, last_name, phone, batch, department, \
                              registration_date, created_at, secret_salt, secret_hash";

impl RecordRepository for SqliteRepository {
    fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, RepoError> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM users WHERE email = ?1"),
            rusqlite::params![email],
            record_from_row,
        );

        match row {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn insert_if_absent(&self, record: &IdentityRecord) -> Result<InsertOutcome, RepoError> {
        let conn = self.conn.lock();
        let result = conn.execute(
            &format!(
                "INSERT INTO users ({RECORD_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            rusqlite::params![
                record.email,
                record.first_name,
                record.last_name,
                record.phone,
                record.batch,
                record.department,
                record.registration_date,
                record.created_at,
                record.secret_salt,
                record.secret_hash,
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(InsertOutcome::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn iterate_all(&self) -> Result<Vec<IdentityRecord>, RepoError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {RECORD_COLUMNS} FROM users ORDER BY rowid"))?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
