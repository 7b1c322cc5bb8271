//! Error taxonomy for the credential store and its storage backends.

use thiserror::Error;

/// Errors surfaced by [`crate::registry::CredentialStore`] operations.
///
/// `Validation` and `DuplicateIdentity` are user-correctable and map to 400;
/// `InvalidCredentials` maps to 401 and deliberately carries no detail about
/// whether the email exists; `Repository` is a storage failure and maps to a
/// generic 500 with the detail only logged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("a user with email '{0}' already exists")]
    DuplicateIdentity(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("storage failure: {0}")]
    Repository(#[from] RepoError),
}

/// Errors from a [`crate::repo::RecordRepository`] backend.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt record at {path} line {line}: {detail}")]
    Corrupt {
        path: String,
        line: usize,
        detail: String,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
