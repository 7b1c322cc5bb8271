//! Credential store: registration, authentication, and profile listing.
//!
//! The store owns validation and secret hashing; persistence goes through the
//! injected [`RecordRepository`]. Secrets are hashed with PBKDF2-HMAC-SHA256
//! (100k rounds) and a per-record random salt, and neither the raw secret nor
//! the derived digest ever leaves this module.

use crate::error::StoreError;
use crate::repo::{IdentityRecord, InsertOutcome, RecordRepository};
use rand::Rng;
use serde::Serialize;
use sha2::Sha256;
use std::sync::Arc;

/// Salt byte length for secret hashing.
const SALT_BYTES: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count.
const PBKDF2_ROUNDS: u32 = 100_000;

/// Fixed salt used to equalize the cost of the unknown-email path.
const DUMMY_SALT: &str = "00000000000000000000000000000000";

/// Registration input: every field is required and must be non-blank.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub batch: String,
    pub department: String,
    pub registration_date: String,
}

/// The subset of an identity record safe to return to any caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub batch: String,
    pub department: String,
    pub registration_date: String,
    pub created_at: String,
}

impl From<&IdentityRecord> for PublicProfile {
    fn from(record: &IdentityRecord) -> Self {
        Self {
            email: record.email.clone(),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            phone: record.phone.clone(),
            batch: record.batch.clone(),
            department: record.department.clone(),
            registration_date: record.registration_date.clone(),
            created_at: record.created_at.clone(),
        }
    }
}

/// Registration/login core over an injected repository.
pub struct CredentialStore {
    repo: Arc<dyn RecordRepository>,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn RecordRepository>) -> Self {
        Self { repo }
    }

    /// Register a new alumnus. Returns the stored public profile.
    pub fn register(
        &self,
        profile: NewProfile,
        raw_secret: &str,
    ) -> Result<PublicProfile, StoreError> {
        for (name, value) in [
            ("email", &profile.email),
            ("firstName", &profile.first_name),
            ("lastName", &profile.last_name),
            ("phone", &profile.phone),
            ("batch", &profile.batch),
            ("department", &profile.department),
            ("registrationDate", &profile.registration_date),
        ] {
            if value.trim().is_empty() {
                return Err(StoreError::Validation(format!("{name} is required")));
            }
        }
        if raw_secret.is_empty() {
            return Err(StoreError::Validation("password is required".to_string()));
        }

        let salt = generate_salt();
        let secret_hash = hash_secret(raw_secret, &salt);
        let record = IdentityRecord {
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            batch: profile.batch,
            department: profile.department,
            registration_date: profile.registration_date,
            created_at: chrono::Utc::now().to_rfc3339(),
            secret_salt: salt,
            secret_hash,
        };

        match self.repo.insert_if_absent(&record)? {
            InsertOutcome::Inserted => {
                tracing::info!(email = %record.email, "alumnus registered");
                Ok(PublicProfile::from(&record))
            }
            InsertOutcome::DuplicateEmail => {
                tracing::warn!(email = %record.email, "duplicate registration rejected");
                Err(StoreError::DuplicateIdentity(record.email))
            }
        }
    }

    /// Authenticate by email + secret. Unknown email and wrong secret are
    /// deliberately indistinguishable to the caller.
    pub fn authenticate(
        &self,
        email: &str,
        raw_secret: &str,
    ) -> Result<PublicProfile, StoreError> {
        match self.repo.find_by_email(email)? {
            Some(record) => {
                let attempt = hash_secret(raw_secret, &record.secret_salt);
                if !constant_time_eq(attempt.as_bytes(), record.secret_hash.as_bytes()) {
                    return Err(StoreError::InvalidCredentials);
                }
                Ok(PublicProfile::from(&record))
            }
            None => {
                // Dummy hash so this path costs the same as a real check
                let _ = hash_secret(raw_secret, DUMMY_SALT);
                Err(StoreError::InvalidCredentials)
            }
        }
    }

    /// Every stored record's public fields, in repository iteration order.
    pub fn list_profiles(&self) -> Result<Vec<PublicProfile>, StoreError> {
        let records = self.repo.iterate_all()?;
        Ok(records.iter().map(PublicProfile::from).collect())
    }
}

// ── Cryptographic Helpers ───────────────────────────────────────────

/// Generate a random salt (hex-encoded).
fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derive the stored digest for a secret (hex-encoded).
fn hash_secret(secret: &str, salt: &str) -> String {
    let mut out = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut out);
    hex::encode(out)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::sqlite::SqliteRepository;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, CredentialStore) {
        let tmp = TempDir::new().unwrap();
        let repo = SqliteRepository::open(&tmp.path().join("alumni.db")).unwrap();
        (tmp, CredentialStore::new(Arc::new(repo)))
    }

    fn sample_profile(email: &str) -> NewProfile {
        NewProfile {
            email: email.to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            phone: "123".to_string(),
            batch: "2020".to_string(),
            department: "CS".to_string(),
            registration_date: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn register_then_authenticate_round_trips() {
        let (_tmp, store) = test_store();

        let registered = store.register(sample_profile("a@x.com"), "hunter2").unwrap();
        let authed = store.authenticate("a@x.com", "hunter2").unwrap();
        assert_eq!(authed, registered);
        assert_eq!(authed.first_name, "A");
        assert_eq!(authed.batch, "2020");
    }

    #[test]
    fn authenticate_unknown_email_fails() {
        let (_tmp, store) = test_store();

        let result = store.authenticate("ghost@x.com", "whatever");
        assert!(matches!(result, Err(StoreError::InvalidCredentials)));
    }

    #[test]
    fn authenticate_wrong_secret_fails_like_unknown_email() {
        let (_tmp, store) = test_store();

        store.register(sample_profile("a@x.com"), "hunter2").unwrap();
        let wrong_secret = store.authenticate("a@x.com", "wrong").unwrap_err();
        let unknown_email = store.authenticate("ghost@x.com", "hunter2").unwrap_err();

        assert!(matches!(wrong_secret, StoreError::InvalidCredentials));
        assert_eq!(wrong_secret.to_string(), unknown_email.to_string());
    }

    #[test]
    fn duplicate_email_is_rejected_and_not_stored_twice() {
        let (_tmp, store) = test_store();

        store.register(sample_profile("a@x.com"), "hunter2").unwrap();
        let result = store.register(sample_profile("a@x.com"), "other-secret");
        assert!(matches!(result, Err(StoreError::DuplicateIdentity(_))));

        let profiles = store.list_profiles().unwrap();
        assert_eq!(profiles.len(), 1);
    }

    #[test]
    fn duplicate_check_is_case_sensitive() {
        let (_tmp, store) = test_store();

        store.register(sample_profile("a@x.com"), "hunter2").unwrap();
        assert!(store.register(sample_profile("A@x.com"), "hunter2").is_ok());
    }

    #[test]
    fn register_blank_field_fails_validation() {
        let (_tmp, store) = test_store();

        let mut profile = sample_profile("a@x.com");
        profile.department = "  ".to_string();
        let result = store.register(profile, "hunter2");
        match result {
            Err(StoreError::Validation(msg)) => assert!(msg.contains("department")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn register_empty_secret_fails_validation() {
        let (_tmp, store) = test_store();

        let result = store.register(sample_profile("a@x.com"), "");
        assert!(matches!(result, Err(StoreError::Validation(_))));
    }

    #[test]
    fn list_profiles_never_exposes_secret_material() {
        let (_tmp, store) = test_store();

        store.register(sample_profile("a@x.com"), "hunter2").unwrap();
        let json = serde_json::to_value(store.list_profiles().unwrap()).unwrap();
        let dumped = json.to_string();
        assert!(!dumped.contains("secretHash"));
        assert!(!dumped.contains("secretSalt"));
        assert!(!dumped.contains("hunter2"));
    }

    #[test]
    fn secret_hash_is_deterministic_per_salt() {
        let h1 = hash_secret("hunter2", "fixed_salt_value");
        let h2 = hash_secret("hunter2", "fixed_salt_value");
        assert_eq!(h1, h2);
    }

    #[test]
    fn secret_hash_differs_across_salts_and_inputs() {
        assert_ne!(
            hash_secret("hunter2", "salt_a"),
            hash_secret("hunter2", "salt_b")
        );
        assert_ne!(
            hash_secret("hunter2", "salt_a"),
            hash_secret("hunter3", "salt_a")
        );
    }

    #[test]
    fn constant_time_eq_works() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }
}
