//! Durable session state: the signed-in identity and any pending two-factor
//! challenge.
//!
//! Two optional records, each holding at most one entry. Corrupt persisted
//! data is treated as absence and deleted by the storage layer, so a bad
//! session file degrades to "signed out" instead of a startup failure.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::PublicIdentity;
use crate::error::AuthError;
use crate::store::Storage;

/// Storage record for the authenticated identity.
const SESSION_RECORD: &str = "session";

/// Storage record for the pending two-factor challenge.
const PENDING_RECORD: &str = "pending";

/// Confirmation code validity window.
/// Matches the "code valid for 10 minutes" promise shown to the user.
const CODE_VALIDITY_MINUTES: i64 = 10;

/// An issued, unconfirmed two-factor challenge tied to one identity.
///
/// The plaintext code is never stored; `code_hash` is an Argon2 hash the
/// submitted code is checked against, which lets a challenge survive a
/// process restart within its validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingChallenge {
    pub identity: PublicIdentity,
    pub issued_at: DateTime<Utc>,
    pub code_hash: String,
}

impl PendingChallenge {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.issued_at + Duration::minutes(CODE_VALIDITY_MINUTES)
    }

    /// Minutes remaining before the code stops being accepted (for display).
    pub fn minutes_remaining(&self) -> i64 {
        let expiry = self.issued_at + Duration::minutes(CODE_VALIDITY_MINUTES);
        (expiry - Utc::now()).num_minutes().max(0)
    }
}

pub struct SessionStore {
    storage: Storage,
}

impl SessionStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn load_authenticated(&self) -> Result<Option<PublicIdentity>, AuthError> {
        Ok(self.storage.load(SESSION_RECORD)?)
    }

    pub fn save_authenticated(&self, identity: &PublicIdentity) -> Result<(), AuthError> {
        Ok(self.storage.save(SESSION_RECORD, identity)?)
    }

    pub fn clear_authenticated(&self) -> Result<(), AuthError> {
        Ok(self.storage.remove(SESSION_RECORD)?)
    }

    pub fn load_pending(&self) -> Result<Option<PendingChallenge>, AuthError> {
        Ok(self.storage.load(PENDING_RECORD)?)
    }

    pub fn save_pending(&self, challenge: &PendingChallenge) -> Result<(), AuthError> {
        Ok(self.storage.save(PENDING_RECORD, challenge)?)
    }

    pub fn clear_pending(&self) -> Result<(), AuthError> {
        Ok(self.storage.remove(PENDING_RECORD)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> PublicIdentity {
        PublicIdentity {
            id: "id-1".to_string(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            telegram_id: Some("@alice".to_string()),
            two_factor_enabled: true,
        }
    }

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf()).unwrap();
        (dir, SessionStore::new(storage))
    }

    #[test]
    fn authenticated_roundtrip_and_clear() {
        let (_dir, store) = store();
        assert!(store.load_authenticated().unwrap().is_none());

        store.save_authenticated(&identity()).unwrap();
        assert_eq!(store.load_authenticated().unwrap(), Some(identity()));

        store.clear_authenticated().unwrap();
        assert!(store.load_authenticated().unwrap().is_none());
        // Clearing twice is fine.
        store.clear_authenticated().unwrap();
    }

    #[test]
    fn pending_roundtrip() {
        let (_dir, store) = store();
        let challenge = PendingChallenge {
            identity: identity(),
            issued_at: Utc::now(),
            code_hash: "$argon2id$fake".to_string(),
        };
        store.save_pending(&challenge).unwrap();

        let loaded = store.load_pending().unwrap().unwrap();
        assert_eq!(loaded.identity, identity());
        assert_eq!(loaded.code_hash, challenge.code_hash);
        assert!(!loaded.is_expired());
    }

    #[test]
    fn corrupt_session_fails_open() {
        let (dir, store) = store();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not even json").unwrap();

        assert!(store.load_authenticated().unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn challenge_expiry_window() {
        let fresh = PendingChallenge {
            identity: identity(),
            issued_at: Utc::now(),
            code_hash: String::new(),
        };
        assert!(!fresh.is_expired());
        assert!(fresh.minutes_remaining() >= 9);

        let stale = PendingChallenge {
            issued_at: Utc::now() - Duration::minutes(11),
            ..fresh
        };
        assert!(stale.is_expired());
        assert_eq!(stale.minutes_remaining(), 0);
    }
}
