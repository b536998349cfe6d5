//! Durable account records: the demo's stand-in for a user database.
//!
//! The whole collection lives in a single JSON record and every operation is
//! a read-modify-write over it; the storage layer's atomic replace keeps a
//! failed write from corrupting existing accounts.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AuthError;
use crate::store::Storage;

/// Storage record holding every registered account.
const ACCOUNTS_RECORD: &str = "accounts";

/// A registered account, including its secret credential.
///
/// Never leaves the store layer except stripped down to a
/// [`PublicIdentity`]. The password is an opaque secret compared by exact
/// match; hashing it is out of scope for the demo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub telegram_id: Option<String>,
    pub two_factor_enabled: bool,
}

impl Account {
    /// The password-free view exposed to the rest of the application.
    pub fn to_public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            telegram_id: self.telegram_id.clone(),
            two_factor_enabled: self.two_factor_enabled,
        }
    }
}

/// An [`Account`] with the password removed: safe to persist as session
/// state and to hand to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIdentity {
    pub id: String,
    pub username: String,
    pub email: String,
    pub telegram_id: Option<String>,
    pub two_factor_enabled: bool,
}

pub struct AccountStore {
    storage: Storage,
}

impl AccountStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    fn load_all(&self) -> Result<Vec<Account>, AuthError> {
        Ok(self.storage.load(ACCOUNTS_RECORD)?.unwrap_or_default())
    }

    fn save_all(&self, accounts: &[Account]) -> Result<(), AuthError> {
        self.storage.save(ACCOUNTS_RECORD, accounts)?;
        Ok(())
    }

    /// Exact-match lookup, case-sensitive as provided.
    pub fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.load_all()?.into_iter().find(|a| a.email == email))
    }

    /// Create an account with a fresh id. Two-factor starts disabled.
    pub fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        telegram_id: Option<&str>,
    ) -> Result<Account, AuthError> {
        let mut accounts = self.load_all()?;
        if accounts.iter().any(|a| a.email == email) {
            return Err(AuthError::DuplicateEmail);
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            telegram_id: telegram_id.map(str::to_string),
            two_factor_enabled: false,
        };
        accounts.push(account.clone());
        self.save_all(&accounts)?;

        info!(email, "Account created");
        Ok(account)
    }

    pub fn update_telegram_id(&self, id: &str, telegram_id: &str) -> Result<(), AuthError> {
        self.update(id, |account| {
            account.telegram_id = Some(telegram_id.to_string());
        })
    }

    pub fn update_two_factor_enabled(&self, id: &str, enabled: bool) -> Result<(), AuthError> {
        self.update(id, |account| {
            account.two_factor_enabled = enabled;
        })
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut Account)) -> Result<(), AuthError> {
        let mut accounts = self.load_all()?;
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AuthError::NotFound)?;
        apply(account);
        self.save_all(&accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, AccountStore) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf()).unwrap();
        (dir, AccountStore::new(storage))
    }

    #[test]
    fn create_assigns_id_and_defaults() {
        let (_dir, store) = store();
        let account = store
            .create("alice", "alice@x.com", "secret1", None)
            .unwrap();

        assert!(!account.id.is_empty());
        assert!(!account.two_factor_enabled);
        assert_eq!(account.telegram_id, None);
    }

    #[test]
    fn find_by_email_is_exact_match() {
        let (_dir, store) = store();
        store
            .create("alice", "alice@x.com", "secret1", None)
            .unwrap();

        assert!(store.find_by_email("alice@x.com").unwrap().is_some());
        assert!(store.find_by_email("Alice@x.com").unwrap().is_none());
        assert!(store.find_by_email("bob@x.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected_and_original_unchanged() {
        let (_dir, store) = store();
        store
            .create("alice", "alice@x.com", "secret1", None)
            .unwrap();

        let err = store
            .create("impostor", "alice@x.com", "other99", None)
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));

        let account = store.find_by_email("alice@x.com").unwrap().unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.password, "secret1");
    }

    #[test]
    fn updates_persist_across_store_instances() {
        let (dir, store) = store();
        let account = store
            .create("alice", "alice@x.com", "secret1", None)
            .unwrap();

        store.update_two_factor_enabled(&account.id, true).unwrap();
        store.update_telegram_id(&account.id, "@alice").unwrap();

        let storage = Storage::new(dir.path().to_path_buf()).unwrap();
        let reopened = AccountStore::new(storage);
        let account = reopened.find_by_email("alice@x.com").unwrap().unwrap();
        assert!(account.two_factor_enabled);
        assert_eq!(account.telegram_id.as_deref(), Some("@alice"));
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let (_dir, store) = store();
        let err = store.update_two_factor_enabled("no-such-id", true).unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[test]
    fn to_public_strips_password() {
        let (_dir, store) = store();
        let account = store
            .create("alice", "alice@x.com", "secret1", Some("@alice"))
            .unwrap();
        let identity = account.to_public();

        assert_eq!(identity.id, account.id);
        assert_eq!(identity.email, "alice@x.com");
        assert_eq!(identity.telegram_id.as_deref(), Some("@alice"));
        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("secret1"));
    }
}
