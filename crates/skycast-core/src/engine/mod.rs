//! The authentication state machine.
//!
//! `AuthEngine` coordinates the account and session stores: it validates
//! credentials, decides whether two-factor confirmation is required, issues
//! and checks one-time codes, and keeps its in-memory state consistent with
//! what is persisted so a restart lands in the same place.
//!
//! The engine is the only surface that mutates session state. Consumers
//! (route guards, screens) read the derived signals and call the operations;
//! they never touch the stores directly.

mod challenge;

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::accounts::{AccountStore, PublicIdentity};
use crate::error::AuthError;
use crate::notify::Notifier;
use crate::session::{PendingChallenge, SessionStore};

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Current position in the sign-in flow.
#[derive(Debug, Clone)]
pub enum AuthState {
    Anonymous,
    PendingTwoFactor(PendingChallenge),
    Authenticated(PublicIdentity),
}

pub struct AuthEngine {
    accounts: AccountStore,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    state: AuthState,
}

impl AuthEngine {
    /// Reconstruct the engine from persisted session state.
    ///
    /// An authenticated session wins if both records are somehow present;
    /// the stores never write both at once, so this is purely a recovery
    /// order.
    pub fn new(
        accounts: AccountStore,
        session: SessionStore,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AuthError> {
        let state = if let Some(identity) = session.load_authenticated()? {
            info!(email = %identity.email, "Restored authenticated session");
            AuthState::Authenticated(identity)
        } else if let Some(pending) = session.load_pending()? {
            info!(email = %pending.identity.email, "Restored pending two-factor challenge");
            AuthState::PendingTwoFactor(pending)
        } else {
            AuthState::Anonymous
        };

        Ok(Self {
            accounts,
            session,
            notifier,
            state,
        })
    }

    // ===== Derived signals =====

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    pub fn pending_two_factor(&self) -> bool {
        matches!(self.state, AuthState::PendingTwoFactor(_))
    }

    pub fn current_user(&self) -> Option<&PublicIdentity> {
        match &self.state {
            AuthState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    // ===== Operations =====

    /// Validate credentials and either sign in directly or open a two-factor
    /// challenge. A pending challenge from an earlier attempt is overwritten,
    /// never stacked.
    ///
    /// The response shape is identical for an unknown email and a wrong
    /// password.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        let account = self
            .accounts
            .find_by_email(email)?
            .filter(|a| a.password == password)
            .ok_or(AuthError::InvalidCredentials)?;

        let identity = account.to_public();

        if !account.two_factor_enabled {
            self.session.save_authenticated(&identity)?;
            self.session.clear_pending()?;
            self.state = AuthState::Authenticated(identity);
            info!(email, "Signed in");
            return Ok(());
        }

        let code = challenge::generate_code();
        let pending = PendingChallenge {
            identity,
            issued_at: Utc::now(),
            code_hash: challenge::hash_code(&code)?,
        };
        self.session.clear_authenticated()?;
        self.session.save_pending(&pending)?;
        self.state = AuthState::PendingTwoFactor(pending);
        info!(email, "Two-factor confirmation required");

        // Delivery happens after the transition is durable: a slow or failing
        // gateway must not keep the user from the verification step.
        match &account.telegram_id {
            Some(telegram_id) => {
                let message = format!(
                    "Sign-in attempt for {}. Use this code to confirm:",
                    account.email
                );
                if !self.notifier.send(telegram_id, &message, Some(&code)).await {
                    warn!(email, "Confirmation code delivery failed");
                }
            }
            None => warn!(email, "No delivery destination for confirmation code"),
        }

        Ok(())
    }

    /// Confirm a pending challenge with the submitted code.
    ///
    /// An expired challenge is cleared on the spot, so the next attempt
    /// reports `NoPendingChallenge` and the caller starts over from login.
    pub fn verify_two_factor(&mut self, code: &str) -> Result<(), AuthError> {
        let pending = match &self.state {
            AuthState::PendingTwoFactor(pending) => pending.clone(),
            _ => return Err(AuthError::NoPendingChallenge),
        };

        if pending.is_expired() {
            self.session.clear_pending()?;
            self.state = AuthState::Anonymous;
            info!(email = %pending.identity.email, "Two-factor challenge expired");
            return Err(AuthError::Expired);
        }

        if !challenge::verify_code(code, &pending.code_hash) {
            return Err(AuthError::InvalidCode);
        }

        self.session.save_authenticated(&pending.identity)?;
        self.session.clear_pending()?;
        info!(email = %pending.identity.email, "Two-factor confirmation succeeded");
        self.state = AuthState::Authenticated(pending.identity);
        Ok(())
    }

    /// Create an account and sign it in. Registration implies login; the new
    /// account starts with two-factor disabled, so no challenge is issued.
    pub fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        telegram_id: Option<&str>,
    ) -> Result<(), AuthError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        let account = self.accounts.create(username, email, password, telegram_id)?;
        let identity = account.to_public();
        self.session.save_authenticated(&identity)?;
        self.session.clear_pending()?;
        self.state = AuthState::Authenticated(identity);
        info!(email, "Registered and signed in");
        Ok(())
    }

    /// Drop all session state. Total and idempotent, callable from any state;
    /// cancelling a pending challenge goes through here as well.
    pub fn logout(&mut self) -> Result<(), AuthError> {
        self.session.clear_authenticated()?;
        self.session.clear_pending()?;
        if !matches!(self.state, AuthState::Anonymous) {
            info!("Signed out");
        }
        self.state = AuthState::Anonymous;
        Ok(())
    }

    /// Toggle two-factor sign-in for the current account.
    pub fn set_two_factor_enabled(&mut self, enabled: bool) -> Result<(), AuthError> {
        self.update_current(|accounts, identity| {
            accounts.update_two_factor_enabled(&identity.id, enabled)?;
            identity.two_factor_enabled = enabled;
            Ok(())
        })
    }

    /// Change the Telegram destination for the current account.
    pub fn set_telegram_id(&mut self, telegram_id: &str) -> Result<(), AuthError> {
        self.update_current(|accounts, identity| {
            accounts.update_telegram_id(&identity.id, telegram_id)?;
            identity.telegram_id = Some(telegram_id.to_string());
            Ok(())
        })
    }

    /// Apply a settings change to the account record, the in-memory identity,
    /// and its persisted session copy, so the three views never diverge. The
    /// account record is written first; on failure the identity is untouched.
    fn update_current(
        &mut self,
        apply: impl FnOnce(&AccountStore, &mut PublicIdentity) -> Result<(), AuthError>,
    ) -> Result<(), AuthError> {
        let AuthState::Authenticated(identity) = &mut self.state else {
            return Err(AuthError::NotAuthenticated);
        };
        apply(&self.accounts, identity)?;
        self.session.save_authenticated(identity)?;
        Ok(())
    }
}
