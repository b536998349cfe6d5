//! Core library for skycast: the authentication and session state machine
//! behind the demo weather client.
//!
//! Everything a real deployment would keep on a server is simulated locally.
//! Accounts, the signed-in session, and any pending two-factor challenge live
//! as JSON records in a data directory, and outbound Telegram notifications
//! are logged stand-ins with an artificial delay.
//!
//! [`engine::AuthEngine`] is the entry point; it owns the two stores and the
//! notification gateway and is the only surface that mutates session state.

pub mod accounts;
pub mod engine;
pub mod error;
pub mod notify;
pub mod session;
pub mod store;

pub use accounts::{Account, AccountStore, PublicIdentity};
pub use engine::{AuthEngine, AuthState};
pub use error::AuthError;
pub use notify::{Notifier, TelegramSim};
pub use session::{PendingChallenge, SessionStore};
pub use store::Storage;
