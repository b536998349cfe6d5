use thiserror::Error;

/// Failures surfaced by the auth engine and its stores.
///
/// Every operation reports its outcome explicitly; none of these leave the
/// engine in a partially-transitioned state. The only failure the core
/// handles on its own is a corrupt persisted record, which the storage layer
/// discards and treats as absence before an error of this type is ever built.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("password is too short")]
    WeakPassword,

    #[error("no two-factor confirmation is pending")]
    NoPendingChallenge,

    #[error("confirmation code does not match")]
    InvalidCode,

    #[error("confirmation code has expired")]
    Expired,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("account not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
