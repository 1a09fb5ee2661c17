//! Email/password authentication.
//!
//! The signed-in user is published on a `watch` channel so the cart sync
//! task and the document store can react to sign-in and sign-out without
//! polling.
//!
//! - [`IdentityToolkitAuth`] - Firebase Identity Toolkit REST API
//! - [`MemoryAuth`] - offline runs and tests

mod error;
mod identity_toolkit;
mod memory;

pub use error::AuthError;
pub use identity_toolkit::IdentityToolkitAuth;
pub use memory::MemoryAuth;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;

use fakestore_core::{Email, UserId};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// The signed-in user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: Email,
    /// Bearer token for the document store; `None` for offline sessions.
    pub id_token: Option<SecretString>,
}

/// Authentication backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn sign_up(&self, email: &Email, password: &SecretString)
    -> Result<AuthUser, AuthError>;

    /// Sign in with email and password.
    async fn sign_in(&self, email: &Email, password: &SecretString)
    -> Result<AuthUser, AuthError>;

    /// Sign out the current user. Signing out while signed out is a no-op.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Delete the signed-in account and sign out.
    async fn delete_account(&self) -> Result<(), AuthError>;

    /// Currently signed-in user.
    fn current_user(&self) -> Option<AuthUser>;

    /// Observe sign-in state changes.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;
}

/// Check password requirements before contacting a backend.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &SecretString) -> Result<(), AuthError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Sign-in state shared by the providers.
#[derive(Debug)]
struct Session {
    tx: watch::Sender<Option<AuthUser>>,
}

impl Session {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    fn current(&self) -> Option<AuthUser> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.tx.subscribe()
    }

    fn set(&self, user: Option<AuthUser>) {
        self.tx.send_replace(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_rule() {
        assert!(validate_password(&SecretString::from("12345")).is_err());
        assert!(validate_password(&SecretString::from("123456")).is_ok());
    }
}
