//! In-process account registry.

use std::collections::HashMap;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, watch};
use tracing::{info, instrument};

use fakestore_core::{Email, UserId};

use super::{AuthError, AuthProvider, AuthUser, Session, validate_password};

#[derive(Debug, Clone)]
struct Account {
    uid: UserId,
    email: Email,
    password_hash: String,
}

/// Accounts held in memory with Argon2id password hashes.
#[derive(Debug)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    session: Session,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    /// Create an empty registry with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Session::new(),
        }
    }

    fn signed_in(account: &Account) -> AuthUser {
        AuthUser {
            uid: account.uid.clone(),
            email: account.email.clone(),
            id_token: None,
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, AuthError> {
        validate_password(password)?;

        let mut accounts = self.accounts.lock().await;
        let key = email.normalized();
        if accounts.contains_key(&key) {
            return Err(AuthError::UserAlreadyExists);
        }

        let account = Account {
            uid: UserId::new(uuid::Uuid::new_v4().simple().to_string()),
            email: email.clone(),
            password_hash: hash_password(password.expose_secret())?,
        };
        let user = Self::signed_in(&account);
        accounts.insert(key, account);
        drop(accounts);

        info!(uid = %user.uid, "Account created");
        self.session.set(Some(user.clone()));
        Ok(user)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, AuthError> {
        let account = self
            .accounts
            .lock()
            .await
            .get(&email.normalized())
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password.expose_secret(), &account.password_hash)?;

        let user = Self::signed_in(&account);
        self.session.set(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.set(None);
        Ok(())
    }

    async fn delete_account(&self) -> Result<(), AuthError> {
        let user = self.session.current().ok_or(AuthError::NotSignedIn)?;
        self.accounts.lock().await.remove(&user.email.normalized());
        info!(uid = %user.uid, "Account deleted");
        self.session.set(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.current()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn email() -> Email {
        Email::parse("ada@example.com").unwrap()
    }

    fn password(p: &str) -> SecretString {
        SecretString::from(p)
    }

    #[tokio::test]
    async fn test_sign_up_signs_in_and_publishes() {
        let auth = MemoryAuth::new();
        let rx = auth.subscribe();
        assert!(rx.borrow().is_none());

        let user = auth.sign_up(&email(), &password("secret1")).await.unwrap();
        assert_eq!(auth.current_user().unwrap().uid, user.uid);
        assert_eq!(rx.borrow().as_ref().unwrap().uid, user.uid);
    }

    #[tokio::test]
    async fn test_duplicate_and_weak_registrations_rejected() {
        let auth = MemoryAuth::new();
        auth.sign_up(&email(), &password("secret1")).await.unwrap();

        let upper = Email::parse("ADA@example.com").unwrap();
        assert!(matches!(
            auth.sign_up(&upper, &password("secret2")).await,
            Err(AuthError::UserAlreadyExists)
        ));
        let other = Email::parse("bob@example.com").unwrap();
        assert!(matches!(
            auth.sign_up(&other, &password("123")).await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let auth = MemoryAuth::new();
        let created = auth.sign_up(&email(), &password("secret1")).await.unwrap();
        auth.sign_out().await.unwrap();
        assert!(auth.current_user().is_none());

        assert!(matches!(
            auth.sign_in(&email(), &password("wrong-one")).await,
            Err(AuthError::InvalidCredentials)
        ));
        let user = auth.sign_in(&email(), &password("secret1")).await.unwrap();
        assert_eq!(user.uid, created.uid);
    }

    #[tokio::test]
    async fn test_delete_account_requires_session() {
        let auth = MemoryAuth::new();
        assert!(matches!(
            auth.delete_account().await,
            Err(AuthError::NotSignedIn)
        ));

        auth.sign_up(&email(), &password("secret1")).await.unwrap();
        auth.delete_account().await.unwrap();
        assert!(auth.current_user().is_none());
        assert!(matches!(
            auth.sign_in(&email(), &password("secret1")).await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
