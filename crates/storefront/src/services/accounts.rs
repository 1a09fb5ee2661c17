//! Account registration, sign-in and profile management.

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use fakestore_core::{DocumentId, Email, UserId, UserProfile};

use crate::auth::{AuthProvider, AuthUser, validate_password};
use crate::documents::{DocumentError, DocumentStore, collections, to_fields};
use crate::error::{Result, StoreError, clear_sentry_user, set_sentry_user};

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// Account operations over auth and the `users` collection.
#[derive(Clone)]
pub struct AccountService {
    documents: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { documents, auth }
    }

    fn profile_id(uid: &UserId) -> DocumentId {
        DocumentId::new(uid.as_str())
    }

    /// Create an account and its profile document, leaving the user signed in.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for a blank name, malformed email or
    /// short password; auth errors such as `UserAlreadyExists`; or a store
    /// error if the profile cannot be written.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<AuthUser> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("name is required".to_string()));
        }
        let email = Email::parse(&form.email)?;
        validate_password(&form.password)?;

        let user = self.auth.sign_up(&email, &form.password).await?;
        let profile = UserProfile::new(email, name, Utc::now());
        self.documents
            .set(
                collections::USERS,
                &Self::profile_id(&user.uid),
                to_fields(&profile)?,
            )
            .await?;

        set_sentry_user(&user.uid, Some(user.email.as_str()));
        info!(uid = %user.uid, "Registered");
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for a malformed email, or the auth
    /// error reported by the provider.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<AuthUser> {
        let email = Email::parse(email)?;
        let user = self.auth.sign_in(&email, password).await?;
        set_sentry_user(&user.uid, Some(user.email.as_str()));
        info!(uid = %user.uid, "Signed in");
        Ok(user)
    }

    /// Sign out.
    ///
    /// # Errors
    ///
    /// Returns the auth error reported by the provider.
    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await?;
        clear_sentry_user();
        info!("Signed out");
        Ok(())
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user()
    }

    /// Load a profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no profile exists, or a store error.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn profile(&self, uid: &UserId) -> Result<UserProfile> {
        let doc = self
            .documents
            .get(collections::USERS, &Self::profile_id(uid))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("profile for {uid}")))?;
        Ok(doc.decode()?)
    }

    /// Change the display name and stamp `updatedAt`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for a blank name, `StoreError::NotFound`
    /// if no profile exists, or a store error.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn update_name(&self, uid: &UserId, name: &str) -> Result<UserProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("name is required".to_string()));
        }

        let mut profile = self.profile(uid).await?;
        profile.rename(name, Utc::now());

        let mut fields = to_fields(&profile)?;
        fields.retain(|key, _| key == "name" || key == "updatedAt");
        self.documents
            .update(collections::USERS, &Self::profile_id(uid), fields)
            .await
            .map_err(|e| match e {
                DocumentError::NotFound(what) => StoreError::NotFound(what),
                other => other.into(),
            })?;
        Ok(profile)
    }

    /// Delete the signed-in account: profile document first, then the auth
    /// account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` without a session, or the first
    /// failing remote call.
    #[instrument(skip(self))]
    pub async fn delete_account(&self) -> Result<()> {
        let user = self
            .auth
            .current_user()
            .ok_or(crate::auth::AuthError::NotSignedIn)?;

        if let Err(e) = self
            .documents
            .delete(collections::USERS, &Self::profile_id(&user.uid))
            .await
        {
            warn!(uid = %user.uid, error = %e, "Failed to delete profile");
            return Err(e.into());
        }
        self.auth.delete_account().await?;
        clear_sentry_user();
        info!(uid = %user.uid, "Account deleted");
        Ok(())
    }
}
