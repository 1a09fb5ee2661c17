//! Firebase Identity Toolkit REST client.
//!
//! Uses `accounts:signUp`, `accounts:signInWithPassword` and `accounts:delete`.
//! Error codes come back as the `error.message` string (`EMAIL_EXISTS`,
//! `WEAK_PASSWORD : ...`) and are mapped onto [`AuthError`].

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, instrument, warn};
use url::Url;

use fakestore_core::{Email, UserId};

use super::{AuthError, AuthProvider, AuthUser, Session, validate_password};
use crate::config::FirebaseConfig;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1/";

/// Auth provider backed by Firebase Authentication.
#[derive(Debug)]
pub struct IdentityToolkitAuth {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    session: Session,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
    local_id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl IdentityToolkitAuth {
    /// Create a provider for the configured project.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let base_url = Url::parse(IDENTITY_TOOLKIT_URL)
            .unwrap_or_else(|_| unreachable!("identity toolkit url is valid"));
        Self::with_base_url(config, base_url)
    }

    /// Create a provider against a different endpoint (emulators, tests).
    #[must_use]
    pub fn with_base_url(config: &FirebaseConfig, base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            session: Session::new(),
        }
    }

    fn endpoint(&self, method: &str) -> Result<Url, AuthError> {
        let mut url = self
            .base_url
            .join(&format!("./accounts:{method}"))
            .map_err(|e| AuthError::Rejected(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        let response = self
            .client
            .post(self.endpoint(method)?)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text).map_err(|e| AuthError::Service {
                status: status.as_u16(),
                message: e.to_string(),
            });
        }

        match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => Err(map_error_code(&envelope.error.message)),
            Err(_) => Err(AuthError::Service {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            }),
        }
    }

    async fn exchange(
        &self,
        method: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, AuthError> {
        let body = json!({
            "email": email.as_str(),
            "password": password.expose_secret(),
            "returnSecureToken": true,
        });
        let value = self.call(method, body).await?;
        let token: TokenResponse =
            serde_json::from_value(value).map_err(|e| AuthError::Service {
                status: 200,
                message: e.to_string(),
            })?;

        let email = match token.email.as_deref() {
            Some(returned) => Email::parse(returned)?,
            None => email.clone(),
        };
        let user = AuthUser {
            uid: UserId::new(token.local_id),
            email,
            id_token: Some(SecretString::from(token.id_token)),
        };
        self.session.set(Some(user.clone()));
        Ok(user)
    }
}

/// Map an Identity Toolkit error code onto [`AuthError`].
fn map_error_code(message: &str) -> AuthError {
    let (code, detail) = message
        .split_once(" : ")
        .map_or((message, None), |(code, detail)| (code, Some(detail)));

    match code.trim() {
        "EMAIL_EXISTS" => AuthError::UserAlreadyExists,
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthError::UserNotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredentials,
        "WEAK_PASSWORD" => AuthError::WeakPassword(
            detail.unwrap_or("password is too weak").to_string(),
        ),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" => AuthError::NotSignedIn,
        _ => AuthError::Rejected(message.to_string()),
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitAuth {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, AuthError> {
        validate_password(password)?;
        let user = self.exchange("signUp", email, password).await?;
        info!(uid = %user.uid, "Account created");
        Ok(user)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthUser, AuthError> {
        self.exchange("signInWithPassword", email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.set(None);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_account(&self) -> Result<(), AuthError> {
        let user = self.session.current().ok_or(AuthError::NotSignedIn)?;
        let Some(token) = user.id_token.as_ref() else {
            warn!(uid = %user.uid, "Session has no ID token");
            return Err(AuthError::NotSignedIn);
        };
        self.call("delete", json!({ "idToken": token.expose_secret() }))
            .await?;
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
