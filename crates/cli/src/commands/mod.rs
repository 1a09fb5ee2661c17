//! Subcommand implementations.
//!
//! Output goes through `tracing` at info level so it shares the Sentry
//! breadcrumb trail with the storefront library.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod products;

use secrecy::{ExposeSecret, SecretString};

use fakestore_core::Product;
use fakestore_storefront::auth::AuthUser;
use fakestore_storefront::error::StoreError;
use fakestore_storefront::services::Registration;
use fakestore_storefront::state::AppState;

/// Errors from running a command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("an account email is required (--email or FAKESTORE_EMAIL)")]
    MissingEmail,
    #[error("a password is required (--password or FAKESTORE_PASSWORD)")]
    MissingPassword,
    #[error("product {0} not found")]
    UnknownProduct(i32),
}

impl CommandError {
    /// Send store failures worth alerting on to Sentry.
    pub fn report(&self) {
        if let Self::Store(e) = self {
            e.report();
        }
    }
}

/// Account credentials from the global flags.
pub struct Credentials {
    email: Option<String>,
    password: Option<SecretString>,
    create: bool,
}

impl Credentials {
    #[must_use]
    pub fn new(email: Option<String>, password: Option<String>, create: bool) -> Self {
        Self {
            email,
            password: password.map(SecretString::from),
            create,
        }
    }

    /// Sign in (or register with `--create-account`) when an email was given.
    ///
    /// # Errors
    ///
    /// Returns `MissingPassword` if an email was given without a password,
    /// or the store error from signing in.
    pub async fn sign_in(&self, state: &AppState) -> Result<Option<AuthUser>, CommandError> {
        let Some(email) = &self.email else {
            return Ok(None);
        };
        let password = self.password()?;
        let accounts = state.accounts();

        let user = if self.create {
            let name = email.split('@').next().unwrap_or(email).to_string();
            accounts
                .register(&Registration {
                    name,
                    email: email.clone(),
                    password,
                })
                .await?
        } else {
            accounts.sign_in(email, &password).await?
        };
        Ok(Some(user))
    }

    /// Like [`Self::sign_in`], but an email is mandatory.
    ///
    /// # Errors
    ///
    /// Returns `MissingEmail` when no email was given.
    pub async fn require(&self, state: &AppState) -> Result<AuthUser, CommandError> {
        self.sign_in(state).await?.ok_or(CommandError::MissingEmail)
    }

    fn email(&self) -> Result<&str, CommandError> {
        self.email.as_deref().ok_or(CommandError::MissingEmail)
    }

    fn password(&self) -> Result<SecretString, CommandError> {
        self.password
            .as_ref()
            .map(|p| SecretString::from(p.expose_secret().to_owned()))
            .ok_or(CommandError::MissingPassword)
    }
}

fn product_line(product: &Product) -> String {
    format!(
        "#{:<5} {:<40} {:>9}  [{}]",
        product.id.as_i32(),
        product.title,
        fakestore_core::format_usd(product.price),
        product.category
    )
}
