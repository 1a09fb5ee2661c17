//! Account management.

use tracing::info;

use fakestore_core::UserProfile;
use fakestore_storefront::services::Registration;
use fakestore_storefront::state::AppState;

use super::{CommandError, Credentials};

/// Create an account for the given credentials.
///
/// # Errors
///
/// Returns an error if credentials are missing or registration fails.
pub async fn register(
    state: &AppState,
    credentials: &Credentials,
    name: &str,
) -> Result<(), CommandError> {
    let form = Registration {
        name: name.to_string(),
        email: credentials.email()?.to_string(),
        password: credentials.password()?,
    };
    let user = state.accounts().register(&form).await?;
    info!(uid = %user.uid, "Account created for {}", user.email);
    Ok(())
}

/// Print the profile.
///
/// # Errors
///
/// Returns an error if signing in fails or there is no profile.
pub async fn profile(state: &AppState, credentials: &Credentials) -> Result<(), CommandError> {
    let user = credentials.require(state).await?;
    let profile = state.accounts().profile(&user.uid).await?;
    show(&profile);
    Ok(())
}

/// Change the display name.
///
/// # Errors
///
/// Returns an error if signing in fails, the name is blank, or there is no
/// profile.
pub async fn rename(
    state: &AppState,
    credentials: &Credentials,
    name: &str,
) -> Result<(), CommandError> {
    let user = credentials.require(state).await?;
    let profile = state.accounts().update_name(&user.uid, name).await?;
    show(&profile);
    Ok(())
}

/// Delete the profile and the account.
///
/// # Errors
///
/// Returns an error if signing in or deletion fails.
pub async fn delete(state: &AppState, credentials: &Credentials) -> Result<(), CommandError> {
    let user = credentials.require(state).await?;
    state.accounts().delete_account().await?;
    info!(uid = %user.uid, "Account deleted");
    Ok(())
}

fn show(profile: &UserProfile) {
    info!("Name:    {}", profile.name);
    info!("Email:   {}", profile.email);
    info!("Joined:  {}", profile.created_at.format("%Y-%m-%d"));
}
