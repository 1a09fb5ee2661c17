//! Unified error handling with Sentry integration.
//!
//! Every service returns `Result<T, StoreError>`. Callers that need to decide
//! how to present a failure use [`StoreError::kind`]; callers that give up on
//! one call [`StoreError::report`] to capture it to Sentry.

use thiserror::Error;

use fakestore_core::{EmailError, ProductDraftError, ShippingInfoError};

use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::documents::DocumentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Remote catalog call failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Document store call failed.
    #[error("Document store error: {0}")]
    Documents(#[from] DocumentError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Input rejected before any remote call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Coarse failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote side could not be reached.
    NetworkFailure,
    /// The remote side answered with an error.
    ServiceError,
    /// Input was rejected.
    ValidationFailure,
    /// Missing or rejected credentials.
    AuthFailure,
}

impl StoreError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Catalog(e) if e.is_network() => ErrorKind::NetworkFailure,
            Self::Documents(e) if e.is_network() => ErrorKind::NetworkFailure,
            Self::Auth(e) if e.is_network() => ErrorKind::NetworkFailure,
            Self::Catalog(_) | Self::Documents(_) | Self::NotFound(_) => ErrorKind::ServiceError,
            Self::Auth(AuthError::Http(_) | AuthError::Service { .. }) => ErrorKind::ServiceError,
            Self::Auth(AuthError::InvalidEmail(_) | AuthError::WeakPassword(_))
            | Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::Auth(_) => ErrorKind::AuthFailure,
        }
    }

    /// Capture remote failures to Sentry and log them.
    ///
    /// Validation and auth failures are user errors and only logged at debug.
    pub fn report(&self) {
        match self.kind() {
            ErrorKind::NetworkFailure | ErrorKind::ServiceError => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Storefront operation failed"
                );
            }
            ErrorKind::ValidationFailure | ErrorKind::AuthFailure => {
                tracing::debug!(error = %self, "Storefront operation rejected");
            }
        }
    }
}

impl From<ShippingInfoError> for StoreError {
    fn from(err: ShippingInfoError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ProductDraftError> for StoreError {
    fn from(err: ProductDraftError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for StoreError {
    fn from(err: EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added product", Some(&[("product_id", "3")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("users/abc".to_string());
        assert_eq!(err.to_string(), "Not found: users/abc");

        let err = StoreError::from(ShippingInfoError::MissingField("city"));
        assert_eq!(err.to_string(), "Validation failed: city is required");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            StoreError::Validation("bad".to_string()).kind(),
            ErrorKind::ValidationFailure
        );
        assert_eq!(
            StoreError::Auth(AuthError::NotSignedIn).kind(),
            ErrorKind::AuthFailure
        );
        assert_eq!(
            StoreError::Auth(AuthError::WeakPassword("short".to_string())).kind(),
            ErrorKind::ValidationFailure
        );
        assert_eq!(
            StoreError::Documents(DocumentError::Unavailable("offline".to_string())).kind(),
            ErrorKind::NetworkFailure
        );
        assert_eq!(
            StoreError::Documents(DocumentError::Service {
                status: 403,
                message: "PERMISSION_DENIED".to_string()
            })
            .kind(),
            ErrorKind::ServiceError
        );
        assert_eq!(
            StoreError::Catalog(CatalogError::Status {
                status: 503,
                body: String::new()
            })
            .kind(),
            ErrorKind::ServiceError
        );
    }
}
