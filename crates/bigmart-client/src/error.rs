//! # Client Error Types
//!
//! Errors raised at the store and auth boundaries, and the notification the
//! screen shows for them.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in BigMart                                │
//! │                                                                         │
//! │  Form submit / store call / auth call                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Validation failed? ── CoreError::Validation ──┐   (nothing written)    │
//! │         │                                      │                        │
//! │         ▼                                      ▼                        │
//! │  Store failed? ─────── StoreError ──────► ClientError ──► Notice        │
//! │         │                                      ▲         {title,        │
//! │         ▼                                      │          message}      │
//! │  Auth failed? ──────── AuthError ──────────────┘                        │
//! │                                                                         │
//! │  No retry, no backoff, no queue: the message is shown verbatim and      │
//! │  the view state stays as it was.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bigmart_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

// =============================================================================
// Store Error
// =============================================================================

/// Remote collection store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Security rules rejected the operation.
    #[error("Permission denied at '{path}'")]
    PermissionDenied { path: String },

    /// Path is empty or malformed.
    #[error("Invalid path: '{0}'")]
    InvalidPath(String),

    /// A payload had the wrong shape (e.g. a non-object partial update).
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The store side of a subscription is gone.
    #[error("Subscription to '{0}' closed")]
    SubscriptionClosed(String),

    /// Encoding or decoding a document failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

// =============================================================================
// Auth Error
// =============================================================================

/// Email/password authentication failures.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("The email address is badly formatted.")]
    InvalidEmail,

    #[error("Password should be at least {min} characters.")]
    WeakPassword { min: usize },

    #[error("The email address is already in use by another account.")]
    EmailAlreadyInUse,

    #[error("There is no user record corresponding to this email.")]
    UserNotFound,

    #[error("The password is invalid.")]
    WrongPassword,

    /// The auth service cannot be reached.
    #[error("Auth service unavailable: {0}")]
    Unavailable(String),

    /// Hashing or session bookkeeping failed.
    #[error("Internal auth error: {0}")]
    Internal(String),
}

// =============================================================================
// Client Error
// =============================================================================

/// Unified error type for everything a screen controller calls.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("{0}")]
    Store(#[from] StoreError),

    /// Auth failure outside sign-in and sign-up (e.g. sign-out).
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Sign-in failed.
    #[error("{0}")]
    Login(AuthError),

    /// Sign-up failed.
    #[error("{0}")]
    Signup(AuthError),

    /// A stored document does not decode into its entity type.
    #[error("Malformed document at '{path}': {reason}")]
    Decode { path: String, reason: String },

    /// Configuration could not be loaded or is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Store(StoreError::from(err))
    }
}

impl ClientError {
    /// Title of the alert shown for this error.
    pub fn title(&self) -> &'static str {
        match self {
            ClientError::Login(_) => "Login Error",
            ClientError::Signup(_) => "Signup Error",
            _ => "Error",
        }
    }

    /// Message of the alert, shown verbatim.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Returns true if the failure happened before anything was written.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Core(CoreError::Validation(_)))
    }

    pub fn notice(&self) -> Notice {
        Notice {
            title: self.title().to_string(),
            message: self.user_message(),
        }
    }
}

/// What the screen's alert displays.
///
/// ```json
/// { "title": "Login Error", "message": "The password is invalid." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_titles() {
        assert_eq!(ClientError::Login(AuthError::WrongPassword).title(), "Login Error");
        assert_eq!(ClientError::Signup(AuthError::InvalidEmail).title(), "Signup Error");
        assert_eq!(ClientError::Auth(AuthError::UserNotFound).title(), "Error");
        assert_eq!(
            ClientError::Store(StoreError::Unavailable("offline".into())).title(),
            "Error"
        );
    }

    #[test]
    fn test_messages_are_verbatim() {
        let err = ClientError::Signup(AuthError::WeakPassword { min: 6 });
        assert_eq!(err.user_message(), "Password should be at least 6 characters.");

        let err: ClientError = ValidationError::Incomplete(
            "Please select a product and enter quantity.".to_string(),
        )
        .into();
        assert!(err.is_validation());
        assert_eq!(
            err.notice(),
            Notice {
                title: "Error".to_string(),
                message: "Please select a product and enter quantity.".to_string(),
            }
        );
    }

    #[test]
    fn test_store_error_converts() {
        let err: ClientError = StoreError::PermissionDenied {
            path: "sales".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Permission denied at 'sales'");
        assert!(!err.is_validation());
    }
}
