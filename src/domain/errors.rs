//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Required field missing or malformed; raised before any store call.
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("You must be signed in to do that")]
    Unauthenticated,

    #[error("Session error: {0}")]
    Session(String),

    #[error("Input error: {0}")]
    Input(String),
}

impl DomainError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Identity provider rejections.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("password should be at least {min_len} characters")]
    WeakPassword { min_len: usize },

    #[error("email address is badly formatted")]
    InvalidEmail,

    #[error("{0}")]
    Provider(String),
}
