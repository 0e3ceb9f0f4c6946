use std::fmt;

use auth::JwtError;
use auth::PasswordError;
use thiserror::Error;

use crate::domain::auth::models::AppId;
use crate::domain::auth::models::UserId;

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Errors reported by credential store implementations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("User not found")]
    UserNotFound,

    #[error("App not found")]
    AppNotFound,

    #[error("Database error: {0}")]
    Database(String),
}

/// Faults that are not the caller's doing.
#[derive(Debug, Clone, Error)]
pub enum InternalError {
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Blocking task failed: {0}")]
    Blocking(String),
}

/// Logical operation an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    RegisterNewUser,
    IsAdmin,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Login => "auth.login",
            Operation::RegisterNewUser => "auth.register_new_user",
            Operation::IsAdmin => "auth.is_admin",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of an authentication failure.
#[derive(Debug, Clone, Error)]
pub enum AuthErrorKind {
    /// Unknown email or wrong password; the two are never distinguished.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("App not found: {0}")]
    AppNotFound(AppId),

    #[error("Internal error: {0}")]
    Internal(#[from] InternalError),
}

/// Top-level error for authentication operations.
///
/// Carries the failing operation alongside the classified cause.
#[derive(Debug, Clone, Error)]
#[error("{op}: {kind}")]
pub struct AuthError {
    pub op: Operation,
    #[source]
    pub kind: AuthErrorKind,
}

impl AuthError {
    pub fn new(op: Operation, kind: impl Into<AuthErrorKind>) -> Self {
        Self {
            op,
            kind: kind.into(),
        }
    }

    pub fn kind(&self) -> &AuthErrorKind {
        &self.kind
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.kind, AuthErrorKind::Internal(_))
    }
}
