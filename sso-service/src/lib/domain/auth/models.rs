use std::fmt;
use std::str::FromStr;

use crate::domain::auth::errors::EmailError;

/// Registered user as stored by the credential store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Argon2id PHC string, never the plaintext password
    pub password_hash: String,
}

/// Client application sharing the identity store.
///
/// Provisioned outside this service; read-only here.
#[derive(Debug, Clone)]
pub struct App {
    pub id: AppId,
    pub name: String,
    /// Signing secret for tokens issued to this application
    pub secret: String,
}

/// User identifier, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Application identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppId(pub i32);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// The address is kept verbatim; no case folding is applied.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Validated EmailAddress value object
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Command to register a new user
#[derive(Debug)]
pub struct RegisterUserCommand {
    pub email: EmailAddress,
    pub password: String,
}

impl RegisterUserCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password` - Plain text password (will be hashed by service)
    pub fn new(email: EmailAddress, password: String) -> Self {
        Self { email, password }
    }
}
