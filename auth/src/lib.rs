//! Authentication utilities library
//!
//! Provides the credential primitives behind the SSO service:
//! - Password hashing (Argon2id, tunable cost)
//! - JWT encoding and decoding (HS256)
//! - App-scoped token issuance
//!
//! Nothing here performs I/O; storage and transport live in the service.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Issuing Tokens
//! ```
//! use auth::{Claims, JwtHandler, TokenIssuer};
//! use chrono::Duration;
//!
//! let issuer = TokenIssuer::new(Duration::hours(1)).unwrap();
//! let token = issuer.issue(1, "a@x.com", 1, b"app_secret").unwrap();
//!
//! // A service accepting the token verifies it with the same app secret
//! let claims: Claims = JwtHandler::new(b"app_secret").decode(&token).unwrap();
//! assert_eq!(claims.sub, 1);
//! ```

pub mod issuer;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use issuer::TokenIssuer;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::PasswordError;
pub use password::PasswordHasher;
