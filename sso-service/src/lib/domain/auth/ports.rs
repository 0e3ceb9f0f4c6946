use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::StorageError;
use crate::domain::auth::models::App;
use crate::domain::auth::models::AppId;
use crate::domain::auth::models::EmailAddress;
use crate::domain::auth::models::RegisterUserCommand;
use crate::domain::auth::models::User;
use crate::domain::auth::models::UserId;

/// Port for authentication service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Verify credentials and issue an access token for an application.
    ///
    /// # Arguments
    /// * `email` - User email
    /// * `password` - Plaintext password
    /// * `app_id` - Application the token is issued for
    ///
    /// # Returns
    /// Signed token string
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    /// * `AppNotFound` - No application with this identifier
    /// * `Internal` - Store, hashing or signing failure
    async fn login(&self, email: &str, password: &str, app_id: AppId)
        -> Result<String, AuthError>;

    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Validated email and plaintext password
    ///
    /// # Returns
    /// Identifier assigned to the new user
    ///
    /// # Errors
    /// * `UserAlreadyExists` - Email is already registered
    /// * `Internal` - Hashing or store failure
    async fn register_new_user(&self, command: RegisterUserCommand) -> Result<UserId, AuthError>;

    /// Check whether a user has the admin flag.
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this identifier
    /// * `Internal` - Store failure
    async fn is_admin(&self, user_id: UserId) -> Result<bool, AuthError>;
}

/// Persists new users.
#[async_trait]
pub trait UserSaver: Send + Sync + 'static {
    /// Insert a user record atomically.
    ///
    /// # Arguments
    /// * `email` - Unique email
    /// * `password_hash` - Hash produced by the password hasher
    ///
    /// # Returns
    /// Store-assigned user identifier
    ///
    /// # Errors
    /// * `UserExists` - Email uniqueness conflict
    /// * `Database` - Any other store failure
    async fn save_user(
        &self,
        email: &EmailAddress,
        password_hash: &str,
    ) -> Result<UserId, StorageError>;
}

/// Reads users and their admin flag.
#[async_trait]
pub trait UserProvider: Send + Sync + 'static {
    /// Retrieve user by email.
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this email
    /// * `Database` - Store failure
    async fn find_user_by_email(&self, email: &str) -> Result<User, StorageError>;

    /// Retrieve the admin flag of a user.
    ///
    /// # Errors
    /// * `UserNotFound` - No user with this identifier
    /// * `Database` - Store failure
    async fn is_admin(&self, user_id: UserId) -> Result<bool, StorageError>;
}

/// Reads client applications.
#[async_trait]
pub trait AppProvider: Send + Sync + 'static {
    /// Retrieve application by identifier.
    ///
    /// # Errors
    /// * `AppNotFound` - No application with this identifier
    /// * `Database` - Store failure
    async fn find_app(&self, app_id: AppId) -> Result<App, StorageError>;
}
