use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenIssuer;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::AuthErrorKind;
use crate::domain::auth::errors::InternalError;
use crate::domain::auth::errors::Operation;
use crate::domain::auth::errors::StorageError;
use crate::domain::auth::models::AppId;
use crate::domain::auth::models::RegisterUserCommand;
use crate::domain::auth::models::UserId;
use crate::domain::auth::ports::AppProvider;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::ports::UserProvider;
use crate::domain::auth::ports::UserSaver;

/// Domain service implementation for authentication operations.
///
/// Holds no state of its own; every call is answered from the injected
/// store capabilities, the password hasher and the token issuer.
pub struct AuthService<US, UP, AP>
where
    US: UserSaver,
    UP: UserProvider,
    AP: AppProvider,
{
    user_saver: Arc<US>,
    user_provider: Arc<UP>,
    app_provider: Arc<AP>,
    password_hasher: PasswordHasher,
    token_issuer: TokenIssuer,
}

impl<US, UP, AP> AuthService<US, UP, AP>
where
    US: UserSaver,
    UP: UserProvider,
    AP: AppProvider,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `user_saver` - Persists new users
    /// * `user_provider` - Reads users and admin flags
    /// * `app_provider` - Reads applications and their secrets
    /// * `password_hasher` - Hasher configured with the instance's cost
    /// * `token_issuer` - Issuer configured with the token lifetime
    ///
    /// # Returns
    /// Configured auth service instance
    pub fn new(
        user_saver: Arc<US>,
        user_provider: Arc<UP>,
        app_provider: Arc<AP>,
        password_hasher: PasswordHasher,
        token_issuer: TokenIssuer,
    ) -> Self {
        Self {
            user_saver,
            user_provider,
            app_provider,
            password_hasher,
            token_issuer,
        }
    }
}

fn internal(op: Operation, err: impl Into<InternalError>) -> AuthError {
    AuthError::new(op, AuthErrorKind::Internal(err.into()))
}

/// Run CPU-bound password work off the async workers.
async fn blocking<T, F>(op: Operation, f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(op = %op, error = %e, "Password task failed");
        internal(op, InternalError::Blocking(e.to_string()))
    })
}

#[async_trait]
impl<US, UP, AP> AuthServicePort for AuthService<US, UP, AP>
where
    US: UserSaver,
    UP: UserProvider,
    AP: AppProvider,
{
    async fn login(
        &self,
        email: &str,
        password: &str,
        app_id: AppId,
    ) -> Result<String, AuthError> {
        const OP: Operation = Operation::Login;
        tracing::info!(op = %OP, email, app_id = %app_id, "Attempting to login");

        let user = match self.user_provider.find_user_by_email(email).await {
            Ok(user) => user,
            Err(StorageError::UserNotFound) => {
                tracing::warn!(op = %OP, email, "User not found");
                let hasher = self.password_hasher.clone();
                let password = password.to_owned();
                blocking(OP, move || hasher.verify_dummy(&password)).await?;
                return Err(AuthError::new(OP, AuthErrorKind::InvalidCredentials));
            }
            Err(e) => {
                tracing::error!(op = %OP, email, error = %e, "Failed to get user");
                return Err(internal(OP, e));
            }
        };

        let hasher = self.password_hasher.clone();
        let candidate = password.to_owned();
        let stored_hash = user.password_hash.clone();
        let is_valid = blocking(OP, move || hasher.verify(&candidate, &stored_hash))
            .await?
            .map_err(|e| {
                tracing::error!(op = %OP, user_id = %user.id, error = %e, "Stored hash is unusable");
                internal(OP, e)
            })?;

        if !is_valid {
            tracing::warn!(op = %OP, email, "Invalid credentials");
            return Err(AuthError::new(OP, AuthErrorKind::InvalidCredentials));
        }

        let app = self
            .app_provider
            .find_app(app_id)
            .await
            .map_err(|e| match e {
                StorageError::AppNotFound => {
                    tracing::warn!(op = %OP, app_id = %app_id, "App not found");
                    AuthError::new(OP, AuthErrorKind::AppNotFound(app_id))
                }
                other => {
                    tracing::error!(op = %OP, app_id = %app_id, error = %other, "Failed to get app");
                    internal(OP, other)
                }
            })?;

        let token = self
            .token_issuer
            .issue(user.id.0, &user.email, app.id.0, app.secret.as_bytes())
            .map_err(|e| {
                tracing::error!(op = %OP, app_id = %app.id, error = %e, "Failed to generate token");
                internal(OP, e)
            })?;

        tracing::info!(op = %OP, user_id = %user.id, app_id = %app.id, "User logged in successfully");

        Ok(token)
    }

    async fn register_new_user(&self, command: RegisterUserCommand) -> Result<UserId, AuthError> {
        const OP: Operation = Operation::RegisterNewUser;
        let email = command.email.as_str();
        tracing::info!(op = %OP, email, "Registering user");

        let hasher = self.password_hasher.clone();
        let password = command.password.clone();
        let password_hash = blocking(OP, move || hasher.hash(&password))
            .await?
            .map_err(|e| {
                tracing::error!(op = %OP, error = %e, "Failed to hash password");
                internal(OP, e)
            })?;

        let user_id = self
            .user_saver
            .save_user(&command.email, &password_hash)
            .await
            .map_err(|e| match e {
                StorageError::UserExists(existing) => {
                    tracing::warn!(op = %OP, email = %existing, "User already exists");
                    AuthError::new(OP, AuthErrorKind::UserAlreadyExists(existing))
                }
                other => {
                    tracing::error!(op = %OP, error = %other, "Failed to save user");
                    internal(OP, other)
                }
            })?;

        tracing::info!(op = %OP, user_id = %user_id, "User registered");

        Ok(user_id)
    }

    async fn is_admin(&self, user_id: UserId) -> Result<bool, AuthError> {
        const OP: Operation = Operation::IsAdmin;
        tracing::info!(op = %OP, user_id = %user_id, "Checking if user is admin");

        let is_admin = self
            .user_provider
            .is_admin(user_id)
            .await
            .map_err(|e| match e {
                StorageError::UserNotFound => {
                    tracing::warn!(op = %OP, user_id = %user_id, "User not found");
                    AuthError::new(OP, AuthErrorKind::UserNotFound(user_id))
                }
                other => {
                    tracing::error!(op = %OP, user_id = %user_id, error = %other, "Failed to get admin flag");
                    internal(OP, other)
                }
            })?;

        tracing::info!(op = %OP, user_id = %user_id, is_admin, "Checked if user is admin");

        Ok(is_admin)
    }
}
