use tonic::Status;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::AuthErrorKind;

pub mod is_admin;
pub mod login;
pub mod register;

/// Identifier value that proto3 uses for an unset integer field.
const EMPTY_ID: i64 = 0;

fn require_non_empty(value: &str, field: &str) -> Result<(), Status> {
    if value.is_empty() {
        return Err(Status::invalid_argument(format!("{} is required", field)));
    }
    Ok(())
}

fn require_id(value: i64, field: &str) -> Result<(), Status> {
    if value == EMPTY_ID {
        return Err(Status::invalid_argument(format!("{} is required", field)));
    }
    Ok(())
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        match err.kind() {
            AuthErrorKind::InvalidCredentials => Status::invalid_argument("invalid credentials"),
            AuthErrorKind::UserAlreadyExists(_) => Status::already_exists("user already exists"),
            AuthErrorKind::UserNotFound(_) => Status::not_found("user not found"),
            AuthErrorKind::AppNotFound(_) => Status::not_found("app not found"),
            AuthErrorKind::Internal(_) => {
                // Details stay in the server log
                tracing::error!(error = %err, "Request failed with internal error");
                Status::internal("internal error")
            }
        }
    }
}
