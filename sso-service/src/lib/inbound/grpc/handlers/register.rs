use tonic::Status;

use super::require_non_empty;
use crate::domain::auth::models::EmailAddress;
use crate::domain::auth::models::RegisterUserCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::proto::RegisterRequest;
use crate::proto::RegisterResponse;

pub async fn register<S: AuthServicePort>(
    service: &S,
    request: RegisterRequest,
) -> Result<RegisterResponse, Status> {
    require_non_empty(&request.email, "email")?;
    require_non_empty(&request.password, "password")?;

    let email = EmailAddress::new(request.email)
        .map_err(|e| Status::invalid_argument(e.to_string()))?;

    let user_id = service
        .register_new_user(RegisterUserCommand::new(email, request.password))
        .await?;

    Ok(RegisterResponse { user_id: user_id.0 })
}
