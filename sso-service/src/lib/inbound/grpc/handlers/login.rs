use tonic::Status;

use super::require_id;
use super::require_non_empty;
use crate::domain::auth::models::AppId;
use crate::domain::auth::ports::AuthServicePort;
use crate::proto::LoginRequest;
use crate::proto::LoginResponse;

pub async fn login<S: AuthServicePort>(
    service: &S,
    request: LoginRequest,
) -> Result<LoginResponse, Status> {
    require_non_empty(&request.email, "email")?;
    require_non_empty(&request.password, "password")?;
    require_id(i64::from(request.app_id), "app_id")?;

    let token = service
        .login(&request.email, &request.password, AppId(request.app_id))
        .await?;

    Ok(LoginResponse { token })
}
