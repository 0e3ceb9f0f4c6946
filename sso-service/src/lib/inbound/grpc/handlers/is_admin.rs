use tonic::Status;

use super::require_id;
use crate::domain::auth::models::UserId;
use crate::domain::auth::ports::AuthServicePort;
use crate::proto::IsAdminRequest;
use crate::proto::IsAdminResponse;

pub async fn is_admin<S: AuthServicePort>(
    service: &S,
    request: IsAdminRequest,
) -> Result<IsAdminResponse, Status> {
    require_id(request.user_id, "user_id")?;

    let is_admin = service.is_admin(UserId(request.user_id)).await?;

    Ok(IsAdminResponse { is_admin })
}
