use serde::Serialize;
use uuid::Uuid;

use crate::api::DataResponse;
use crate::auth::{RequireAuth, Role};

#[derive(Serialize)]
pub struct PrincipalResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub email: String,
}

/// GET /me
///
/// Echo of the authenticated principal, useful for client session checks.
pub async fn get_me(auth: RequireAuth) -> DataResponse<PrincipalResponse> {
    DataResponse::new(PrincipalResponse {
        user_id: auth.user_id,
        role: auth.role,
        email: auth.email.clone(),
    })
}
