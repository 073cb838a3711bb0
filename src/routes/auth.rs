//! Authentication routes
//!
//! Registration and login are delegated to the external identity service,
//! which owns credential storage and token issuance. These handlers forward
//! the request body and relay the response verbatim.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::app::AppState;
use crate::error::ApiError;

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    proxy(&state, "register", body).await
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    proxy(&state, "login", body).await
}

async fn proxy(state: &AppState, action: &str, body: serde_json::Value) -> Result<Response, ApiError> {
    let url = format!(
        "{}/{}",
        state.settings.identity_service_url.trim_end_matches('/'),
        action
    );

    let response = state
        .http_client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| ApiError::internal(format!("Identity service unreachable: {e}")))?;

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let payload: serde_json::Value = response
        .json()
        .await
        .map_err(|e| ApiError::internal(format!("Invalid identity service response: {e}")))?;

    Ok((status, Json(payload)).into_response())
}
