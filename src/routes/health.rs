use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_ok = state.store.health().await;

    Json(HealthResponse {
        status: "ok",
        store: if store_ok { "ok" } else { "unavailable" },
    })
}
