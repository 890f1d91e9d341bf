//! Liveness of the relay

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::RelayState;

/// Relay liveness report
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `healthy` when the relay answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Form served when a request names none
    pub default_form_id: String,
    /// When the relay started
    pub started_at: DateTime<Utc>,
    /// Whole seconds since start
    pub uptime_secs: i64,
}

/// Report liveness. Does not call HubSpot.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Relay is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<Arc<RelayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        default_form_id: state.config.form_id.clone(),
        started_at: state.started_at,
        uptime_secs: (Utc::now() - state.started_at).num_seconds().max(0),
    })
}
