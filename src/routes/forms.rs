//! Form relay endpoints
//!
//! Lets a browser app fetch and submit a form without ever holding the
//! access credential.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::check_path_segment;
use crate::error::RelayError;
use crate::models::{ErrorResponse, FormDefinition, RelaySubmitRequest};
use crate::RelayState;

/// Form routes, nested under `/api`
pub fn router() -> Router<Arc<RelayState>> {
    Router::new()
        .route("/getHubSpotForm", get(get_form))
        .route("/postHubSpotForm", post(post_form))
}

/// Query of `GET /api/getHubSpotForm`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormQuery {
    form_id: Option<String>,
}

impl RelayState {
    /// Requested id, checked before it reaches an upstream URL, or the
    /// configured contact form
    fn form_id_or_default(&self, requested: Option<String>) -> Result<String, RelayError> {
        let requested = match requested.map(|id| id.trim().to_string()) {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(self.config.form_id.clone()),
        };

        check_path_segment(&requested).map_err(|reason| RelayError::InvalidFormId {
            form_id: requested.clone(),
            reason,
        })?;
        Ok(requested)
    }
}

/// Fetch a form definition
#[utoipa::path(
    get,
    path = "/api/getHubSpotForm",
    params(
        ("formId" = Option<String>, Query, description = "Form to fetch; defaults to the contact form")
    ),
    responses(
        (status = 200, description = "Form definition", body = FormDefinition),
        (status = 400, description = "Form id is not a single path segment", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "forms"
)]
pub async fn get_form(
    State(state): State<Arc<RelayState>>,
    Query(query): Query<FormQuery>,
) -> Result<Json<FormDefinition>, RelayError> {
    let form_id = state.form_id_or_default(query.form_id)?;
    let definition = state
        .hubspot
        .fetch_form(&form_id, &state.config.api_token)
        .await?;

    info!(%form_id, groups = definition.field_groups.len(), "form fetched");
    Ok(Json(definition))
}

/// Submit normalized fields; the upstream response is passed through
#[utoipa::path(
    post,
    path = "/api/postHubSpotForm",
    request_body = RelaySubmitRequest,
    responses(
        (status = 200, description = "Upstream response, unchanged"),
        (status = 400, description = "Form id is not a single path segment", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "forms"
)]
pub async fn post_form(
    State(state): State<Arc<RelayState>>,
    Json(request): Json<RelaySubmitRequest>,
) -> Result<Json<Value>, RelayError> {
    let form_id = state.form_id_or_default(request.form_id)?;
    let upstream = state
        .hubspot
        .post_submission(&state.config.portal_id, &form_id, &request.fields)
        .await?;

    info!(%form_id, fields = request.fields.len(), "form submitted");
    Ok(Json(upstream))
}
