//! Contact Form Relay
//!
//! Renders a HubSpot form schema, collects input, and relays submissions to
//! the HubSpot forms ingestion API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         PRESENTATION SHELL                           │
//! │   load ─► render ─► collect ─► normalize ─► submit ─► show result    │
//! └───────────────┬───────────────────────────────────────┬──────────────┘
//!                 │ FormsGateway                          │
//!        ┌────────▼────────┐                     ┌────────▼────────┐
//!        │  DirectGateway  │                     │   RelayClient   │
//!        │ (server-render) │                     │  (single page)  │
//!        └────────┬────────┘                     └────────┬────────┘
//!                 │                                       │ /api/*
//!                 │                              ┌────────▼────────┐
//!                 │                              │  Relay (axum)   │
//!                 │                              │  CORS: 1 origin │
//!                 │                              └────────┬────────┘
//!        ┌────────▼───────────────────────────────────────▼────────┐
//!        │                      HubSpotClient                      │
//!        │  GET  /marketing/v3/forms/{formId}        (Bearer)      │
//!        │  POST /submissions/v3/integration/submit/{acct}/{form}  │
//!        └─────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gateway;
pub mod hubspot;
pub mod models;
pub mod normalize;
pub mod render;
pub mod routes;
pub mod shell;

use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

pub use config::{ConfigArgs, RelayConfig};
pub use error::{CollectError, ConfigError, FetchError, RelayError, ShellError, SubmitError};
pub use gateway::{DirectGateway, FormsGateway, RelayClient};
pub use hubspot::HubSpotClient;
pub use models::*;
pub use normalize::{normalize, RawFieldValue, RawFieldValues};
pub use shell::{FormShell, ShellState};

/// Relay state, shared read-only by every request
pub struct RelayState {
    /// Validated startup configuration
    pub config: RelayConfig,
    /// Upstream client, one connection pool for all requests
    pub hubspot: HubSpotClient,
    /// Reported by `/health`
    pub started_at: DateTime<Utc>,
}

impl RelayState {
    /// Build the upstream client for `config`
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let hubspot = HubSpotClient::from_config(&config)?;
        Ok(Self {
            config,
            hubspot,
            started_at: Utc::now(),
        })
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Contact Form Relay",
        version = "0.1.0",
        description = "Fetches HubSpot form definitions and relays submissions"
    ),
    paths(
        routes::health::health_check,
        routes::forms::get_form,
        routes::forms::post_form,
    ),
    components(
        schemas(
            FormDefinition, NormalizedField, RelaySubmitRequest, ErrorResponse,
            routes::health::HealthResponse
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "forms", description = "Form fetch and submission relay")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Browser access limited to the one configured origin
pub fn cors_layer(config: &RelayConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(config.allowed_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

/// Build the relay router
pub fn build_router(state: RelayState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", routes::forms::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
