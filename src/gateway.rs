//! Gateways the Presentation Shell talks through
//!
//! [`DirectGateway`] calls the HubSpot APIs itself (server-rendered variant).
//! [`RelayClient`] goes through the relay endpoints (single-page variant).

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::RelayConfig;
use crate::error::{FetchError, SubmitError};
use crate::hubspot::{read_json_body, HubSpotClient};
use crate::models::{upstream_message, FormDefinition, NormalizedField, RelaySubmitRequest, SubmissionResult};

/// Form Fetcher + Form Submitter as seen by the shell
#[async_trait]
pub trait FormsGateway: Send + Sync {
    /// Load the definition of `form_id`
    async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, FetchError>;

    /// Submit normalized fields for `form_id`. Never fails.
    async fn submit_fields(&self, form_id: &str, fields: &[NormalizedField]) -> SubmissionResult;
}

#[async_trait]
impl<G: FormsGateway + ?Sized> FormsGateway for Box<G> {
    async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, FetchError> {
        (**self).fetch_form(form_id).await
    }

    async fn submit_fields(&self, form_id: &str, fields: &[NormalizedField]) -> SubmissionResult {
        (**self).submit_fields(form_id, fields).await
    }
}

/// Calls the HubSpot APIs with the configured credential and account
pub struct DirectGateway {
    client: HubSpotClient,
    credential: String,
    account_id: String,
}

impl DirectGateway {
    /// Use the credential and account of `config`
    pub fn new(client: HubSpotClient, config: &RelayConfig) -> Self {
        Self {
            client,
            credential: config.api_token.clone(),
            account_id: config.portal_id.clone(),
        }
    }
}

#[async_trait]
impl FormsGateway for DirectGateway {
    async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, FetchError> {
        self.client.fetch_form(form_id, &self.credential).await
    }

    async fn submit_fields(&self, form_id: &str, fields: &[NormalizedField]) -> SubmissionResult {
        self.client.submit(&self.account_id, form_id, fields).await
    }
}

/// Client of a running relay
pub struct RelayClient {
    client: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    /// `base_url` is the relay root, e.g. `http://localhost:8888`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post_form(&self, form_id: &str, fields: &[NormalizedField]) -> Result<(), SubmitError> {
        let url = format!("{}/api/postHubSpotForm", self.base_url);
        let request = RelaySubmitRequest {
            form_id: Some(form_id.to_string()),
            fields: fields.to_vec(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = read_json_body(response).await;
        Err(SubmitError::Rejected {
            status: status.as_u16(),
            message: upstream_message(&body),
        })
    }
}

#[async_trait]
impl FormsGateway for RelayClient {
    async fn fetch_form(&self, form_id: &str) -> Result<FormDefinition, FetchError> {
        let url = format!("{}/api/getHubSpotForm", self.base_url);
        let response = self.client.get(&url).query(&[("formId", form_id)]).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_json_body(response).await;
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: upstream_message(&body).unwrap_or_else(|| status.to_string()),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        serde_json::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn submit_fields(&self, form_id: &str, fields: &[NormalizedField]) -> SubmissionResult {
        match self.post_form(form_id, fields).await {
            Ok(()) => SubmissionResult::Success,
            Err(err) => {
                warn!(form_id, error = %err, "relay submission failed");
                SubmissionResult::from(&err)
            }
        }
    }
}
