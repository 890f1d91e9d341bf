//! HubSpot API client
//!
//! Form Fetcher and Form Submitter. One attempt per call, no caching,
//! no retries.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::RelayConfig;
use crate::error::{FetchError, SubmitError};
use crate::models::{upstream_message, FormDefinition, NormalizedField, SubmissionPayload, SubmissionResult};

/// Client for the form schema and form submission APIs
#[derive(Clone, Debug)]
pub struct HubSpotClient {
    client: reqwest::Client,
    forms_api_url: String,
    submit_api_url: String,
}

impl HubSpotClient {
    /// Create a client for the given API base URLs
    pub fn new(
        forms_api_url: &str,
        submit_api_url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            forms_api_url: forms_api_url.trim_end_matches('/').to_string(),
            submit_api_url: submit_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client for the configured URLs and timeout
    pub fn from_config(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.forms_api_url, &config.submit_api_url, config.timeout)
    }

    /// Fetch the definition of `form_id`, always bypassing caches
    pub async fn fetch_form(&self, form_id: &str, credential: &str) -> Result<FormDefinition, FetchError> {
        let url = format!("{}/{}", self.forms_api_url, form_id);
        debug!(%url, "fetching form schema");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", credential))
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| upstream_message(&body))
                .unwrap_or(text);
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let schema: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(FormDefinition::from_schema(&schema))
    }

    /// Post `fields` and hand back whatever JSON the upstream answered with
    pub async fn post_submission(
        &self,
        account_id: &str,
        form_id: &str,
        fields: &[NormalizedField],
    ) -> Result<Value, SubmitError> {
        let url = format!("{}/{}/{}", self.submit_api_url, account_id, form_id);
        debug!(%url, fields = fields.len(), "posting form submission");

        let response = self
            .client
            .post(&url)
            .json(&SubmissionPayload { fields })
            .send()
            .await?;

        let status = response.status();
        let body = read_json_body(response).await;

        if !status.is_success() {
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        Ok(body)
    }

    /// Submit `fields`; failure comes back as data
    pub async fn submit(&self, account_id: &str, form_id: &str, fields: &[NormalizedField]) -> SubmissionResult {
        match self.post_submission(account_id, form_id, fields).await {
            Ok(_) => SubmissionResult::Success,
            Err(err) => {
                warn!(form_id, error = %err, "form submission failed");
                SubmissionResult::from(&err)
            }
        }
    }
}

/// Body as JSON, `null` when empty or not JSON
pub(crate) async fn read_json_body(response: reqwest::Response) -> Value {
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => serde_json::from_str(&text).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
