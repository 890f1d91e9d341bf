//! Wire models shared by the relay, the upstream client and the shell

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::SubmitError;

/// Message shown once the upstream accepted a submission
pub const SUCCESS_MESSAGE: &str = "The form has been submitted successfully.";

/// Fallback when the upstream rejects a submission without explaining why
pub const SUBMISSION_FAILED: &str = "Submission failed";

/// Fallback when a submission fails before any response arrives
pub const UNEXPECTED_ERROR: &str = "Unexpected error";

/// Error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable failure kind
    pub code: String,
    /// Text to show the user
    pub message: String,
}

// ============ Form schema ============

/// A field group exactly as the forms API returned it.
///
/// Only the rendering layer looks inside; everything else passes it through.
pub type FieldGroup = Value;

/// The parts of a form schema needed to render it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    /// Opaque field groups, in schema order
    #[serde(default)]
    pub field_groups: Vec<Value>,
    /// Label of the submit control
    #[serde(default)]
    pub submit_button_text: String,
}

impl FormDefinition {
    /// Extract a definition from an upstream schema document.
    ///
    /// Missing or mistyped members fall back to an empty list / empty string.
    pub fn from_schema(schema: &Value) -> Self {
        let field_groups = schema
            .get("fieldGroups")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let submit_button_text = schema
            .pointer("/displayOptions/submitButtonText")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            field_groups,
            submit_button_text,
        }
    }

    /// True for the degraded, field-less form
    pub fn is_empty(&self) -> bool {
        self.field_groups.is_empty()
    }
}

// ============ Submission ============

/// A flat name/value pair ready for submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NormalizedField {
    /// Field name from the schema
    pub name: String,
    /// Flattened value
    pub value: String,
}

impl NormalizedField {
    /// Pair `name` with `value`
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Body of the upstream submission request
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload<'a> {
    /// Fields in submission order
    pub fields: &'a [NormalizedField],
}

/// Body accepted by `POST /api/postHubSpotForm`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelaySubmitRequest {
    /// Defaults to the configured contact form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    /// Normalized fields to forward
    #[serde(default)]
    pub fields: Vec<NormalizedField>,
}

/// Outcome of a submission, returned as data so callers can render it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmissionResult {
    /// Upstream accepted the submission
    Success,
    /// Submission failed; `message` is shown to the user
    Error {
        /// Upstream explanation or a fixed fallback
        message: String,
    },
}

impl SubmissionResult {
    /// Failure with the message to show
    pub fn error(message: impl Into<String>) -> Self {
        SubmissionResult::Error {
            message: message.into(),
        }
    }

    /// Rejection by the upstream; `upstream` is its own message, if any
    pub fn rejected(upstream: Option<String>) -> Self {
        Self::error(non_empty(upstream).unwrap_or_else(|| SUBMISSION_FAILED.to_string()))
    }

    /// Failure before any upstream response
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::error(non_empty(Some(message.into())).unwrap_or_else(|| UNEXPECTED_ERROR.to_string()))
    }

    /// Whether the upstream accepted the submission
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success)
    }

    /// Message to show for a failed submission
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionResult::Success => None,
            SubmissionResult::Error { message } => Some(message),
        }
    }
}

/// The user-facing outcome of a failed submission. Direct callers and the
/// relay both go through here so they show the same text.
impl From<&SubmitError> for SubmissionResult {
    fn from(err: &SubmitError) -> Self {
        match err {
            SubmitError::Rejected { message, .. } => SubmissionResult::rejected(message.clone()),
            SubmitError::Transport(e) => SubmissionResult::unexpected(e.to_string()),
        }
    }
}

fn non_empty(message: Option<String>) -> Option<String> {
    message.filter(|m| !m.trim().is_empty())
}

/// Pull the `message` member out of an upstream error body
pub fn upstream_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
