//! Error types for the contact relay

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::{ErrorResponse, SubmissionResult, SUBMISSION_FAILED};

/// Startup configuration error. Never produced while serving requests.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required value absent or blank
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// Value present but unusable
    #[error("invalid setting {name}: {reason}")]
    Invalid {
        /// Setting, by its environment variable name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Schema retrieval failed
#[derive(Error, Debug)]
pub enum FetchError {
    /// Upstream answered with a non-success status
    #[error("form schema request failed with status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Upstream message, or the raw body
        message: String,
    },

    /// Request never produced a response
    #[error("form schema request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not JSON
    #[error("form schema response was not valid JSON: {0}")]
    Decode(String),
}

/// Submission rejected or unreachable
#[derive(Error, Debug)]
pub enum SubmitError {
    /// Upstream answered with a non-success status. `message` is the
    /// upstream-provided explanation, if the body carried one.
    #[error("submission rejected with status {status}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Upstream explanation
        message: Option<String>,
    },

    /// Request never produced a response
    #[error("submission request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Invalid Presentation Shell transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShellError {
    /// `load` called twice
    #[error("form has already been loaded")]
    AlreadyLoaded,

    /// Submit before the form loaded
    #[error("form is not ready for submission")]
    NotReady,

    /// Submit while another submit is pending
    #[error("a submission is already in flight")]
    SubmitInFlight,

    /// Submit after a successful submission
    #[error("form has already been submitted")]
    AlreadySubmitted,

    /// Completion reported with nothing pending
    #[error("no submission is in flight")]
    NoSubmitInFlight,
}

/// Terminal input could not be turned into raw field values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectError {
    /// Answer for a field the form does not have
    #[error("form has no field named {0}")]
    UnknownField(String),

    /// Choice outside the field's options
    #[error("{choice:?} is not an option of field {field}")]
    UnknownOption {
        /// Field name
        field: String,
        /// Choice as given
        choice: String,
    },

    /// Required field left empty
    #[error("field {0} is required")]
    MissingRequired(String),

    /// Answer not in `name=value` form
    #[error("expected name=value, got {0:?}")]
    MalformedInput(String),
}

/// Failure surfaced by the relay endpoints
#[derive(Error, Debug)]
pub enum RelayError {
    /// Requested form id cannot be used as a URL path segment
    #[error("Invalid form id: {reason}")]
    InvalidFormId {
        /// Id as the caller sent it
        form_id: String,
        /// Why it was refused
        reason: String,
    },

    /// Schema retrieval failed upstream
    #[error("Failed to fetch form")]
    Fetch(#[from] FetchError),

    /// Submission failed upstream
    #[error("Failed to submit form")]
    Submit(#[from] SubmitError),
}

impl RelayError {
    fn code(&self) -> &'static str {
        match self {
            RelayError::InvalidFormId { .. } => "INVALID_FORM_ID",
            RelayError::Fetch(_) => "FETCH_FAILED",
            RelayError::Submit(_) => "SUBMIT_FAILED",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidFormId { .. } => StatusCode::BAD_REQUEST,
            RelayError::Fetch(_) | RelayError::Submit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::InvalidFormId { form_id, reason } => {
                tracing::warn!(%form_id, %reason, "Rejected form id")
            }
            RelayError::Fetch(err) => tracing::error!(error = %err, "Error fetching form"),
            RelayError::Submit(err) => tracing::error!(error = %err, "Error submitting form"),
        }

        // Relay clients show a submit failure's `message` as is.
        let message = match &self {
            RelayError::Submit(err) => SubmissionResult::from(err)
                .message()
                .unwrap_or(SUBMISSION_FAILED)
                .to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}
