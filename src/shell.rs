//! Presentation Shell
//!
//! Drives one form through fetch, render, collect, normalize, submit and
//! result display:
//!
//! ```text
//! Idle ──► Loading ──► Ready ──► Submitting ──┬──► Submitted
//!                        ▲                    │
//!                        └──── SubmitError ◄──┘
//! ```
//!
//! Loading always ends in `Ready`; a failed fetch degrades to an empty form.
//! `Submitted` is terminal.

use tracing::{info, warn};

use crate::error::ShellError;
use crate::gateway::FormsGateway;
use crate::models::{FormDefinition, NormalizedField, SubmissionResult, SUCCESS_MESSAGE};
use crate::normalize::{normalize, RawFieldValues};

/// Where the shell is in the form's lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellState {
    /// Nothing fetched yet
    Idle,
    /// Fetch in progress
    Loading,
    /// Form rendered, accepting input
    Ready,
    /// Submission in flight
    Submitting,
    /// Accepted upstream; terminal
    Submitted,
    /// Last submission failed; retry allowed
    SubmitError {
        /// Shown to the user
        message: String,
    },
}

/// One form, start to finish
pub struct FormShell<G> {
    gateway: G,
    form_id: String,
    definition: FormDefinition,
    state: ShellState,
}

impl<G: FormsGateway> FormShell<G> {
    /// Shell for `form_id`, in `Idle`
    pub fn new(gateway: G, form_id: impl Into<String>) -> Self {
        Self {
            gateway,
            form_id: form_id.into(),
            definition: FormDefinition::default(),
            state: ShellState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Form this shell drives
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Loaded definition; empty until `load` ran
    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    /// Loading indicator should show
    pub fn is_loading(&self) -> bool {
        matches!(self.state, ShellState::Idle | ShellState::Loading)
    }

    /// Submit control should be disabled
    pub fn is_submitting(&self) -> bool {
        self.state == ShellState::Submitting
    }

    /// Form replaced by the success message
    pub fn is_submitted(&self) -> bool {
        self.state == ShellState::Submitted
    }

    /// Success message once submitted
    pub fn success_message(&self) -> Option<&'static str> {
        self.is_submitted().then_some(SUCCESS_MESSAGE)
    }

    /// Message of the last failed submission
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ShellState::SubmitError { message } => Some(message),
            _ => None,
        }
    }

    /// Fetch the form definition. Fetch failures are logged and leave an
    /// empty form; the shell reaches `Ready` either way.
    pub async fn load(&mut self) -> Result<&FormDefinition, ShellError> {
        if self.state != ShellState::Idle {
            return Err(ShellError::AlreadyLoaded);
        }
        self.state = ShellState::Loading;

        self.definition = match self.gateway.fetch_form(&self.form_id).await {
            Ok(definition) => {
                info!(form_id = %self.form_id, groups = definition.field_groups.len(), "form loaded");
                definition
            }
            Err(err) => {
                warn!(form_id = %self.form_id, error = %err, "There was a problem fetching the form");
                FormDefinition::default()
            }
        };

        self.state = ShellState::Ready;
        Ok(&self.definition)
    }

    /// Enter `Submitting` and produce the fields to send
    pub fn begin_submit(&mut self, raw: &RawFieldValues) -> Result<Vec<NormalizedField>, ShellError> {
        match self.state {
            ShellState::Ready | ShellState::SubmitError { .. } => {}
            ShellState::Submitting => return Err(ShellError::SubmitInFlight),
            ShellState::Submitted => return Err(ShellError::AlreadySubmitted),
            ShellState::Idle | ShellState::Loading => return Err(ShellError::NotReady),
        }

        self.state = ShellState::Submitting;
        Ok(normalize(raw))
    }

    /// Leave `Submitting` according to `result`
    pub fn complete_submit(&mut self, result: SubmissionResult) -> Result<&ShellState, ShellError> {
        if self.state != ShellState::Submitting {
            return Err(ShellError::NoSubmitInFlight);
        }

        self.state = match result {
            SubmissionResult::Success => ShellState::Submitted,
            SubmissionResult::Error { message } => ShellState::SubmitError { message },
        };
        Ok(&self.state)
    }

    /// Normalize, submit and record the outcome
    pub async fn submit(&mut self, raw: &RawFieldValues) -> Result<&ShellState, ShellError> {
        let fields = self.begin_submit(raw)?;
        let result = self.gateway.submit_fields(&self.form_id, &fields).await;

        if result.is_success() {
            info!(form_id = %self.form_id, "form submitted successfully");
        }
        self.complete_submit(result)
    }
}
