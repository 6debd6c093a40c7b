// errors.rs
use thiserror::Error;

/// Reasons `submit_turn` refuses input. Both are silent no-ops for the UI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("input is empty")]
    EmptyInput,
    #[error("a reply is still pending")]
    AwaitingCompletion,
}

#[derive(Debug, Error)]
pub enum RemoteCallError {
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl RemoteCallError {
    /// Rate limits and server-side errors may clear on their own; everything
    /// else (transport, unreadable body, 4xx) will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteCallError::Status { status, .. } if *status == 429 || *status >= 500)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("image job submission failed: {0}")]
    Submission(String),
    #[error("image job failed: {0}")]
    JobFailed(String),
    #[error("image job status check failed: {0}")]
    StatusCheck(String),
    #[error("image job still pending after {attempts} status checks")]
    Timeout { attempts: u32 },
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),
    #[error("image service rejected the API key (status {0})")]
    Unauthorized(u16),
    #[error("an image generation run is already active")]
    ReentrancyRejected,
    #[error("image generation cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Text shown to the user for this outcome, if any.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            PipelineError::Submission(_) => {
                Some("Sorry, the image service could not accept the design request. Please try again.")
            }
            PipelineError::JobFailed(_) => {
                Some("Sorry, the image service failed to render this design. Please try again.")
            }
            PipelineError::StatusCheck(_) => {
                Some("Sorry, the image service stopped responding properly while rendering this design.")
            }
            PipelineError::Timeout { .. } => Some(
                "The image is taking longer than expected. It may still finish later; this is not a hard failure.",
            ),
            PipelineError::MissingApiKey(_) => {
                Some("No image service API key is configured. Please set one before generating designs.")
            }
            PipelineError::Unauthorized(_) => {
                Some("The image service rejected the API key. Please check that it is valid.")
            }
            PipelineError::ReentrancyRejected | PipelineError::Cancelled => None,
        }
    }

    /// Short machine-readable reason code.
    pub fn reason_code(&self) -> &'static str {
        match self {
            PipelineError::Submission(_) => "submission_error",
            PipelineError::JobFailed(_) => "job_failed",
            PipelineError::StatusCheck(_) => "status_check_failed",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::MissingApiKey(_) => "missing_api_key",
            PipelineError::Unauthorized(_) => "unauthorized",
            PipelineError::ReentrancyRejected => "reentrancy_rejected",
            PipelineError::Cancelled => "cancelled",
        }
    }
}

impl PipelineError {
    /// Credential problems get their own notice whichever call hit them.
    fn credentials(err: &RemoteCallError) -> Option<PipelineError> {
        match err {
            RemoteCallError::MissingApiKey(key) => Some(PipelineError::MissingApiKey(*key)),
            RemoteCallError::Status { status: status @ (401 | 403), .. } => Some(PipelineError::Unauthorized(*status)),
            _ => None,
        }
    }

    /// A status query error that polling cannot recover from.
    pub fn status_check(err: RemoteCallError) -> Self {
        PipelineError::credentials(&err).unwrap_or_else(|| PipelineError::StatusCheck(err.to_string()))
    }
}

impl From<RemoteCallError> for PipelineError {
    fn from(err: RemoteCallError) -> Self {
        PipelineError::credentials(&err).unwrap_or_else(|| PipelineError::Submission(err.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}
