//! Error types returned by platform and telemetry collaborators.

use thiserror::Error;

/// Errors raised by a collaborator call.
///
/// Every variant is classified by [`CollaboratorError::is_transient`]: polling
/// loops retry transient errors until their deadline and propagate the rest
/// immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Connection, DNS or request timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The API answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    RequestFailed {
        /// HTTP status code
        status: u16,
        /// Sanitized response body
        body: String,
    },

    /// The requested entity does not exist (yet)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The response could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A platform resource entered a terminal error state
    #[error("Resource {resource} entered status {status}")]
    ResourceFailed {
        /// Resource identifier
        resource: String,
        /// Status reported by the platform
        status: String,
    },
}

impl CollaboratorError {
    /// Whether the condition may clear up on its own and is worth retrying.
    ///
    /// Telemetry entities routinely show up after the platform event that
    /// produces them, so `NotFound` is transient. Throttling (429), request
    /// timeouts (408) and server errors (5xx) are transient as well.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            CollaboratorError::Transport(_) | CollaboratorError::NotFound(_) => true,
            CollaboratorError::RequestFailed { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            CollaboratorError::Unauthorized(_)
            | CollaboratorError::InvalidResponse(_)
            | CollaboratorError::ResourceFailed { .. } => false,
        }
    }
}

/// Result type alias using `CollaboratorError`
pub type Result<T> = std::result::Result<T, CollaboratorError>;
