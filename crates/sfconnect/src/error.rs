//! Error types for the session layer
//!
//! Two families live here:
//!
//! - [`SessionError`]: returned synchronously when a call is rejected before
//!   any work is started (wrong state, incomplete configuration, missing id).
//! - [`CallFailure`]: the failed outcome of an asynchronous call (login,
//!   query or CRUD). These never surface as return values of the public
//!   session API; they are recorded in the session status and reported
//!   through events.

use crate::session::SessionState;
use sfconnect_transport::TransportError;
use std::fmt;
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Reasons a session operation is rejected up front.
///
/// A rejected call has no side effects: no state change, no network
/// request and no event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A required configuration field is absent or empty.
    #[error("Incomplete configuration: missing {0}")]
    IncompleteConfig(&'static str),

    /// The operation is not allowed in the session's current state.
    #[error("Operation not allowed while session is {0}")]
    InvalidState(SessionState),

    /// Update and delete need the record's `id`.
    #[error("Record has no id field")]
    MissingId,

    /// A query needs at least one selected field.
    #[error("At least one field must be selected")]
    EmptyFieldList,

    /// A query by ids needs at least one id.
    #[error("At least one id is required")]
    EmptyIdList,

    /// Calls are spawned on the ambient tokio runtime, and there is none.
    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    /// A response body could not be interpreted.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Status-level error taxonomy, as recorded in the session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorKind {
    /// The last settled call succeeded (or nothing has settled yet).
    #[default]
    None,
    /// Login was rejected or could not reach the auth endpoint.
    AuthError,
    /// A query or CRUD call was rejected or could not be sent.
    CallError,
    /// A response arrived but its body could not be interpreted.
    MalformedResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::AuthError => "auth error",
            Self::CallError => "call error",
            Self::MalformedResponse => "malformed response",
        };
        f.write_str(s)
    }
}

/// How an asynchronous call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The server answered with an application-level error.
    Rejected,
    /// The request never produced a response.
    Transport,
    /// The server answered "success" but the payload was unusable.
    Malformed,
}

/// Failed outcome of an authentication or dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallFailure {
    /// What went wrong
    pub kind: FailureKind,
    /// Human-readable reason, taken from the server or transport
    pub message: String,
}

impl CallFailure {
    /// Application-level rejection
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rejected,
            message: message.into(),
        }
    }

    /// Network-level failure
    pub fn transport(err: &TransportError) -> Self {
        Self {
            kind: FailureKind::Transport,
            message: err.to_string(),
        }
    }

    /// Unusable success payload
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Malformed,
            message: message.into(),
        }
    }

    /// Status-level kind for a failure during login.
    pub fn auth_error_kind(&self) -> ErrorKind {
        match self.kind {
            FailureKind::Malformed => ErrorKind::MalformedResponse,
            FailureKind::Rejected | FailureKind::Transport => ErrorKind::AuthError,
        }
    }

    /// Status-level kind for a failure during a query or CRUD call.
    pub fn call_error_kind(&self) -> ErrorKind {
        match self.kind {
            FailureKind::Malformed => ErrorKind::MalformedResponse,
            FailureKind::Rejected | FailureKind::Transport => ErrorKind::CallError,
        }
    }
}

impl From<SessionError> for CallFailure {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MalformedResponse(message) => Self::malformed(message),
            other => Self::rejected(other.to_string()),
        }
    }
}
