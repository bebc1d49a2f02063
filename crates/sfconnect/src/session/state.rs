//! Session state tracking
//!
//! [`SessionState`] is the lifecycle gate; [`SessionStatus`] is the public
//! snapshot of it. The mutable record behind both (`Shared`) also owns the
//! configuration, the access grant and the tracked result sets.

use crate::auth::AccessGrant;
use crate::config::SessionConfig;
use crate::error::ErrorKind;
use crate::record_set::RecordSet;
use std::fmt;

/// Lifecycle state of a session.
///
/// `Created -> Authenticating -> Ready`, then `Ready -> Busy -> Ready` for
/// every query or CRUD call. A failed login returns to `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Not logged in; login may be attempted
    #[default]
    Created,
    /// A login request is in flight
    Authenticating,
    /// Logged in and idle
    Ready,
    /// Logged in with one data call in flight
    Busy,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Busy => "busy",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a session. Never contains the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Current lifecycle state
    pub state: SessionState,

    /// Kind of the last settled failure, `None` after a success
    pub last_error: ErrorKind,

    /// Message of the last settled failure, empty after a success
    pub last_error_message: String,

    /// Instance base URL, present once logged in
    pub instance_url: Option<String>,
}

/// Mutable session record, guarded by the session mutex.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) config: SessionConfig,
    pub(crate) state: SessionState,
    pub(crate) last_error: ErrorKind,
    pub(crate) last_error_message: String,
    pub(crate) grant: Option<AccessGrant>,
    pub(crate) current: Option<RecordSet>,
    pub(crate) previous: Vec<RecordSet>,
}

impl Shared {
    pub(crate) fn new(config: SessionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = ErrorKind::None;
        self.last_error_message.clear();
    }

    pub(crate) fn set_error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.last_error = kind;
        self.last_error_message = message.into();
    }

    /// Make `set` the current result, retaining or dropping the old one.
    pub(crate) fn replace_current(&mut self, set: RecordSet, discard_previous: bool) {
        if let Some(old) = self.current.replace(set)
            && !discard_previous
        {
            self.previous.push(old);
        }
    }

    pub(crate) fn snapshot(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            last_error: self.last_error,
            last_error_message: self.last_error_message.clone(),
            instance_url: self
                .grant
                .as_ref()
                .map(|grant| grant.instance_url().to_string()),
        }
    }
}
