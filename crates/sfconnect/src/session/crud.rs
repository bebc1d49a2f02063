//! Insert, update and delete
//!
//! Any accepted write drops the session's current result, since its rows
//! may now be stale. Update and delete need the record's id; without one
//! the call is rejected and the current result is kept.

use crate::dispatch::{CallKind, DataApi, record_id};
use crate::error::{CallFailure, FailureKind, Result, SessionError};
use crate::events::SessionEvent;
use crate::record_set::Record;
use crate::session::core::{PendingCall, Session};
use crate::session::state::Shared;

impl Session {
    /// Create a record of `object_type` from `record`'s fields.
    ///
    /// Any `id`/`Id` field is left out of the request body.
    pub fn insert(&self, object_type: &str, record: &Record) -> Result<PendingCall> {
        self.start_call(
            CallKind::Crud,
            SessionEvent::InsertRequested,
            |shared, grant| {
                let request =
                    DataApi::new(grant, &shared.config.api_version).insert(object_type, record);
                shared.current = None;
                Ok(request)
            },
            settle_crud,
        )
    }

    /// Update the record identified by `record`'s `id` with its other fields.
    pub fn update(&self, object_type: &str, record: &Record) -> Result<PendingCall> {
        self.start_call(
            CallKind::Crud,
            SessionEvent::UpdateRequested,
            |shared, grant| {
                let id = record_id(record).ok_or(SessionError::MissingId)?;
                let request = DataApi::new(grant, &shared.config.api_version)
                    .update(object_type, id, record);
                shared.current = None;
                Ok(request)
            },
            settle_crud,
        )
    }

    /// Delete the record identified by `record`'s `id`.
    pub fn delete(&self, object_type: &str, record: &Record) -> Result<PendingCall> {
        self.start_call(
            CallKind::Crud,
            SessionEvent::DeleteRequested,
            |shared, grant| {
                let id = record_id(record).ok_or(SessionError::MissingId)?;
                let request = DataApi::new(grant, &shared.config.api_version).delete(object_type, id);
                shared.current = None;
                Ok(request)
            },
            settle_crud,
        )
    }
}

// The response body of a successful write is not kept.
fn settle_crud(shared: &mut Shared, outcome: std::result::Result<String, CallFailure>) -> SessionEvent {
    match outcome {
        Ok(_) => {
            shared.clear_error();
            SessionEvent::CrudSuccessful
        }
        Err(failure) => {
            shared.set_error(failure.call_error_kind(), failure.message.clone());
            match failure.kind {
                FailureKind::Transport => SessionEvent::CrudError(failure.message),
                FailureKind::Rejected | FailureKind::Malformed => {
                    SessionEvent::CrudUnsuccessful(failure.message)
                }
            }
        }
    }
}
