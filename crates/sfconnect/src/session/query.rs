//! Query execution and result access
//!
//! Every query opens a fresh [`RecordSet`] that becomes the session's
//! current result; it is filled when the response arrives.

use crate::dispatch::{CallKind, DataApi};
use crate::error::{CallFailure, FailureKind, Result};
use crate::events::SessionEvent;
use crate::record_set::{Record, RecordSet};
use crate::session::core::{PendingCall, Session};
use crate::session::state::{SessionState, Shared};
use crate::soql;

impl Session {
    /// Query every record of `object_type`, selecting `fields`.
    ///
    /// With `discard_previous` false the old current result is kept in
    /// [`Session::previous_results`]; otherwise it is dropped.
    pub fn query_all<S: AsRef<str>>(
        &self,
        object_type: &str,
        fields: &[S],
        discard_previous: bool,
    ) -> Result<PendingCall> {
        let statement = soql::select_all(object_type, fields);
        self.start_query(statement, object_type, discard_previous)
    }

    /// Query the records of `object_type` with the given ids.
    pub fn query_by_ids<S: AsRef<str>, I: AsRef<str>>(
        &self,
        object_type: &str,
        fields: &[S],
        ids: &[I],
        discard_previous: bool,
    ) -> Result<PendingCall> {
        let statement = soql::select_by_ids(object_type, fields, ids);
        self.start_query(statement, object_type, discard_previous)
    }

    /// Run an arbitrary SOQL statement whose rows are of `object_type`.
    pub fn query(
        &self,
        soql: &str,
        object_type: &str,
        discard_previous: bool,
    ) -> Result<PendingCall> {
        self.start_query(Ok(soql.to_string()), object_type, discard_previous)
    }

    fn start_query(
        &self,
        statement: Result<String>,
        object_type: &str,
        discard_previous: bool,
    ) -> Result<PendingCall> {
        self.start_call(
            CallKind::Query,
            SessionEvent::QueryRequested,
            |shared, grant| {
                let statement = statement?;
                let request = DataApi::new(grant, &shared.config.api_version).query(&statement);
                shared.replace_current(RecordSet::open(object_type), discard_previous);
                Ok(request)
            },
            settle_query,
        )
    }

    /// Whether the session is ready and tracks a current result.
    pub fn has_result(&self) -> bool {
        let shared = self.lock();
        shared.state == SessionState::Ready && shared.current.is_some()
    }

    /// Copy of the current result, filled or not.
    pub fn current_result(&self) -> Option<RecordSet> {
        self.lock().current.clone()
    }

    /// Results superseded by later queries that asked to keep them, oldest
    /// first.
    pub fn previous_results(&self) -> Vec<RecordSet> {
        self.lock().previous.clone()
    }

    /// Drop every retained previous result.
    pub fn clear_previous_results(&self) {
        self.lock().previous.clear();
    }

    /// Record from the current result whose `Id` contains `id`.
    ///
    /// `None` unless [`Session::has_result`].
    pub fn record_by_id(&self, id: &str) -> Option<Record> {
        let shared = self.lock();
        if shared.state != SessionState::Ready {
            return None;
        }
        shared
            .current
            .as_ref()
            .and_then(|set| set.record_by_id(id))
            .cloned()
    }
}

fn settle_query(
    shared: &mut Shared,
    outcome: std::result::Result<String, CallFailure>,
) -> SessionEvent {
    let filled = outcome.and_then(|body| match shared.current.as_mut() {
        Some(set) => set.fill(&body).map_err(CallFailure::from),
        None => Ok(()),
    });

    match filled {
        Ok(()) => {
            shared.clear_error();
            SessionEvent::QuerySuccessful
        }
        Err(failure) => {
            shared.set_error(failure.call_error_kind(), failure.message.clone());
            match failure.kind {
                FailureKind::Transport => SessionEvent::QueryError(failure.message),
                FailureKind::Rejected | FailureKind::Malformed => {
                    SessionEvent::QueryUnsuccessful(failure.message)
                }
            }
        }
    }
}
