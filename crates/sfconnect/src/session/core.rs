//! Core session management
//!
//! Provides the [`Session`] handle, login, status inspection and event
//! reporting, plus the single-flight gate shared by every data call.

use crate::auth::{AccessGrant, AuthenticationManager};
use crate::config::SessionConfig;
use crate::dispatch::{CallKind, RequestDispatcher};
use crate::error::{CallFailure, ErrorKind, FailureKind, Result, SessionError};
use crate::events::{EventBus, SessionEvent, Subscriber, SubscriberId};
use crate::session::state::{SessionState, SessionStatus, Shared};
use sfconnect_transport::{HttpRequest, Transport};
use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

/// A session with a remote org.
///
/// Cloning is cheap and every clone drives the same session. All operations
/// return immediately: accepted calls run on a spawned tokio task and report
/// their outcome through the status fields and, when reporting is active,
/// through subscribers. Rejected calls return an error and change nothing.
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionCore>,
}

pub(crate) struct SessionCore {
    shared: Mutex<Shared>,
    events: EventBus,
    auth: AuthenticationManager,
    dispatcher: RequestDispatcher,
}

impl Session {
    /// Create an unconfigured session over `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(SessionConfig::default(), transport)
    }

    /// Create a session with `config` already applied.
    ///
    /// Unlike [`Session::configure`], this publishes no event: nobody can be
    /// subscribed yet.
    pub fn with_config(config: SessionConfig, transport: Arc<dyn Transport>) -> Self {
        let events = EventBus::new(config.reports_enabled);
        Self {
            inner: Arc::new(SessionCore {
                shared: Mutex::new(Shared::new(config)),
                events,
                auth: AuthenticationManager::new(Arc::clone(&transport)),
                dispatcher: RequestDispatcher::new(transport),
            }),
        }
    }

    /// Replace the configuration.
    ///
    /// The reporting flag follows `config.reports_enabled`. Publishes
    /// [`SessionEvent::ConfigChanged`].
    pub fn configure(&self, config: SessionConfig) {
        let reporting = config.reports_enabled;
        self.lock().config = config;
        self.inner.events.set_reporting(reporting);
        debug!(reporting, "Session configuration replaced");
        self.publish(SessionEvent::ConfigChanged);
    }

    /// Copy of the current configuration
    pub fn config(&self) -> SessionConfig {
        self.lock().config.clone()
    }

    /// Start logging in with user credentials.
    ///
    /// Only allowed from [`SessionState::Created`] with a complete
    /// configuration. Moves to `Authenticating`, publishes
    /// [`SessionEvent::LoginRequested`] and settles in `Ready` or back in
    /// `Created`.
    pub fn login(&self, username: impl Into<String>, password: impl Into<String>) -> Result<PendingCall> {
        let runtime = current_runtime()?;

        let config = {
            let mut shared = self.lock();
            if shared.state != SessionState::Created {
                return Err(SessionError::InvalidState(shared.state));
            }
            shared.config.validate()?;
            shared.state = SessionState::Authenticating;
            shared.config.clone()
        };

        info!(endpoint = %config.auth_endpoint, "Login requested");
        self.publish(SessionEvent::LoginRequested);

        let session = self.clone();
        let username = username.into();
        let password = password.into();
        let auth = self.inner.auth.clone();
        let handle = runtime.spawn(async move {
            let outcome = tokio::spawn(async move {
                auth.authenticate(&config, &username, &password).await
            })
            .await
            .unwrap_or_else(|err| Err(aborted(err)));
            session.settle_login(outcome);
        });

        Ok(PendingCall::new(handle))
    }

    fn settle_login(&self, outcome: std::result::Result<AccessGrant, CallFailure>) {
        let event = {
            let mut shared = self.lock();
            match outcome {
                Ok(grant) => {
                    shared.grant = Some(grant);
                    shared.state = SessionState::Ready;
                    shared.clear_error();
                    SessionEvent::LoginSuccessful
                }
                Err(failure) => {
                    shared.state = SessionState::Created;
                    shared.set_error(failure.auth_error_kind(), failure.message);
                    SessionEvent::LoginFailed
                }
            }
        };

        info!(event = %event, "Login settled");
        self.publish(event);
    }

    /// Whether the session is logged in and idle.
    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Snapshot of state, last error and instance URL
    pub fn status(&self) -> SessionStatus {
        self.lock().snapshot()
    }

    /// Kind of the last settled failure
    pub fn last_error(&self) -> ErrorKind {
        self.lock().last_error
    }

    /// Message of the last settled failure
    pub fn last_error_message(&self) -> String {
        self.lock().last_error_message.clone()
    }

    /// Turn event reporting on.
    pub fn activate_reports(&self) {
        self.lock().config.reports_enabled = true;
        self.inner.events.set_reporting(true);
    }

    /// Turn event reporting off.
    pub fn deactivate_reports(&self) {
        self.lock().config.reports_enabled = false;
        self.inner.events.set_reporting(false);
    }

    /// Whether events are delivered to subscribers.
    pub fn reports_active(&self) -> bool {
        self.inner.events.reporting()
    }

    /// Register an observer for event messages.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        self.inner.events.subscribe(subscriber)
    }

    /// Remove an observer. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.events.unsubscribe(id);
    }

    /// Pass the single-flight gate and spawn a data call.
    ///
    /// `prepare` runs under the session lock once the session is known to be
    /// `Ready`. It validates arguments, does any result-set bookkeeping and
    /// builds the request; if it fails nothing has changed. On success the
    /// session turns `Busy`, `requested` is published, and `settle` runs
    /// with the outcome once the call completes, its returned event being
    /// published after the session is back to `Ready`.
    pub(crate) fn start_call<P, S>(
        &self,
        kind: CallKind,
        requested: SessionEvent,
        prepare: P,
        settle: S,
    ) -> Result<PendingCall>
    where
        P: FnOnce(&mut Shared, &AccessGrant) -> Result<HttpRequest>,
        S: FnOnce(&mut Shared, std::result::Result<String, CallFailure>) -> SessionEvent
            + Send
            + 'static,
    {
        let runtime = current_runtime()?;

        let request = {
            let mut shared = self.lock();
            if shared.state != SessionState::Ready {
                return Err(SessionError::InvalidState(shared.state));
            }
            let grant = shared
                .grant
                .clone()
                .ok_or(SessionError::InvalidState(shared.state))?;
            let request = prepare(&mut shared, &grant)?;
            shared.state = SessionState::Busy;
            request
        };

        debug!(%kind, "Session busy");
        self.publish(requested);

        let session = self.clone();
        let dispatcher = self.inner.dispatcher.clone();
        let handle = runtime.spawn(async move {
            let outcome = tokio::spawn(async move { dispatcher.dispatch(request, kind).await })
                .await
                .unwrap_or_else(|err| Err(aborted(err)));
            let event = {
                let mut shared = session.lock();
                let event = settle(&mut shared, outcome);
                shared.state = SessionState::Ready;
                event
            };
            debug!(%kind, event = %event, "Session ready");
            session.publish(event);
        });

        Ok(PendingCall::new(handle))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // Never call with the session lock held: subscribers may call back in.
    fn publish(&self, event: SessionEvent) {
        self.inner.events.publish(&event);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status())
            .field("events", &self.inner.events)
            .finish()
    }
}

// A transport that panics still settles the call, as a transport failure.
fn aborted(err: JoinError) -> CallFailure {
    warn!(error = %err, "Transport task aborted");
    CallFailure {
        kind: FailureKind::Transport,
        message: err.to_string(),
    }
}

fn current_runtime() -> Result<Handle> {
    Handle::try_current().map_err(|e| SessionError::NoRuntime(e.to_string()))
}

/// Handle to an accepted call.
///
/// Dropping it does not cancel anything. Awaiting it resolves once the call
/// has settled, its status recorded and its event published.
#[derive(Debug)]
pub struct PendingCall {
    handle: JoinHandle<()>,
}

impl PendingCall {
    fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Whether the call has settled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl IntoFuture for PendingCall {
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            if let Err(err) = self.handle.await {
                warn!(error = %err, "Session call task did not complete");
            }
        })
    }
}
