//! Event reporting for session observers
//!
//! Every asynchronous outcome of a [`Session`](crate::Session) is reported as
//! a [`SessionEvent`], rendered to a single string message and delivered to
//! each subscribed [`Subscriber`]. Delivery only happens while reporting is
//! active.
//!
//! # Example
//!
//! ```
//! use sfconnect::events::{EventBus, SessionEvent};
//! use std::sync::{Arc, Mutex};
//!
//! let bus = EventBus::new(true);
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let id = bus.subscribe(Arc::new(move |message: &str| {
//!     sink.lock().unwrap().push(message.to_string());
//! }));
//!
//! bus.publish(&SessionEvent::LoginSuccessful);
//! bus.unsubscribe(id);
//! bus.publish(&SessionEvent::LoginFailed);
//!
//! assert_eq!(*seen.lock().unwrap(), vec!["LOGIN SUCCESSFUL".to_string()]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Everything a session reports.
///
/// Most events render as a fixed message. Failure events carry the error
/// message, which is appended directly to the fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Configuration was replaced
    ConfigChanged,
    /// A login request was sent
    LoginRequested,
    /// Login produced a token
    LoginSuccessful,
    /// Login was rejected or could not be sent
    LoginFailed,
    /// A query request was sent
    QueryRequested,
    /// A query settled and its result set was filled
    QuerySuccessful,
    /// The server rejected a query
    QueryUnsuccessful(String),
    /// A query could not be sent
    QueryError(String),
    /// An insert request was sent
    InsertRequested,
    /// An update request was sent
    UpdateRequested,
    /// A delete request was sent
    DeleteRequested,
    /// An insert, update or delete settled successfully
    CrudSuccessful,
    /// The server rejected an insert, update or delete
    CrudUnsuccessful(String),
    /// An insert, update or delete could not be sent
    CrudError(String),
}

impl SessionEvent {
    /// Message for [`SessionEvent::ConfigChanged`]
    pub const CONFIG_CHANGED: &'static str = "CONFIGURATION WAS CHANGED";
    /// Message for [`SessionEvent::LoginRequested`]
    pub const LOGIN_REQUESTED: &'static str = "LOGIN REQUESTED";
    /// Message for [`SessionEvent::LoginSuccessful`]
    pub const LOGIN_SUCCESSFUL: &'static str = "LOGIN SUCCESSFUL";
    /// Message for [`SessionEvent::LoginFailed`]
    pub const LOGIN_FAILED: &'static str = "LOGIN FAILED";
    /// Message for [`SessionEvent::QueryRequested`]
    pub const QUERY_REQUESTED: &'static str = "QUERY REQUESTED";
    /// Message for [`SessionEvent::QuerySuccessful`]
    pub const QUERY_SUCCESSFUL: &'static str = "QUERY SUCCESSFUL";
    /// Prefix for [`SessionEvent::QueryUnsuccessful`]
    pub const QUERY_UNSUCCESSFUL: &'static str = "QUERY UNSUCCESSFUL";
    /// Prefix for [`SessionEvent::QueryError`]
    pub const QUERY_ERROR: &'static str = "QUERY ERROR";
    /// Message for [`SessionEvent::InsertRequested`]
    pub const INSERT_REQUESTED: &'static str = "INSERT REQUESTED";
    /// Message for [`SessionEvent::UpdateRequested`]
    pub const UPDATE_REQUESTED: &'static str = "UPDATE REQUESTED";
    /// Message for [`SessionEvent::DeleteRequested`]
    pub const DELETE_REQUESTED: &'static str = "DELETE REQUESTED";
    /// Message for [`SessionEvent::CrudSuccessful`]
    pub const CRUD_SUCCESSFUL: &'static str = "CRUD SUCCESSFUL";
    /// Prefix for [`SessionEvent::CrudUnsuccessful`]
    pub const CRUD_UNSUCCESSFUL: &'static str = "CRUD UNSUCCESSFUL";
    /// Prefix for [`SessionEvent::CrudError`]
    pub const CRUD_ERROR: &'static str = "CRUD ERROR";

    /// Render the message delivered to subscribers.
    pub fn message(&self) -> String {
        match self {
            Self::ConfigChanged => Self::CONFIG_CHANGED.to_string(),
            Self::LoginRequested => Self::LOGIN_REQUESTED.to_string(),
            Self::LoginSuccessful => Self::LOGIN_SUCCESSFUL.to_string(),
            Self::LoginFailed => Self::LOGIN_FAILED.to_string(),
            Self::QueryRequested => Self::QUERY_REQUESTED.to_string(),
            Self::QuerySuccessful => Self::QUERY_SUCCESSFUL.to_string(),
            Self::QueryUnsuccessful(reason) => format!("{}{}", Self::QUERY_UNSUCCESSFUL, reason),
            Self::QueryError(reason) => format!("{}{}", Self::QUERY_ERROR, reason),
            Self::InsertRequested => Self::INSERT_REQUESTED.to_string(),
            Self::UpdateRequested => Self::UPDATE_REQUESTED.to_string(),
            Self::DeleteRequested => Self::DELETE_REQUESTED.to_string(),
            Self::CrudSuccessful => Self::CRUD_SUCCESSFUL.to_string(),
            Self::CrudUnsuccessful(reason) => format!("{}{}", Self::CRUD_UNSUCCESSFUL, reason),
            Self::CrudError(reason) => format!("{}{}", Self::CRUD_ERROR, reason),
        }
    }

    /// Whether this event reports a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::LoginFailed
                | Self::QueryUnsuccessful(_)
                | Self::QueryError(_)
                | Self::CrudUnsuccessful(_)
                | Self::CrudError(_)
        )
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Receiver of session event messages.
///
/// Implemented for any `Fn(&str) + Send + Sync` closure.
pub trait Subscriber: Send + Sync {
    /// Called once per published event while reporting is active.
    fn on_event(&self, message: &str);
}

impl<F> Subscriber for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_event(&self, message: &str) {
        self(message)
    }
}

/// Identity handed out by [`EventBus::subscribe`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subscriber registry and broadcast primitive.
///
/// Ids grow monotonically, so iterating the registry in key order is
/// subscription order.
pub struct EventBus {
    subscribers: Mutex<BTreeMap<SubscriberId, Arc<dyn Subscriber>>>,
    next_id: AtomicU64,
    reporting: AtomicBool,
}

impl EventBus {
    /// Create an empty bus with reporting on or off.
    pub fn new(reporting: bool) -> Self {
        Self {
            subscribers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
            reporting: AtomicBool::new(reporting),
        }
    }

    /// Register a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.registry().insert(id, subscriber);
        debug!(subscriber = %id, "Subscriber registered");
        id
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.registry().remove(&id).is_some() {
            debug!(subscriber = %id, "Subscriber removed");
        }
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    /// Turn reporting on or off.
    pub fn set_reporting(&self, enabled: bool) {
        self.reporting.store(enabled, Ordering::SeqCst);
    }

    /// Whether published events are delivered.
    pub fn reporting(&self) -> bool {
        self.reporting.load(Ordering::SeqCst)
    }

    /// Deliver `event` to every subscriber, in subscription order.
    ///
    /// No-op while reporting is off. A panicking subscriber is logged and
    /// skipped; the remaining subscribers still receive the message.
    pub fn publish(&self, event: &SessionEvent) {
        if !self.reporting() {
            return;
        }

        let message = event.message();

        // Snapshot so subscribers may (un)subscribe from inside on_event.
        let targets: Vec<(SubscriberId, Arc<dyn Subscriber>)> = self
            .registry()
            .iter()
            .map(|(id, subscriber)| (*id, Arc::clone(subscriber)))
            .collect();

        debug!(event = %message, subscribers = targets.len(), "Publishing event");

        for (id, subscriber) in targets {
            let delivered = catch_unwind(AssertUnwindSafe(|| subscriber.on_event(&message)));
            if delivered.is_err() {
                warn!(subscriber = %id, event = %message, "Subscriber panicked while handling event");
            }
        }
    }

    fn registry(
        &self,
    ) -> std::sync::MutexGuard<'_, BTreeMap<SubscriberId, Arc<dyn Subscriber>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(false)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("reporting", &self.reporting())
            .finish()
    }
}
