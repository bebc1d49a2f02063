//! # sfconnect
//!
//! Session manager for Salesforce-style REST object stores.
//!
//! A [`Session`] logs in once with the OAuth 2.0 username/password flow and
//! then runs SOQL queries and record inserts, updates and deletes against
//! the org's REST API. Every call returns immediately; outcomes land in the
//! session status and, when reporting is active, are delivered as string
//! messages to subscribers.
//!
//! ## Lifecycle
//!
//! ```text
//! Created --login--> Authenticating --ok--> Ready <--settle-- Busy
//!    ^                     |                  |                ^
//!    +-------failure-------+                  +--query/crud----+
//! ```
//!
//! At most one data call is in flight per session. A call made while the
//! session is busy is rejected, not queued.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sfconnect::{HttpTransport, Session, SessionConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::with_config(
//!         SessionConfig::from_env()?,
//!         Arc::new(HttpTransport::new()?),
//!     );
//!
//!     session.login("user@example.com", "password")?.await;
//!     session.query_all("Account", &["Id", "Name"], true)?.await;
//!
//!     if let Some(accounts) = session.current_result() {
//!         for account in accounts.records() {
//!             println!("{}", account["Name"]);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - `sfconnect-transport`: the [`Transport`] trait and a reqwest-backed
//!   [`HttpTransport`]
//! - this crate: configuration, authentication, dispatch, result sets,
//!   events and the session state machine

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod record_set;
pub mod session;
pub mod soql;
pub mod testing;

// Re-export commonly used types
pub use auth::{AccessGrant, AuthenticationManager};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use dispatch::{CallKind, RequestDispatcher};
pub use error::{CallFailure, ErrorKind, FailureKind, Result, SessionError};
pub use events::{EventBus, SessionEvent, Subscriber, SubscriberId};
pub use record_set::{Record, RecordSet};
pub use session::{PendingCall, Session, SessionState, SessionStatus};

pub use sfconnect_transport::{
    HttpRequest, HttpResponse, HttpTransport, HttpTransportConfig, Transport, TransportError,
};
