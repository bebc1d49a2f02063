//! Session state machine and public operation surface
//!
//! # Module Organization
//!
//! - [`state`] - Lifecycle states and the status snapshot
//! - [`core`] - The [`Session`] handle, login, reporting and the single-flight gate
//! - [`query`] - Queries and access to their results
//! - [`crud`] - Insert, update and delete
//!
//! # Examples
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use sfconnect::{HttpTransport, Session, SessionConfig};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::builder()
//!     .client_id("consumer-key")
//!     .client_secret("consumer-secret")
//!     .security_token("security-token")
//!     .reports_enabled(true)
//!     .build()?;
//! let session = Session::with_config(config, Arc::new(HttpTransport::new()?));
//! session.subscribe(Arc::new(|message: &str| println!("event: {message}")));
//!
//! session.login("user@example.com", "password")?.await;
//! if session.is_ready() {
//!     session.query_all("Account", &["Id", "Name"], true)?.await;
//!     if let Some(result) = session.current_result() {
//!         println!("{} accounts", result.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod crud;
pub mod query;
pub mod state;

// Re-export public types
pub use self::core::{PendingCall, Session};
pub use self::state::{SessionState, SessionStatus};
