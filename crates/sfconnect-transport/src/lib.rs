//! HTTP transport abstraction layer for sfconnect
//!
//! The session core never talks to the network directly. It hands fully built
//! requests to a [`Transport`] and classifies whatever comes back by content,
//! so any HTTP stack (or a scripted mock) can sit behind the trait.
//!
//! # Architecture
//!
//! - **Transport trait**: Generic interface for any transport implementation
//! - **HTTP transport**: REST client via reqwest

#![deny(unsafe_code)]
#![warn(missing_docs)]
//! - **Error handling**: A single error type for network-level failures
//!
//! # Usage
//!
//! ```ignore
//! use sfconnect_transport::{HttpRequest, HttpTransport, Transport};
//!
//! let transport = HttpTransport::new()?;
//! let request = HttpRequest::new("GET", "https://example.my.salesforce.com/services/data/v29.0/");
//! let response = transport.send_http(request).await?;
//! ```

pub mod error;
pub mod http;
pub mod traits;

// Re-export commonly used types
pub use error::{Result, TransportError};
pub use http::{HttpTransport, HttpTransportConfig};
pub use traits::{HttpRequest, HttpResponse, Transport};
