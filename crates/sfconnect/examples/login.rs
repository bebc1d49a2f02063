//! Log in and print the session status
//!
//! ## Prerequisites
//!
//! A connected app with the username/password OAuth flow enabled, and these
//! variables set in the environment or in a `.env` file:
//!
//! - `SF_CLIENT_ID`, `SF_CLIENT_SECRET`
//! - `SF_SECURITY_TOKEN`
//! - `SF_USERNAME`, `SF_PASSWORD`
//! - `SF_AUTH_ENDPOINT` (optional, defaults to login.salesforce.com)
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=sfconnect=debug cargo run --example login
//! ```

use sfconnect::{HttpTransport, Session, SessionConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = SessionConfig::from_env()?;
    config.reports_enabled = true;
    let username = std::env::var("SF_USERNAME")?;
    let password = std::env::var("SF_PASSWORD")?;

    let session = Session::with_config(config, Arc::new(HttpTransport::new()?));
    session.subscribe(Arc::new(|message: &str| println!("event: {}", message)));

    session.login(username, password)?.await;

    let status = session.status();
    println!("state: {}", status.state);
    match status.instance_url {
        Some(url) => println!("instance: {}", url),
        None => println!("login failed ({}): {}", status.last_error, status.last_error_message),
    }

    Ok(())
}
