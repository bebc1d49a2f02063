//! Route every session event into the tracing log
//!
//! Uses the same environment as the `login` example.
//!
//! ```bash
//! RUST_LOG=info cargo run --example logger
//! ```

use sfconnect::{HttpTransport, Session, SessionConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let session = Session::new(Arc::new(HttpTransport::new()?));
    let id = session.subscribe(Arc::new(|message: &str| info!(event = %message, "Event reported")));
    info!(subscriber = %id, "Logger subscribed to session");

    let mut config = SessionConfig::from_env()?;
    config.reports_enabled = true;
    session.configure(config);

    session
        .login(std::env::var("SF_USERNAME")?, std::env::var("SF_PASSWORD")?)?
        .await;

    session.unsubscribe(id);
    Ok(())
}
