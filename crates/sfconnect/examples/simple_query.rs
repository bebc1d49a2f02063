//! Query accounts, then update the first one
//!
//! Uses the same environment as the `login` example.
//!
//! ```bash
//! cargo run --example simple_query
//! ```

use anyhow::{Context, bail};
use sfconnect::{HttpTransport, Session, SessionConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = SessionConfig::from_env()?;
    let session = Session::with_config(config, Arc::new(HttpTransport::new()?));

    session
        .login(
            std::env::var("SF_USERNAME").context("SF_USERNAME not set")?,
            std::env::var("SF_PASSWORD").context("SF_PASSWORD not set")?,
        )?
        .await;
    if !session.is_ready() {
        bail!("login failed: {}", session.last_error_message());
    }

    session.query_all("Account", &["Id", "Name"], true)?.await;
    let accounts = session
        .current_result()
        .filter(|set| set.is_completed())
        .with_context(|| format!("query failed: {}", session.last_error_message()))?;

    println!("{} accounts", accounts.len());
    for account in accounts.records() {
        println!("  {} {}", account["Id"], account["Name"]);
    }

    if let Some(first) = accounts.record_at(0) {
        let mut renamed = first.clone();
        renamed.insert("Name".to_string(), format!("{} (renamed)", first["Name"]));
        session.update("Account", &renamed)?.await;
        println!("update: {}", session.status().last_error);
    }

    Ok(())
}
