//! OAuth 2.0 username/password handshake
//!
//! [`AuthenticationManager::authenticate`] posts the credential form to the
//! configured token endpoint and yields an [`AccessGrant`] (bearer token plus
//! instance URL) or a [`CallFailure`]. It is one-shot: no retries.

use crate::config::SessionConfig;
use crate::dispatch::{classify, extract_message};
use crate::error::CallFailure;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sfconnect_transport::{HttpRequest, Transport};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Marker whose presence in a token response body means failure.
pub const AUTH_ERROR_MARKER: &str = "error";

/// Field carrying the failure reason in a token error body.
pub const AUTH_ERROR_MESSAGE_FIELD: &str = "error_description";

/// Bearer token and instance URL obtained at login.
///
/// Both are always present together. The token is never printed.
#[derive(Clone)]
pub struct AccessGrant {
    token: SecretString,
    instance_url: String,
}

impl AccessGrant {
    /// Grant from a token and instance base URL
    pub fn new(token: impl Into<String>, instance_url: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into().into_boxed_str()),
            instance_url: instance_url.into(),
        }
    }

    /// Instance base URL for data calls
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub(crate) fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrant")
            .field("token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

/// Runs the password-grant handshake over a transport.
#[derive(Clone)]
pub struct AuthenticationManager {
    transport: Arc<dyn Transport>,
}

impl AuthenticationManager {
    /// Manager over `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Exchange user credentials for an [`AccessGrant`].
    ///
    /// The caller guarantees `config` is complete and that no other
    /// authentication is outstanding for the same session.
    pub async fn authenticate(
        &self,
        config: &SessionConfig,
        username: &str,
        password: &str,
    ) -> Result<AccessGrant, CallFailure> {
        let request = credential_request(config, username, password);
        debug!(endpoint = %config.auth_endpoint, "Requesting access token");

        let outcome = classify(
            self.transport.send_http(request).await,
            AUTH_ERROR_MARKER,
            AUTH_ERROR_MESSAGE_FIELD,
        )
        .and_then(|body| parse_grant(&body));

        match &outcome {
            Ok(grant) => info!(instance_url = %grant.instance_url(), "Access token granted"),
            Err(failure) => warn!(kind = ?failure.kind, message = %failure.message, "Authentication failed"),
        }

        outcome
    }
}

impl fmt::Debug for AuthenticationManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationManager").finish_non_exhaustive()
    }
}

/// Form-encoded POST of the credentials to the token endpoint.
pub fn credential_request(config: &SessionConfig, username: &str, password: &str) -> HttpRequest {
    let form = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("username", username)
        .append_pair("password", password)
        .append_pair("client_secret", config.client_secret.expose_secret())
        .append_pair("client_id", &config.client_id)
        .append_pair("grant_type", &config.grant_type)
        .finish();

    HttpRequest::new("POST", config.auth_endpoint.as_str())
        .with_header("Content-Type", "application/x-www-form-urlencoded")
        .with_text_body(form)
}

fn parse_grant(body: &str) -> Result<AccessGrant, CallFailure> {
    let response: TokenResponse = serde_json::from_str(body).map_err(|e| {
        let detail = extract_message(body, "message");
        if detail.is_empty() {
            CallFailure::malformed(format!("unexpected token response: {}", e))
        } else {
            CallFailure::malformed(format!("unexpected token response: {}", detail))
        }
    })?;

    if response.access_token.is_empty() || response.instance_url.is_empty() {
        return Err(CallFailure::malformed(
            "token response has an empty access_token or instance_url",
        ));
    }

    Ok(AccessGrant::new(response.access_token, response.instance_url))
}
