//! Session configuration
//!
//! Org-specific settings needed before login: the OAuth token endpoint, the
//! connected app's client id and secret, the user's security token, the grant
//! type, the REST API version, and whether events are reported.

use crate::error::{Result, SessionError};
use secrecy::{ExposeSecret, SecretString};

/// Default OAuth 2.0 token endpoint.
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://login.salesforce.com/services/oauth2/token";

/// Default grant type for the username/password flow.
pub const DEFAULT_GRANT_TYPE: &str = "password";

/// Default REST API version.
pub const DEFAULT_API_VERSION: &str = "v29.0";

/// Configuration for a [`Session`](crate::Session).
///
/// A configuration is either complete (every string field non-empty) or not;
/// [`Session::login`](crate::Session::login) refuses to start with an
/// incomplete one. Filled fields are not validated against the server.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// OAuth token endpoint URL
    pub auth_endpoint: String,

    /// Connected app consumer key
    pub client_id: String,

    /// Connected app consumer secret
    pub client_secret: SecretString,

    /// Personal security token of the user
    pub security_token: SecretString,

    /// OAuth grant type, normally `password`
    pub grant_type: String,

    /// REST API version segment, e.g. `v29.0`
    pub api_version: String,

    /// Whether events are published to subscribers
    pub reports_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_endpoint: DEFAULT_AUTH_ENDPOINT.to_string(),
            client_id: String::new(),
            client_secret: secret(String::new()),
            security_token: secret(String::new()),
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            reports_enabled: false,
        }
    }
}

impl SessionConfig {
    /// Create a configuration from every field at once.
    ///
    /// No validation happens here; see [`SessionConfig::is_complete`].
    pub fn new(
        auth_endpoint: impl Into<String>,
        client_secret: impl Into<String>,
        client_id: impl Into<String>,
        security_token: impl Into<String>,
        grant_type: impl Into<String>,
        api_version: impl Into<String>,
        reports_enabled: bool,
    ) -> Self {
        Self {
            auth_endpoint: auth_endpoint.into(),
            client_id: client_id.into(),
            client_secret: secret(client_secret.into()),
            security_token: secret(security_token.into()),
            grant_type: grant_type.into(),
            api_version: api_version.into(),
            reports_enabled,
        }
    }

    /// Create a builder
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Name of the first required field that is empty, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        let fields: [(&'static str, &str); 6] = [
            ("auth_endpoint", &self.auth_endpoint),
            ("client_secret", self.client_secret.expose_secret()),
            ("client_id", &self.client_id),
            ("security_token", self.security_token.expose_secret()),
            ("grant_type", &self.grant_type),
            ("api_version", &self.api_version),
        ];

        fields
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }

    /// Whether every required field is filled.
    pub fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }

    /// Fail with [`SessionError::IncompleteConfig`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        match self.missing_field() {
            Some(field) => Err(SessionError::IncompleteConfig(field)),
            None => Ok(()),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    /// This will look for:
    /// - `SF_AUTH_ENDPOINT` for the token endpoint (default: login.salesforce.com)
    /// - `SF_CLIENT_ID` and `SF_CLIENT_SECRET` for the connected app
    /// - `SF_SECURITY_TOKEN` for the user's security token
    /// - `SF_GRANT_TYPE` (default: `password`)
    /// - `SF_API_VERSION` (default: `v29.0`)
    /// - `SF_REPORTS` (`true`/`1` enables event reporting)
    #[cfg(feature = "env")]
    pub fn from_env() -> Result<Self> {
        use std::env;

        let _ = dotenvy::dotenv();

        let mut builder = Self::builder();

        if let Ok(endpoint) = env::var("SF_AUTH_ENDPOINT") {
            builder = builder.auth_endpoint(endpoint);
        }
        if let Ok(client_id) = env::var("SF_CLIENT_ID") {
            builder = builder.client_id(client_id);
        }
        if let Ok(client_secret) = env::var("SF_CLIENT_SECRET") {
            builder = builder.client_secret(client_secret);
        }
        if let Ok(token) = env::var("SF_SECURITY_TOKEN") {
            builder = builder.security_token(token);
        }
        if let Ok(grant_type) = env::var("SF_GRANT_TYPE") {
            builder = builder.grant_type(grant_type);
        }
        if let Ok(version) = env::var("SF_API_VERSION") {
            builder = builder.api_version(version);
        }
        if let Ok(reports) = env::var("SF_REPORTS") {
            let enabled = matches!(reports.trim().to_ascii_lowercase().as_str(), "1" | "true");
            builder = builder.reports_enabled(enabled);
        }

        builder.build()
    }
}

fn secret(value: String) -> SecretString {
    SecretString::new(value.into_boxed_str())
}

/// Builder for [`SessionConfig`].
///
/// Unset fields fall back to the [`SessionConfig`] defaults; `build` fails if
/// the result is incomplete.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    auth_endpoint: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    security_token: Option<String>,
    grant_type: Option<String>,
    api_version: Option<String>,
    reports_enabled: bool,
}

impl SessionConfigBuilder {
    /// Set the OAuth token endpoint
    pub fn auth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.auth_endpoint = Some(endpoint.into());
        self
    }

    /// Set the client id
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the client secret
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set the security token
    pub fn security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    /// Set the grant type
    pub fn grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = Some(grant_type.into());
        self
    }

    /// Set the API version
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Enable or disable event reporting
    pub fn reports_enabled(mut self, enabled: bool) -> Self {
        self.reports_enabled = enabled;
        self
    }

    /// Build the configuration, failing if any required field is empty.
    pub fn build(self) -> Result<SessionConfig> {
        let defaults = SessionConfig::default();

        let config = SessionConfig {
            auth_endpoint: self.auth_endpoint.unwrap_or(defaults.auth_endpoint),
            client_id: self.client_id.unwrap_or_default(),
            client_secret: secret(self.client_secret.unwrap_or_default()),
            security_token: secret(self.security_token.unwrap_or_default()),
            grant_type: self.grant_type.unwrap_or(defaults.grant_type),
            api_version: self.api_version.unwrap_or(defaults.api_version),
            reports_enabled: self.reports_enabled,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> SessionConfig {
        SessionConfig::new(
            "https://login.example.com/services/oauth2/token",
            "secret",
            "client",
            "token",
            "password",
            "v29.0",
            true,
        )
    }

    #[test]
    fn test_default_is_incomplete() {
        let config = SessionConfig::default();
        assert!(!config.is_complete());
        assert_eq!(config.grant_type, "password");
        assert_eq!(config.api_version, "v29.0");
        assert!(!config.reports_enabled);
    }

    #[test]
    fn test_complete_config() {
        let config = complete();
        assert!(config.is_complete());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_missing_field_reports_first_empty() {
        let mut config = complete();
        config.client_secret = secret(String::new());
        assert_eq!(config.missing_field(), Some("client_secret"));

        config.api_version = "  ".to_string();
        assert_eq!(config.missing_field(), Some("client_secret"));
        assert_eq!(
            config.validate(),
            Err(SessionError::IncompleteConfig("client_secret"))
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = complete();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("\"secret\""));
        assert!(!debug.contains("\"token\""));
        assert!(debug.contains("client"));
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = SessionConfig::builder()
            .client_id("client")
            .client_secret("secret")
            .security_token("token")
            .build()
            .unwrap();

        assert_eq!(config.auth_endpoint, DEFAULT_AUTH_ENDPOINT);
        assert_eq!(config.grant_type, DEFAULT_GRANT_TYPE);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.client_secret.expose_secret(), "secret");
    }

    #[test]
    fn test_builder_rejects_incomplete() {
        let err = SessionConfig::builder()
            .client_id("client")
            .security_token("token")
            .build()
            .unwrap_err();
        assert_eq!(err, SessionError::IncompleteConfig("client_secret"));
    }

    #[cfg(feature = "env")]
    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("SF_AUTH_ENDPOINT", Some("https://test.example.com/token")),
                ("SF_CLIENT_ID", Some("env-client")),
                ("SF_CLIENT_SECRET", Some("env-secret")),
                ("SF_SECURITY_TOKEN", Some("env-token")),
                ("SF_GRANT_TYPE", None),
                ("SF_API_VERSION", Some("v58.0")),
                ("SF_REPORTS", Some("true")),
            ],
            || {
                let config = SessionConfig::from_env().unwrap();
                assert_eq!(config.auth_endpoint, "https://test.example.com/token");
                assert_eq!(config.client_id, "env-client");
                assert_eq!(config.client_secret.expose_secret(), "env-secret");
                assert_eq!(config.grant_type, "password");
                assert_eq!(config.api_version, "v58.0");
                assert!(config.reports_enabled);
            },
        );
    }

    #[cfg(feature = "env")]
    #[test]
    fn test_from_env_incomplete() {
        temp_env::with_vars(
            [
                ("SF_CLIENT_ID", Some("env-client")),
                ("SF_CLIENT_SECRET", None::<&str>),
                ("SF_SECURITY_TOKEN", Some("env-token")),
            ],
            || {
                let err = SessionConfig::from_env().unwrap_err();
                assert_eq!(err, SessionError::IncompleteConfig("client_secret"));
            },
        );
    }
}
