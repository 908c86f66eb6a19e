//! Verifier configuration module.
//!
//! The dashboard client is constructed from externally supplied connection
//! settings, loaded from environment variables.

use anyhow::Result;

/// Credentials used to authenticate against the dashboard API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No authentication (anonymous access enabled on the dashboard).
    Anonymous,
    /// Service-account or API token, sent as a bearer token.
    Token(String),
    /// Username/password pair, sent as HTTP basic auth.
    Basic {
        /// Dashboard user name.
        username: String,
        /// Dashboard password.
        password: String,
    },
}

/// Grafana connection configuration.
///
/// Configuration values can be set via environment variables:
/// - `GRAFANA_URL`: Base URL of the Grafana instance (default: "http://localhost:3000")
/// - `GRAFANA_TOKEN`: API token; takes precedence over username/password
/// - `GRAFANA_USERNAME` / `GRAFANA_PASSWORD`: basic-auth credentials
#[derive(Debug, Clone)]
pub struct GrafanaConfig {
    /// Base URL of the Grafana instance.
    pub url: String,
    /// Credentials for the dashboard API.
    pub credentials: Credentials,
}

impl GrafanaConfig {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible to match the other
    /// environment-loading constructors in the workspace.
    pub fn from_env() -> Result<Self> {
        let url =
            std::env::var("GRAFANA_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let credentials = if let Ok(token) = std::env::var("GRAFANA_TOKEN") {
            Credentials::Token(token)
        } else {
            match (
                std::env::var("GRAFANA_USERNAME"),
                std::env::var("GRAFANA_PASSWORD"),
            ) {
                (Ok(username), Ok(password)) => Credentials::Basic { username, password },
                _ => Credentials::Anonymous,
            }
        };

        Ok(Self { url, credentials })
    }
}

impl Default for GrafanaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            credentials: Credentials::Anonymous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GrafanaConfig::default();

        assert_eq!(config.url, "http://localhost:3000");
        assert_eq!(config.credentials, Credentials::Anonymous);
    }

    #[test]
    fn test_credentials_variants() {
        let token = Credentials::Token("glsa_abc".to_string());
        assert_ne!(token, Credentials::Anonymous);

        let basic = Credentials::Basic {
            username: "admin".to_string(),
            password: "admin".to_string(),
        };
        assert_ne!(basic, token);
    }
}
