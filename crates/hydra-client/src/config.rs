//! Configuration for the Hydra OAuth2 client.
//!
//! A [`Config`] is built once at startup and handed to
//! [`HydraAdapter::new`](crate::oauth::HydraAdapter::new), which validates it.
//! Nothing reads the process environment after that.

use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable names.
pub mod env {
    /// Public base URL of the Hydra instance.
    pub const HYDRA_PUBLIC_URL: &str = "HYDRA_PUBLIC_URL";

    /// OAuth2 client ID registered with Hydra.
    pub const CLIENT_ID: &str = "OAUTH2_CLIENT_ID";

    /// OAuth2 client secret registered with Hydra.
    pub const CLIENT_SECRET: &str = "OAUTH2_CLIENT_SECRET";

    /// Space-delimited scope list.
    pub const SCOPES: &str = "OAUTH2_SCOPES";

    /// Optional token audience.
    pub const AUDIENCE: &str = "OAUTH2_AUDIENCE";

    /// Dev-only switch permitting plain HTTP and unverified TLS.
    pub const INSECURE_TRANSPORT: &str = "OAUTH2_INSECURE_TRANSPORT";

    /// Enables PKCE (S256) on authorization requests.
    pub const USE_PKCE: &str = "OAUTH2_USE_PKCE";
}

/// Transport defaults.
pub mod defaults {
    use std::time::Duration;

    /// Scope requested when none is configured.
    pub const SCOPES: &str = "openid";

    /// Timeout for calls to the token and userinfo endpoints.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Retries for idempotent provider calls (userinfo).
    pub const MAX_RETRIES: u32 = 3;
}

/// Client configuration.
#[derive(Clone)]
pub struct Config {
    /// Public base URL of the Hydra instance, e.g. `https://hydra.example.com`.
    pub hydra_public_url: String,

    /// OAuth2 client ID.
    pub client_id: String,

    /// OAuth2 client secret.
    pub client_secret: String,

    /// Requested scopes, in order.
    pub scopes: Vec<String>,

    /// Audience to request (empty means none).
    pub audience: Option<String>,

    /// Allow plain HTTP to the provider and skip certificate checks.
    pub insecure_transport: bool,

    /// Send a PKCE challenge with each authorization request.
    pub use_pkce: bool,

    /// Request timeout for provider calls.
    pub request_timeout: Duration,

    /// Connection timeout for provider calls.
    pub connect_timeout: Duration,
}

impl Config {
    /// Create a configuration with the required settings and defaults for the rest.
    #[must_use]
    pub fn new(
        hydra_public_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            hydra_public_url: hydra_public_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: parse_scopes(defaults::SCOPES),
            audience: None,
            insecure_transport: false,
            use_pkce: false,
            request_timeout: defaults::REQUEST_TIMEOUT,
            connect_timeout: defaults::CONNECT_TIMEOUT,
        }
    }

    /// Create a configuration pointing at a mock provider.
    ///
    /// Plain HTTP is allowed and timeouts are short.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            insecure_transport: true,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            ..Self::new(base_url, "test-client", "test-secret")
        }
    }

    /// Replace the scope list with a space-delimited string.
    #[must_use]
    pub fn with_scopes(mut self, scopes: &str) -> Self {
        self.scopes = parse_scopes(scopes);
        self
    }

    /// Set the audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Missing required values are left empty so that validation reports them
    /// by name.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).unwrap_or_default();
        let mut config =
            Self::new(get(env::HYDRA_PUBLIC_URL), get(env::CLIENT_ID), get(env::CLIENT_SECRET));

        if let Some(scopes) = lookup(env::SCOPES).filter(|s| !s.trim().is_empty()) {
            config.scopes = parse_scopes(&scopes);
        }
        config.audience = lookup(env::AUDIENCE).filter(|a| !a.is_empty());
        config.insecure_transport =
            parse_flag(env::INSECURE_TRANSPORT, lookup(env::INSECURE_TRANSPORT))?;
        config.use_pkce = parse_flag(env::USE_PKCE, lookup(env::USE_PKCE))?;

        Ok(config)
    }

    /// Check that the required settings are present and well-formed.
    pub fn validate(&self) -> Result<url::Url, ConfigError> {
        require(env::HYDRA_PUBLIC_URL, &self.hydra_public_url)?;
        require(env::CLIENT_ID, &self.client_id)?;
        require(env::CLIENT_SECRET, &self.client_secret)?;

        let base =
            url::Url::parse(self.hydra_public_url.trim()).map_err(|source| ConfigError::InvalidUrl {
                key: env::HYDRA_PUBLIC_URL,
                value: self.hydra_public_url.clone(),
                source,
            })?;

        match base.scheme() {
            "https" => {}
            "http" if self.insecure_transport => {
                tracing::warn!(url = %base, "Insecure transport enabled; do not use in production");
            }
            "http" => return Err(ConfigError::InsecureTransport { url: base.to_string() }),
            other => {
                return Err(ConfigError::invalid(
                    env::HYDRA_PUBLIC_URL,
                    format!("unsupported scheme '{other}'"),
                ));
            }
        }

        if self.scopes.is_empty() {
            return Err(ConfigError::invalid(env::SCOPES, "at least one scope is required"));
        }

        Ok(base)
    }

    /// Scopes in their external, space-delimited form.
    #[must_use]
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }

    /// Check whether a scope was requested.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// The audience, if one is configured and non-empty.
    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref().filter(|a| !a.is_empty())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("hydra_public_url", &self.hydra_public_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scopes", &self.scopes)
            .field("audience", &self.audience)
            .field("insecure_transport", &self.insecure_transport)
            .field("use_pkce", &self.use_pkce)
            .finish_non_exhaustive()
    }
}

/// Split a space-delimited scope string, preserving order.
#[must_use]
pub fn parse_scopes(scopes: &str) -> Vec<String> {
    scopes.split_whitespace().map(str::to_owned).collect()
}

fn require(key: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing { key });
    }
    Ok(())
}

fn parse_flag(key: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        other => Err(ConfigError::invalid(key, format!("expected a boolean, got '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_full() {
        let config = Config::from_lookup(lookup_from(&[
            (env::HYDRA_PUBLIC_URL, "https://hydra.example.com"),
            (env::CLIENT_ID, "abc123"),
            (env::CLIENT_SECRET, "secret"),
            (env::SCOPES, "openid profile email"),
            (env::AUDIENCE, "https://api.example.com"),
            (env::USE_PKCE, "true"),
        ]))
        .unwrap();

        assert_eq!(config.client_id, "abc123");
        assert_eq!(config.scopes, vec!["openid", "profile", "email"]);
        assert_eq!(config.audience(), Some("https://api.example.com"));
        assert!(config.use_pkce);
        assert!(!config.insecure_transport);
    }

    #[test]
    fn test_default_scope_is_openid() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.scope_param(), "openid");
        assert!(config.has_scope("openid"));
    }

    #[test]
    fn test_empty_audience_is_none() {
        let config = Config::new("https://h", "id", "s").with_audience("");
        assert_eq!(config.audience(), None);
    }

    #[test]
    fn test_bad_flag_rejected() {
        let err = Config::from_lookup(lookup_from(&[(env::INSECURE_TRANSPORT, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(env::INSECURE_TRANSPORT));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::new("https://h", "id", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_parse_scopes_preserves_order() {
        assert_eq!(parse_scopes("  profile   openid "), vec!["profile", "openid"]);
    }
}
