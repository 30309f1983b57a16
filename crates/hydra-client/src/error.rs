//! Error types for the Hydra OAuth2 client.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Missing or malformed configuration. Fatal at startup.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent or empty
    #[error("Missing required setting {key}")]
    Missing {
        /// Environment variable name of the setting
        key: &'static str,
    },

    /// A URL setting could not be parsed
    #[error("Invalid URL for {key} ('{value}'): {source}")]
    InvalidUrl {
        /// Environment variable name of the setting
        key: &'static str,
        /// The rejected value
        value: String,
        /// Parser error
        source: url::ParseError,
    },

    /// Plain HTTP provider without the insecure-transport flag
    #[error("Provider URL {url} is not https; set OAUTH2_INSECURE_TRANSPORT for development")]
    InsecureTransport {
        /// The rejected URL
        url: String,
    },

    /// Any other invalid value
    #[error("Invalid setting {key}: {message}")]
    Invalid {
        /// Environment variable name of the setting
        key: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ConfigError {
    /// Create an invalid-setting error.
    #[must_use]
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid { key, message: message.into() }
    }
}

fn describe(description: Option<&str>) -> String {
    description.map(|d| format!(" ({d})")).unwrap_or_default()
}

/// Errors from calls to the provider's token and userinfo endpoints.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// OAuth2 error response from the provider (RFC 6749 §5.2)
    #[error("Provider rejected request: {error}{}", describe(.description.as_deref()))]
    Provider {
        /// OAuth2 error code, e.g. `invalid_grant`
        error: String,
        /// Human-readable description, if the provider sent one
        description: Option<String>,
    },

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a provider error.
    #[must_use]
    pub fn provider(error: impl Into<String>, description: Option<String>) -> Self {
        Self::Provider { error: error.into(), description }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if the provider could not be reached or failed on its side.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Middleware(_) | Self::Server { .. })
    }
}

/// Errors surfaced by the login, signup, callback and logout flows.
#[derive(thiserror::Error, Debug)]
pub enum FlowError {
    /// The provider rejected or failed the authorization or token exchange
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// The provider could not be reached
    #[error("Transport error: {0}")]
    Transport(#[source] ClientError),

    /// A redirect URL could not be built
    #[error("Failed to build redirect: {0}")]
    Redirect(String),

    /// No authenticated session
    #[error("Not logged in")]
    NotAuthenticated,
}

impl FlowError {
    /// Create an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    /// Create a redirect error.
    #[must_use]
    pub fn redirect(message: impl Into<String>) -> Self {
        Self::Redirect(message.into())
    }

    /// HTTP status used when the error reaches the browser.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Authorization(_) | Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::Redirect(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ClientError> for FlowError {
    fn from(err: ClientError) -> Self {
        if err.is_transport() {
            Self::Transport(err)
        } else {
            Self::Authorization(err.to_string())
        }
    }
}

impl From<url::ParseError> for FlowError {
    fn from(err: url::ParseError) -> Self {
        Self::Redirect(err.to_string())
    }
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "OAuth flow failed");
        } else {
            tracing::warn!(error = %self, "OAuth flow rejected");
        }
        (status, self.to_string()).into_response()
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_message() {
        let err = ClientError::provider("invalid_grant", Some("code expired".into()));
        assert_eq!(err.to_string(), "Provider rejected request: invalid_grant (code expired)");

        let err = ClientError::provider("invalid_client", None);
        assert_eq!(err.to_string(), "Provider rejected request: invalid_client");
    }

    #[test]
    fn test_client_error_classification() {
        let flow: FlowError = ClientError::server(503, "down").into();
        assert!(matches!(flow, FlowError::Transport(_)));
        assert_eq!(flow.status(), StatusCode::BAD_GATEWAY);

        let flow: FlowError = ClientError::provider("invalid_grant", None).into();
        assert!(matches!(flow, FlowError::Authorization(_)));
        assert_eq!(flow.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_config_error_names_key() {
        let err = ConfigError::Missing { key: "OAUTH2_CLIENT_ID" };
        assert!(err.to_string().contains("OAUTH2_CLIENT_ID"));
    }
}
