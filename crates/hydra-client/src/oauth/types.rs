//! OAuth 2.0 types exchanged with Hydra.

use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::mode::LoginMode;

/// How long a redirect to the provider may take to come back: 10 minutes.
pub const REDIRECT_LIFETIME: StdDuration = StdDuration::from_secs(600);

/// Successful token endpoint response (RFC 6749 §5.1).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Error body returned by the token endpoint (RFC 6749 §5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Tokens held for a logged-in session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub scope: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Check if the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl From<TokenResponse> for Token {
    fn from(resp: TokenResponse) -> Self {
        Self {
            expires_at: resp.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            access_token: resp.access_token,
            token_type: resp.token_type,
            refresh_token: resp.refresh_token,
            id_token: resp.id_token,
            scope: resp.scope,
        }
    }
}

/// Claims from the OpenID Connect userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An authorization request awaiting its callback.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub state: String,
    pub redirect_uri: String,
    pub mode: LoginMode,
    pub code_verifier: Option<String>,
    pub created_at: Instant,
}

impl PendingAuthorization {
    /// Check if the request has expired (10 minute lifetime).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > REDIRECT_LIFETIME
    }
}

/// A logout redirect awaiting the provider's post-logout callback.
#[derive(Debug, Clone)]
pub struct PendingLogout {
    pub state: String,
    pub created_at: Instant,
}

impl PendingLogout {
    #[must_use]
    pub fn new(state: String) -> Self {
        Self { state, created_at: Instant::now() }
    }

    /// Same lifetime as a pending authorization.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > REDIRECT_LIFETIME
    }
}

/// Query parameters Hydra sends to the authorization callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}
