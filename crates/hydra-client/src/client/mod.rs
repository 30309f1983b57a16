//! HTTP client for Hydra's token and userinfo endpoints.
//!
//! Provides:
//! - Authorization-code exchange, sent exactly once (codes are single-use)
//! - Userinfo lookup with retry middleware and exponential backoff
//! - Mapping of OAuth2 error bodies to [`ClientError::Provider`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{Config, defaults};
use crate::error::{ClientError, ClientResult, ConfigError};
use crate::oauth::endpoints::ProviderEndpoints;
use crate::oauth::types::{Token, TokenErrorResponse, TokenResponse, UserInfo};

/// The provider calls the adapter depends on.
///
/// [`HydraClient`] talks to a real Hydra; tests substitute fakes.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> ClientResult<Token>;

    /// Fetch OpenID Connect claims for an access token.
    async fn fetch_userinfo(&self, access_token: &str) -> ClientResult<UserInfo>;
}

/// Hydra API client.
#[derive(Clone)]
pub struct HydraClient {
    /// Plain client for the token endpoint. Never retried.
    token_client: Client,

    /// Client with retry middleware for idempotent calls.
    api_client: ClientWithMiddleware,

    endpoints: ProviderEndpoints,
    client_id: String,
    client_secret: String,
}

impl HydraClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: &Config, endpoints: ProviderEndpoints) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(config.insecure_transport)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(200), Duration::from_secs(5))
            .build_with_max_retries(defaults::MAX_RETRIES);

        let api_client = ClientBuilder::new(client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            token_client: client,
            api_client,
            endpoints,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    /// Endpoints this client talks to.
    #[must_use]
    pub const fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Map non-success statuses to errors.
    async fn handle_response(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        match status.as_u16() {
            400 | 401 | 403 => match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(body) => Err(ClientError::provider(body.error, body.error_description)),
                Err(_) => Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text }),
            },
            500..=599 => Err(ClientError::server(status.as_u16(), text)),
            _ => Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text }),
        }
    }
}

#[async_trait]
impl TokenExchanger for HydraClient {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: Option<&str>,
    ) -> ClientResult<Token> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(verifier) = code_verifier {
            form.push(("code_verifier", verifier));
        }

        tracing::debug!(endpoint = %self.endpoints.token, "Exchanging authorization code");

        let response = self
            .token_client
            .post(self.endpoints.token.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await?;

        let response = Self::handle_response(response).await?;
        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(token.into())
    }

    async fn fetch_userinfo(&self, access_token: &str) -> ClientResult<UserInfo> {
        let response = self
            .api_client
            .get(self.endpoints.userinfo.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::handle_response(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl std::fmt::Debug for HydraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydraClient")
            .field("token_endpoint", &self.endpoints.token.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}
