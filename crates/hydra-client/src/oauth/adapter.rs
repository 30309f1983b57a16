//! The Hydra client adapter: login, signup, callback and logout flows.
//!
//! The adapter holds no HTTP-framework state. The axum layer in
//! [`crate::server`] maps routes onto these methods. Any other host can do the
//! same.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use url::Url;

use super::endpoints::{AuthorizationRequest, ProviderEndpoints, logout_url};
use super::mode::LoginMode;
use super::pkce::PkcePair;
use super::store::{Session, SessionStore};
use super::types::{CallbackParams, PendingAuthorization, UserInfo};
use crate::client::{HydraClient, TokenExchanger};
use crate::config::Config;
use crate::error::{ConfigError, FlowError, FlowResult};

/// Hook for creating or updating a local user after a successful login.
///
/// It runs only when the `openid` scope is requested. Without it there are no
/// userinfo claims to hand over and the hook is skipped.
#[async_trait]
pub trait LocalUserUpdater: Send + Sync {
    /// Called with the provider's claims and whether the flow was a signup.
    ///
    /// Returning an error rejects the login; no session is stored.
    async fn update_local_user(&self, userinfo: &UserInfo, mode: LoginMode) -> FlowResult<()>;
}

/// Result of a successful authorization callback.
#[derive(Debug, Clone)]
pub struct LoggedIn {
    /// Fresh session ID the session is stored under. The ID the login started
    /// with is discarded.
    pub session_id: String,
    pub session: Session,
}

/// OAuth2 / OpenID Connect client of a Hydra provider.
pub struct HydraAdapter {
    config: Config,
    endpoints: ProviderEndpoints,
    exchanger: Arc<dyn TokenExchanger>,
    store: Arc<dyn SessionStore>,
    user_updater: Option<Arc<dyn LocalUserUpdater>>,
}

impl HydraAdapter {
    /// Validate the configuration and register the consumer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the provider URL, client ID or client
    /// secret is missing or invalid.
    pub fn new(
        config: Config,
        exchanger: Arc<dyn TokenExchanger>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let base = config.validate()?;
        let endpoints = Self::endpoints_for(&config, &base)?;
        Ok(Self::register(config, &base, endpoints, exchanger, store))
    }

    /// Validate the configuration and talk to Hydra over HTTP.
    pub fn connect(config: Config, store: Arc<dyn SessionStore>) -> Result<Self, ConfigError> {
        let base = config.validate()?;
        let endpoints = Self::endpoints_for(&config, &base)?;
        let client = HydraClient::new(&config, endpoints.clone())?;
        Ok(Self::register(config, &base, endpoints, Arc::new(client), store))
    }

    fn register(
        config: Config,
        base: &Url,
        endpoints: ProviderEndpoints,
        exchanger: Arc<dyn TokenExchanger>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        tracing::info!(
            provider = %base,
            client_id = %config.client_id,
            scopes = %config.scope_param(),
            audience = ?config.audience(),
            pkce = config.use_pkce,
            "Registered OAuth2 consumer"
        );

        Self { config, endpoints, exchanger, store, user_updater: None }
    }

    fn endpoints_for(config: &Config, base: &Url) -> Result<ProviderEndpoints, ConfigError> {
        ProviderEndpoints::from_base(base).map_err(|source| ConfigError::InvalidUrl {
            key: crate::config::env::HYDRA_PUBLIC_URL,
            value: config.hydra_public_url.clone(),
            source,
        })
    }

    /// Install a hook that runs after each successful login.
    #[must_use]
    pub fn with_user_updater(mut self, updater: Arc<dyn LocalUserUpdater>) -> Self {
        if !self.config.has_scope("openid") {
            tracing::warn!("Local user updater installed without the openid scope; it will not run");
        }
        self.user_updater = Some(updater);
        self
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Provider endpoints derived from the public URL.
    #[must_use]
    pub const fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Start a login. Returns the provider authorization URL.
    pub async fn login(&self, session_id: &str, redirect_uri: &str) -> FlowResult<Url> {
        self.authorize(session_id, redirect_uri, LoginMode::Login).await
    }

    /// Start a signup. Same as [`login`](Self::login) plus `mode=signup`.
    pub async fn signup(&self, session_id: &str, redirect_uri: &str) -> FlowResult<Url> {
        self.authorize(session_id, redirect_uri, LoginMode::Signup).await
    }

    async fn authorize(
        &self,
        session_id: &str,
        redirect_uri: &str,
        mode: LoginMode,
    ) -> FlowResult<Url> {
        let redirect = Url::parse(redirect_uri)?;
        let state = generate_state();
        let pkce = self.config.use_pkce.then(PkcePair::generate);
        let scope = self.config.scope_param();

        let url = AuthorizationRequest {
            client_id: &self.config.client_id,
            scope: &scope,
            redirect_uri: &redirect,
            state: &state,
            audience: self.config.audience(),
            code_challenge: pkce.as_ref().map(|p| p.challenge.as_str()),
            mode,
        }
        .to_url(&self.endpoints.authorization);

        self.store
            .begin_authorization(
                session_id,
                PendingAuthorization {
                    state,
                    redirect_uri: redirect.into(),
                    mode,
                    code_verifier: pkce.map(|p| p.verifier),
                    created_at: Instant::now(),
                },
            )
            .await;

        tracing::debug!(%mode, "Redirecting to provider for authorization");
        Ok(url)
    }

    /// Handle the provider's redirect back to the authorization callback.
    ///
    /// The code is exchanged at most once. Failures are never retried since
    /// authorization codes are single-use. On success the session is stored
    /// under a newly generated ID, which the caller must hand to the browser.
    pub async fn complete_authorization(
        &self,
        session_id: &str,
        params: CallbackParams,
    ) -> FlowResult<LoggedIn> {
        let pending = self.store.take_authorization(session_id).await;

        if let Some(error) = params.error {
            let description = params.error_description.unwrap_or_default();
            tracing::warn!(%error, %description, "OAuth error from Hydra");
            return Err(FlowError::authorization(format!(
                "error={error}; error_description={description}"
            )));
        }

        let Some(pending) = pending else {
            return Err(FlowError::authorization("No authorization request in progress"));
        };
        if params.state.as_deref() != Some(pending.state.as_str()) {
            return Err(FlowError::authorization("State mismatch"));
        }
        let Some(code) = params.code else {
            return Err(FlowError::authorization("Missing authorization code"));
        };

        let token = self
            .exchanger
            .exchange_code(&code, &pending.redirect_uri, pending.code_verifier.as_deref())
            .await?;

        let user = if self.config.has_scope("openid") {
            Some(self.exchanger.fetch_userinfo(&token.access_token).await?)
        } else {
            None
        };

        if let (Some(updater), Some(info)) = (&self.user_updater, &user) {
            updater.update_local_user(info, pending.mode).await?;
        }

        let session = Session { token, user };
        let new_id = generate_session_id();
        self.store.clear_session(session_id).await;
        self.store.save_session(&new_id, session.clone()).await;

        tracing::info!(
            sub = ?session.user.as_ref().map(|u| u.sub.as_str()),
            mode = %pending.mode,
            "Logged in"
        );
        Ok(LoggedIn { session_id: new_id, session })
    }

    /// Log out locally, then return the provider logout URL.
    ///
    /// The local session is cleared before the redirect is built, so a
    /// failure while building it never leaves the user logged in.
    pub async fn logout(&self, session_id: &str, post_logout_redirect_uri: &str) -> FlowResult<Url> {
        let session = self.store.clear_session(session_id).await;
        if session.is_none() {
            tracing::debug!("Logout requested without a local session");
        }

        let back = Url::parse(post_logout_redirect_uri)?;
        let state = generate_state();
        let id_token = session.as_ref().and_then(|s| s.token.id_token.as_deref());
        let url = logout_url(&self.endpoints.logout, id_token, &back, Some(&state));

        self.store.begin_logout(session_id, state).await;
        Ok(url)
    }

    /// Provider logout URL for a browser without a session.
    ///
    /// Nothing is recorded, so the post-logout callback has no state to match.
    pub fn anonymous_logout(&self, post_logout_redirect_uri: &str) -> FlowResult<Url> {
        let back = Url::parse(post_logout_redirect_uri)?;
        Ok(logout_url(&self.endpoints.logout, None, &back, None))
    }

    /// Handle the provider's redirect after logout.
    ///
    /// Returns `true` if the state matched the logout this session started.
    pub async fn complete_logout(&self, session_id: &str, state: Option<&str>) -> bool {
        let expected = self.store.take_logout(session_id).await;
        let matched = expected.is_some() && expected.as_deref() == state;
        if matched {
            tracing::info!("Logged out");
        } else {
            tracing::warn!("Ignoring logout callback with unexpected state");
        }
        matched
    }

    /// The logged-in user's access token.
    pub async fn access_token(&self, session_id: &str) -> FlowResult<String> {
        self.store
            .current_session(session_id)
            .await
            .map(|s| s.token.access_token)
            .ok_or(FlowError::NotAuthenticated)
    }

    /// The logged-in user's session.
    pub async fn current_session(&self, session_id: &str) -> Option<Session> {
        self.store.current_session(session_id).await
    }
}

impl std::fmt::Debug for HydraAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HydraAdapter")
            .field("config", &self.config)
            .field("has_user_updater", &self.user_updater.is_some())
            .finish_non_exhaustive()
    }
}

/// Generate a random state value using two UUIDs (256 bits).
fn generate_state() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

/// Generate an opaque browser session ID.
#[must_use]
pub fn generate_session_id() -> String {
    generate_state()
}
