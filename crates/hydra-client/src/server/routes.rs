//! HTTP routes binding the adapter to paths.
//!
//! ```text
//! GET /login       -> 303 to Hydra authorization endpoint
//! GET /signup      -> 303 to Hydra authorization endpoint, mode=signup
//! GET /authorized  -> code exchange, new session cookie, 303 to /
//! GET /logout      -> local session cleared, 303 to Hydra logout
//! GET /logged_out  -> 303 to /
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::FlowError;
use crate::oauth::HydraAdapter;
use crate::oauth::adapter::generate_session_id;
use crate::oauth::types::CallbackParams;

/// Cookie carrying the opaque session ID.
pub const SESSION_COOKIE: &str = "hydra_session";

/// Path of the authorization callback.
pub const AUTHORIZED_PATH: &str = "/authorized";

/// Path of the post-logout callback.
pub const LOGGED_OUT_PATH: &str = "/logged_out";

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub adapter: Arc<HydraAdapter>,
    /// External base URL used to build callback URIs.
    pub base_url: String,
}

impl HttpState {
    fn callback_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Reuse the session cookie or issue a new one.
    fn session(&self, jar: CookieJar) -> (CookieJar, String) {
        if let Some(id) = session_id(&jar) {
            return (jar, id);
        }

        let id = generate_session_id();
        (jar.add(self.session_cookie(id.clone())), id)
    }

    fn session_cookie(&self, id: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.base_url.starts_with("https://"))
            .build()
    }
}

fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_owned())
}

/// Create the HTTP router.
pub fn create_router(adapter: Arc<HydraAdapter>, base_url: String) -> Router {
    let state = Arc::new(HttpState { adapter, base_url });

    Router::new()
        .route("/health", get(health_check))
        .route("/login", get(handle_login))
        .route("/signup", get(handle_signup))
        .route(AUTHORIZED_PATH, get(handle_authorized))
        .route("/logout", get(handle_logout))
        .route(LOGGED_OUT_PATH, get(handle_logged_out))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "hydra-client",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `GET /login`
async fn handle_login(
    State(state): State<Arc<HttpState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), FlowError> {
    let (jar, session_id) = state.session(jar);
    let url = state.adapter.login(&session_id, &state.callback_url(AUTHORIZED_PATH)).await?;
    Ok((jar, Redirect::to(url.as_str())))
}

/// `GET /signup`
async fn handle_signup(
    State(state): State<Arc<HttpState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), FlowError> {
    let (jar, session_id) = state.session(jar);
    let url = state.adapter.signup(&session_id, &state.callback_url(AUTHORIZED_PATH)).await?;
    Ok((jar, Redirect::to(url.as_str())))
}

/// `GET /authorized`
///
/// Callback from Hydra after authentication and consent.
///
/// The pre-login session ID is replaced so a planted cookie never becomes an
/// authenticated one.
async fn handle_authorized(
    State(state): State<Arc<HttpState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect), FlowError> {
    let Some(session_id) = session_id(&jar) else {
        return Err(FlowError::authorization("No session cookie"));
    };

    let logged_in = state.adapter.complete_authorization(&session_id, params).await?;
    let jar = jar.add(state.session_cookie(logged_in.session_id));
    Ok((jar, Redirect::to("/")))
}

/// `GET /logout`
async fn handle_logout(
    State(state): State<Arc<HttpState>>,
    jar: CookieJar,
) -> Result<Redirect, FlowError> {
    let back = state.callback_url(LOGGED_OUT_PATH);
    let url = match session_id(&jar) {
        Some(session_id) => state.adapter.logout(&session_id, &back).await?,
        None => state.adapter.anonymous_logout(&back)?,
    };
    Ok(Redirect::to(url.as_str()))
}

#[derive(Debug, Deserialize)]
struct LoggedOutQuery {
    state: Option<String>,
}

/// `GET /logged_out`
///
/// Callback from Hydra after logout.
async fn handle_logged_out(
    State(state): State<Arc<HttpState>>,
    jar: CookieJar,
    Query(query): Query<LoggedOutQuery>,
) -> (CookieJar, Redirect) {
    let Some(session_id) = session_id(&jar) else {
        return (jar, Redirect::to("/"));
    };

    let jar = if state.adapter.complete_logout(&session_id, query.state.as_deref()).await {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    } else {
        jar
    };
    (jar, Redirect::to("/"))
}
