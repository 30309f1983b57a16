//! Hydra endpoint locations and redirect URL construction.

use url::Url;

use super::mode::{LoginMode, MODE_PARAM};
use super::pkce;

/// Path of the authorization endpoint relative to the public URL.
pub const AUTHORIZATION_PATH: &str = "/oauth2/auth";
/// Path of the token endpoint.
pub const TOKEN_PATH: &str = "/oauth2/token";
/// Path of the OpenID Connect userinfo endpoint.
pub const USERINFO_PATH: &str = "/userinfo";
/// Path of the RP-initiated logout endpoint.
pub const LOGOUT_PATH: &str = "/oauth2/sessions/logout";

/// Endpoints derived from the provider's public URL.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorization: Url,
    pub token: Url,
    pub userinfo: Url,
    pub logout: Url,
}

impl ProviderEndpoints {
    /// Derive all endpoints from the public base URL.
    pub fn from_base(base: &Url) -> Result<Self, url::ParseError> {
        let root = base.as_str().trim_end_matches('/');
        let at = |path: &str| Url::parse(&format!("{root}{path}"));

        Ok(Self {
            authorization: at(AUTHORIZATION_PATH)?,
            token: at(TOKEN_PATH)?,
            userinfo: at(USERINFO_PATH)?,
            logout: at(LOGOUT_PATH)?,
        })
    }
}

/// Parameters of one authorization-code request.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest<'a> {
    pub client_id: &'a str,
    /// Space-delimited scope list.
    pub scope: &'a str,
    pub redirect_uri: &'a Url,
    pub state: &'a str,
    pub audience: Option<&'a str>,
    pub code_challenge: Option<&'a str>,
    pub mode: LoginMode,
}

impl AuthorizationRequest<'_> {
    /// Build the URL the user agent is redirected to.
    #[must_use]
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", self.client_id)
                .append_pair("scope", self.scope)
                .append_pair("redirect_uri", self.redirect_uri.as_str())
                .append_pair("state", self.state);

            if let Some(audience) = self.audience {
                query.append_pair("audience", audience);
            }
            if let Some(challenge) = self.code_challenge {
                query
                    .append_pair("code_challenge", challenge)
                    .append_pair("code_challenge_method", pkce::METHOD_S256);
            }
            if let Some(mode) = self.mode.query_value() {
                query.append_pair(MODE_PARAM, mode);
            }
        }
        url
    }
}

/// Build the RP-initiated logout URL.
///
/// `state` is omitted when there is no browser session to check it against.
#[must_use]
pub fn logout_url(
    endpoint: &Url,
    id_token_hint: Option<&str>,
    post_logout_redirect_uri: &Url,
    state: Option<&str>,
) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        if let Some(hint) = id_token_hint {
            query.append_pair("id_token_hint", hint);
        }
        query.append_pair("post_logout_redirect_uri", post_logout_redirect_uri.as_str());
        if let Some(state) = state {
            query.append_pair("state", state);
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
    }

    #[test]
    fn test_endpoints_from_base() {
        let base = Url::parse("https://hydra.example.com/").unwrap();
        let endpoints = ProviderEndpoints::from_base(&base).unwrap();

        assert_eq!(endpoints.authorization.as_str(), "https://hydra.example.com/oauth2/auth");
        assert_eq!(endpoints.token.as_str(), "https://hydra.example.com/oauth2/token");
        assert_eq!(endpoints.userinfo.as_str(), "https://hydra.example.com/userinfo");
        assert_eq!(endpoints.logout.as_str(), "https://hydra.example.com/oauth2/sessions/logout");
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let base = Url::parse("https://auth.example.com/hydra").unwrap();
        let endpoints = ProviderEndpoints::from_base(&base).unwrap();
        assert_eq!(endpoints.token.as_str(), "https://auth.example.com/hydra/oauth2/token");
    }

    #[test]
    fn test_authorization_url_optional_params() {
        let endpoint = Url::parse("https://hydra.example.com/oauth2/auth").unwrap();
        let redirect = Url::parse("https://app.example.com/authorized").unwrap();
        let request = AuthorizationRequest {
            client_id: "abc",
            scope: "openid profile",
            redirect_uri: &redirect,
            state: "s1",
            audience: Some("https://api.example.com"),
            code_challenge: Some("chal"),
            mode: LoginMode::Signup,
        };

        let params = query_map(&request.to_url(&endpoint));
        assert_eq!(params["scope"], "openid profile");
        assert_eq!(params["audience"], "https://api.example.com");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["mode"], "signup");
    }

    #[test]
    fn test_logout_url() {
        let endpoint = Url::parse("https://hydra.example.com/oauth2/sessions/logout").unwrap();
        let back = Url::parse("https://app.example.com/logged_out").unwrap();

        let params = query_map(&logout_url(&endpoint, Some("idt"), &back, Some("st")));
        assert_eq!(params["id_token_hint"], "idt");
        assert_eq!(params["post_logout_redirect_uri"], "https://app.example.com/logged_out");
        assert_eq!(params["state"], "st");

        let params = query_map(&logout_url(&endpoint, None, &back, None));
        assert!(!params.contains_key("id_token_hint"));
        assert!(!params.contains_key("state"));
    }
}
