//! OAuth 2.0 / OpenID Connect client flows against ORY Hydra.
//!
//! ## Supported Standards
//! - RFC 6749: Authorization Code Grant
//! - RFC 7636: PKCE (S256), optional
//! - OpenID Connect Core: userinfo endpoint
//! - OpenID Connect RP-Initiated Logout
//!
//! Signup is a login with `mode=signup` appended, which Hydra's login
//! provider interprets.

pub mod adapter;
pub mod endpoints;
pub mod mode;
pub mod pkce;
pub mod store;
pub mod types;

pub use adapter::{HydraAdapter, LocalUserUpdater, LoggedIn};
pub use mode::LoginMode;
pub use store::{MemorySessionStore, Session, SessionStore};
