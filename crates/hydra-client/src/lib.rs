//! Hydra OAuth2 Client
//!
//! Configures an application as an OAuth2 / OpenID Connect client of an
//! ORY Hydra identity provider, with signup and logout on top of the standard
//! authorization-code flow.
//!
//! # Features
//!
//! - **Login / signup**: authorization redirects, signup flagged with `mode=signup`
//! - **Callback**: code exchange, userinfo lookup, optional local-user hook
//! - **Logout**: local session cleared first, then RP-initiated logout at Hydra
//! - **axum router**: `/login`, `/signup`, `/authorized`, `/logout`, `/logged_out`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use hydra_client::{Config, HydraAdapter, MemorySessionStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let adapter = HydraAdapter::connect(config, Arc::new(MemorySessionStore::new()))?;
//!
//!     let url = adapter.login("session-id", "https://app.example.com/authorized").await?;
//!     println!("redirect to {url}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod oauth;
pub mod server;

pub use client::{HydraClient, TokenExchanger};
pub use config::Config;
pub use error::{ClientError, ConfigError, FlowError};
pub use oauth::{HydraAdapter, LoginMode, MemorySessionStore, SessionStore};
