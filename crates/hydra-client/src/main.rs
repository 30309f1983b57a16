//! Hydra OAuth2 Client - Entry Point
//!
//! Serves the login, signup and logout routes against a Hydra provider.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hydra_client::config::Config;
use hydra_client::{HydraAdapter, MemorySessionStore, server};

#[derive(Parser, Debug)]
#[command(name = "hydra-client")]
#[command(about = "OAuth2 / OpenID Connect client for ORY Hydra")]
#[command(version)]
struct Cli {
    /// Public URL of the Hydra instance
    #[arg(long, env = "HYDRA_PUBLIC_URL", default_value = "")]
    hydra_public_url: String,

    /// OAuth2 client ID
    #[arg(long, env = "OAUTH2_CLIENT_ID", default_value = "")]
    client_id: String,

    /// OAuth2 client secret
    #[arg(long, env = "OAUTH2_CLIENT_SECRET", default_value = "", hide_env_values = true)]
    client_secret: String,

    /// Space-delimited scopes; include `openid` for identity tokens and userinfo
    #[arg(long, env = "OAUTH2_SCOPES", default_value = "openid")]
    scopes: String,

    /// Token audience (optional)
    #[arg(long, env = "OAUTH2_AUDIENCE")]
    audience: Option<String>,

    /// Allow plain HTTP and unverified TLS to the provider (development only)
    #[arg(long, env = "OAUTH2_INSECURE_TRANSPORT")]
    insecure_transport: bool,

    /// Send a PKCE challenge with authorization requests
    #[arg(long, env = "OAUTH2_USE_PKCE")]
    use_pkce: bool,

    /// HTTP server port
    #[arg(long, default_value = "8000", env = "PORT")]
    port: u16,

    /// External base URL of this application, used for callback URIs
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:8000")]
    base_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn to_config(&self) -> Config {
        let mut config = Config::new(&self.hydra_public_url, &self.client_id, &self.client_secret)
            .with_scopes(&self.scopes);
        config.audience = self.audience.clone().filter(|a| !a.is_empty());
        config.insecure_transport = self.insecure_transport;
        config.use_pkce = self.use_pkce;
        config
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Hydra OAuth2 client");

    let store = Arc::new(MemorySessionStore::new());
    Arc::clone(&store).start_cleanup_task();

    let adapter = match HydraAdapter::connect(cli.to_config(), store) {
        Ok(adapter) => Arc::new(adapter),
        Err(err) => {
            tracing::error!(error = %err, "Invalid configuration");
            return Err(err.into());
        }
    };

    tracing::info!(port = cli.port, base_url = %cli.base_url, "Running in HTTP mode");
    server::run_http(adapter, cli.port, cli.base_url).await
}
