//! roomlinkd - Room-to-service integration provisioning daemon.
//!
//! Binds rooms to external-service integrations, gated by a two-tier
//! authentication scheme and per-room power-level checks.

use roomlinkd::client::{BotRegistry, ChatClient, HttpChatClient, StaticBotRegistry};
use roomlinkd::config::Config;
use roomlinkd::directory::ConnectionDirectory;
use roomlinkd::provisioner::Provisioner;
use roomlinkd::registry::ConnectionTypeRegistry;
use roomlinkd::{http, metrics};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        server = %config.server.name,
        homeserver = %config.homeserver.url,
        "Starting roomlinkd"
    );

    // SECURITY: Refuse to start with an empty/placeholder provisioning secret.
    // Anyone who guesses the secret gets universal provisioning standing.
    if config.provisioning.is_insecure_secret() {
        // Check for explicit override via environment variable (for testing/dev only)
        if std::env::var("ROOMLINKD_ALLOW_INSECURE_SECRET").is_ok() {
            tracing::warn!(
                "INSECURE: Running with weak provisioning secret (allowed via ROOMLINKD_ALLOW_INSECURE_SECRET)"
            );
        } else {
            error!("FATAL: Insecure provisioning secret detected!");
            error!("  The secret authenticates privileged provisioning callers.");
            error!("  A weak or placeholder secret grants attackers full control of every room's connections.");
            error!("");
            error!("  To fix, set a strong secret in config.toml:");
            error!("    [provisioning]");
            error!("    secret = \"<random-32-char-string>\"");
            error!("");
            error!("  Generate a secure secret with:");
            error!("    openssl rand -hex 32");
            error!("");
            error!("  For testing only, set ROOMLINKD_ALLOW_INSECURE_SECRET=1 to bypass this check.");
            return Err(anyhow::anyhow!(
                "Refusing to start with insecure provisioning secret. See error messages above."
            ));
        }
    }

    // Initialize metrics registry
    metrics::init();

    // Wire up the provisioning core
    let client: Arc<dyn ChatClient> = Arc::new(HttpChatClient::new(
        &config.homeserver.url,
        &config.homeserver.access_token,
        Duration::from_secs(config.homeserver.request_timeout),
    ));
    let bots: Arc<dyn BotRegistry> = Arc::new(StaticBotRegistry::new(config.bots.clone()));
    let registry = Arc::new(ConnectionTypeRegistry::from_config(&config.connection_types));
    let directory = Arc::new(ConnectionDirectory::new(
        registry.clone(),
        config.provisioning.reserved_prefixes.clone(),
    ));
    let provisioner = Arc::new(Provisioner::new(
        &config.provisioning,
        client,
        bots,
        registry.clone(),
        directory,
    ));

    info!(
        connection_types = registry.enabled().len(),
        bots = config.bots.len(),
        "Provisioner ready"
    );

    // Operational HTTP endpoints (health + metrics)
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    tokio::spawn(http::run_http_server(metrics_port, provisioner));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
