use anyhow::Context;
use chutes_openai_proxy::{
    config::ProxyConfig,
    handler::{AppState, router},
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "OpenAI-compatible proxy for the Chutes chat backend")]
struct Args {
    /// TOML configuration file; environment variables are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overrides PORT and the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chutes_openai_proxy=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => ProxyConfig::from_file(&path.to_string_lossy())?,
        None => ProxyConfig::from_env()?,
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    info!("Starting Chutes OpenAI proxy...");
    info!("  Listen: {}", config.listen_addr());
    info!("  Upstream: {}{}", config.upstream.base_url, config.upstream.chat_path);
    info!("  Profile: {}", config.upstream.profile);
    info!("  Max retries: {}", config.upstream.max_retries);
    info!("  Auth: {}", if config.auth.is_enabled() { "enabled" } else { "disabled" });

    let addr = config.listen_addr();
    let state = Arc::new(AppState::from_config(config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Proxy ready!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
