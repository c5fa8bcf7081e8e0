use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vault_server::config::Cli;
use vault_server::Ledger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let gateway = cli.gateway()?;
    info!("Lightning gateway: {}", gateway.gateway_name());

    let ledger = Arc::new(Ledger::new(gateway, cli.provider_timeout()));

    let addr = cli.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Wallet server listening on {}", addr);

    vault_server::serve(listener, ledger)
        .await
        .context("Server failed")
}
