//! Demo Bitcoin/Lightning wallet server.
//!
//! Holds a single in-memory wallet and proxies Lightning operations to a
//! [`LightningGateway`](vault_common::lightning_gateway::LightningGateway).

pub mod config;
pub mod ledger;
pub mod lnbits;
pub mod mock;
pub mod routes;

use std::sync::Arc;

use tokio::net::TcpListener;

pub use ledger::Ledger;

/// Serve the HTTP API on an already-bound listener until the process exits.
pub async fn serve(listener: TcpListener, ledger: Arc<Ledger>) -> std::io::Result<()> {
    axum::serve(listener, routes::router(ledger)).await
}
