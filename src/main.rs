use std::net::SocketAddr;

use anyhow::Context;
use mock_responder::{init_tracing, Registry, Server, DEFAULT_PORT};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_tracing();

    let registry = Registry::with_defaults();
    let handlers = registry.ids().join(", ");

    let addr: SocketAddr = ([0, 0, 0, 0], DEFAULT_PORT).into();
    let server = Server::bind(addr, registry)
        .await
        .context("start mock responder")?;
    info!(addr = %server.addr(), %handlers, "mock responder listening");

    tokio::signal::ctrl_c()
        .await
        .context("wait for shutdown signal")?;

    info!("shutting down");
    server.close();
    Ok(())
}
