//! Crypto Trading Proxy Server
//!
//! Forwards account, order and market data calls to the trading API,
//! signing each one with the configured key.

use anyhow::Result;
use crypto_trader::api::{create_app, AppState};
use crypto_trader::Config;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Override with RUST_LOG, e.g. RUST_LOG=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    // Load configuration
    let config = Config::from_env()?;

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║       CRYPTO TRADING PROXY                                    ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  Upstream: {:<49} ║", config.base_url);
    println!("║  Rate limit: {:<47} ║", format!("{} req/min per client", config.proxy.rate_limit_per_minute));
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let state = AppState::new(&config)?;
    let app = create_app(state);

    let addr: SocketAddr = config.proxy.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Proxy listening on http://{}", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
