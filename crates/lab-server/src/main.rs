mod config;
mod wiring;

use std::error::Error;

use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        initial_capital = config.initial_capital,
        global_cap = config.caps.global_cap,
        per_instrument_cap = config.caps.per_instrument_cap,
        per_cluster_cap = config.caps.per_cluster_cap,
        kelly_cap = config.kelly_cap,
        "lab server listening"
    );

    axum::serve(listener, wiring::build_app(&config)).await?;
    Ok(())
}
