use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use jupiter_atlas::core::logging;
use jupiter_atlas::server;
use jupiter_atlas::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize()?;
    logging::init(&state.paths);

    tracing::info!(
        "Effective configuration: {}",
        state.config.redact_sensitive_values(&state.config.load_config())
    );

    state.spawn_clock();

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(state.settings.server.port);
    let bind_addr = format!("{}:{}", state.settings.server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
