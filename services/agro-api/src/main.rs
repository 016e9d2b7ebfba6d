use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use agro_api::routes_info::SERVICE_NAME;
use agro_api::{build_router, load_model, AppConfig, AppState};

#[cfg(feature = "llama")]
fn engine_loader() -> inference::LlamaLoader {
    inference::LlamaLoader
}

#[cfg(not(feature = "llama"))]
fn engine_loader() -> inference::UnavailableLoader {
    inference::UnavailableLoader
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting {SERVICE_NAME}");

    let cfg = AppConfig::from_env()?;

    // --- Model: load before the listener exists ---
    let loader = engine_loader();
    let model = tokio::task::block_in_place(|| load_model(&loader, &cfg));
    if !model.is_loaded() {
        warn!("server starting WITHOUT a model; every /chat request will return 503");
    }

    let app_state = Arc::new(AppState::new(model, cfg.model_path.clone()));
    let app = build_router(app_state);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("{SERVICE_NAME} listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
