use anyhow::Context;
use edital_chunker::{config, routes, services};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = config::AppConfig::from_env().context("failed to load configuration")?;

    let llm_client = Arc::new(services::llm::LLMClient::new(
        &config.llm_api_url,
        config.llm_api_key.as_deref(),
        &config.llm_model,
    )?);

    let state = routes::AppState {
        chunker: services::chunker::TitleChunker::new(config.chunker.clone()),
        llm_client,
    };
    tracing::debug!(chunker = ?state.chunker.config(), "chunker configured");

    let app = routes::router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
