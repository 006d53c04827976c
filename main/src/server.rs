use std::{sync::Arc, time::Duration};

use analysis_pipeline::{filter::FilterPolicy, AnalysisPipeline, Orchestrator};
use api_router::{api_routes, api_state::ApiState};
use axum::{extract::FromRef, Router};
use common::{
    storage::{job_store::JobStore, store::StorageManager},
    utils::config::{get_config, AppConfig},
};
use html_router::{html_routes, html_state::HtmlState};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    // Artifact storage shared by the packager and the download route
    let storage = StorageManager::new(&config).await?;
    info!(
        backend = ?storage.backend_kind(),
        base = ?storage.local_base_path(),
        "Artifact storage initialized"
    );

    let app = build_app(&config, storage)?;

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_app(config: &AppConfig, storage: StorageManager) -> Result<Router, Box<dyn std::error::Error>> {
    // Reject bad ignore patterns at startup instead of failing every job
    FilterPolicy::new(config.max_file_bytes, &config.extra_ignore_patterns)?;

    let pipeline = Arc::new(AnalysisPipeline::from_app_config(
        JobStore::new(),
        config,
        storage.clone(),
    ));
    let orchestrator = Orchestrator::new(pipeline, Duration::from_secs(config.job_timeout_secs));

    let api_state = ApiState::new(orchestrator, storage);
    let html_state = HtmlState::new()?;

    Ok(Router::new()
        .merge(api_routes())
        .merge(html_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState {
            api_state,
            html_state,
        }))
}

#[derive(Clone, FromRef)]
struct AppState {
    api_state: ApiState,
    html_state: HtmlState,
}
