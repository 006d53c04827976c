use api_state::ApiState;
use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use routes::{
    download::download_artifact, generate::generate, liveness::live, readiness::ready,
    status::job_status,
};

pub mod api_state;
pub mod error;
mod routes;

/// JSON API, downloads and probes.
pub fn api_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    // Unauthenticated probes for k8s/systemd
    let probes = Router::new()
        .route("/api/ready", get(ready))
        .route("/api/live", get(live));

    let jobs = Router::new()
        .route("/generate", post(generate))
        .route("/api/status/{job_id}", get(job_status))
        .route("/download/{artifact_name}", get(download_artifact));

    probes.merge(jobs)
}
