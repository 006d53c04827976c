use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use common::{
    error::GENERIC_FAILURE_MESSAGE,
    storage::types::job::{DegradedUnit, Job, JobId, JobStatus},
};
use serde::Serialize;
use serde_json::json;

use crate::api_state::ApiState;

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_units: Vec<DegradedUnit>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        let download_url = match job.status {
            JobStatus::Complete => job.result.map(|artifact| artifact.download_url),
            _ => None,
        };
        let error_message = match job.status {
            JobStatus::Failed => Some(
                job.error_message
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            ),
            _ => None,
        };

        Self {
            job_id: job.id,
            status: job.status,
            download_url,
            error_message,
            created_at: job.created_at,
            updated_at: job.updated_at,
            degraded_units: job.degraded_units,
        }
    }
}

/// Current snapshot of a job. Unknown and malformed ids are both NOT_FOUND.
pub async fn job_status(State(state): State<ApiState>, Path(job_id): Path<String>) -> Response {
    let job = job_id
        .parse::<JobId>()
        .ok()
        .and_then(|id| state.jobs.get(&id));

    let mut response = match job {
        Some(job) => Json(JobStatusResponse::from(job)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status": "NOT_FOUND", "job_id": job_id })),
        )
            .into_response(),
    };
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
