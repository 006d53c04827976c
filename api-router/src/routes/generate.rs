use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub url: String,
}

/// A submission from either the HTML form or a JSON client.
#[derive(Debug)]
pub enum GenerateRequest {
    Form(GenerateParams),
    Json(GenerateParams),
}

impl<S> FromRequest<S> for GenerateRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(params) = Json::<GenerateParams>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::ValidationError(rejection.body_text()))?;
            Ok(Self::Json(params))
        } else {
            let Form(params) = Form::<GenerateParams>::from_request(req, state)
                .await
                .map_err(|rejection| ApiError::ValidationError(rejection.body_text()))?;
            Ok(Self::Form(params))
        }
    }
}

/// Accepts a repository locator and schedules a documentation job.
///
/// Form posts are redirected to the status page; JSON clients get the job id.
pub async fn generate(
    State(state): State<ApiState>,
    request: GenerateRequest,
) -> Result<Response, ApiError> {
    let (params, from_form) = match request {
        GenerateRequest::Form(params) => (params, true),
        GenerateRequest::Json(params) => (params, false),
    };

    let handle = state.orchestrator.submit(&params.url)?;
    let job_id = handle.id();
    info!(%job_id, "documentation job accepted");

    let status_page = format!("/status/{job_id}");
    if from_form {
        return Ok(Redirect::to(&status_page).into_response());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "job_id": job_id,
            "status_url": format!("/api/status/{job_id}"),
            "status_page": status_page,
        })),
    )
        .into_response())
}
