use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use common::{error::AppError, storage::types::job::ArtifactRef};
use tracing::debug;

use crate::{api_state::ApiState, error::ApiError};

/// Streams a packaged archive as an attachment.
pub async fn download_artifact(
    State(state): State<ApiState>,
    Path(artifact_name): Path<String>,
) -> Result<Response, ApiError> {
    if !is_plain_file_name(&artifact_name) {
        debug!(artifact = %artifact_name, "rejected artifact name");
        return Err(ApiError::NotFound(format!("artifact {artifact_name}")));
    }

    let location = ArtifactRef::location_for(&artifact_name);
    let stream = match state.storage.get_stream(&location).await {
        Ok(stream) => stream,
        Err(object_store::Error::NotFound { .. }) => {
            return Err(ApiError::NotFound(format!("artifact {artifact_name}")));
        }
        Err(err) => return Err(AppError::from(err).into()),
    };

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{artifact_name}\""))
        .map_err(|_| ApiError::NotFound(format!("artifact {artifact_name}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// Only bare names produced by the packager are served; anything that could
/// address another location is treated as absent.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '"'])
        && !name.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("documentation_1234.zip"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../config.toml"));
        assert!(!is_plain_file_name("artifacts/x.zip"));
        assert!(!is_plain_file_name("..\\x.zip"));
        assert!(!is_plain_file_name("a\"b.zip"));
    }
}
