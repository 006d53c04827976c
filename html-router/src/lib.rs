pub mod error;
pub mod html_state;
pub mod routes;

use axum::{extract::FromRef, routing::get, Router};
use html_state::HtmlState;
use routes::{index::index_handler, status::status_page};

/// Html routes
pub fn html_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HtmlState: FromRef<S>,
{
    Router::new()
        .route("/", get(index_handler))
        .route("/status/{job_id}", get(status_page))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        html_routes().with_state(HtmlState::new().expect("templates parse"))
    }

    async fn get_page(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_index_renders_submission_form() {
        let (status, body) = get_page("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("action=\"/generate\""));
        assert!(body.contains("name=\"url\""));
    }

    #[tokio::test]
    async fn test_status_page_polls_the_api() {
        let job_id = "0b7c5c1e-4f4e-4a8e-9a43-2f1f0d6f3c11";
        let (status, body) = get_page(&format!("/status/{job_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(job_id));
        assert!(body.contains("/api/status/"));
        assert!(body.contains("3000"));
    }

    #[tokio::test]
    async fn test_malformed_job_id_is_not_found() {
        let (status, _) = get_page("/status/not-a-job").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
