use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum HtmlError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("not found")]
    NotFound,
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        match self {
            Self::Template(err) => {
                error!("Failed to render template: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<h1>Something went wrong</h1>"),
                )
                    .into_response()
            }
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Html("<h1>Page not found</h1><p><a href=\"/\">Back to start</a></p>"),
            )
                .into_response(),
        }
    }
}
