use axum::{extract::State, response::Html};
use common::utils::template_engine::{context, ProvidesTemplateEngine};

use crate::{error::HtmlError, html_state::HtmlState};

/// Submission form posting a repository locator to `/generate`.
pub async fn index_handler(State(state): State<HtmlState>) -> Result<Html<String>, HtmlError> {
    let page = state
        .template_engine()
        .render("index.html", &context! { title => "Repository documentation" })?;
    Ok(Html(page))
}
