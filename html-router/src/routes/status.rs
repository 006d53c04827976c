use axum::{
    extract::{Path, State},
    response::Html,
};
use common::{
    storage::types::job::JobId,
    utils::template_engine::{context, ProvidesTemplateEngine},
};

use crate::{error::HtmlError, html_state::HtmlState};

/// Status page for one job. The page itself holds no job state; it polls
/// `/api/status/{job_id}` until the job is terminal.
pub async fn status_page(
    State(state): State<HtmlState>,
    Path(job_id): Path<String>,
) -> Result<Html<String>, HtmlError> {
    let job_id: JobId = job_id.parse().map_err(|_| HtmlError::NotFound)?;
    let page = state.template_engine().render(
        "status.html",
        &context! {
            title => "Job status",
            job_id => job_id.to_string(),
            poll_interval_ms => 3000,
        },
    )?;
    Ok(Html(page))
}
