use common::error::AppError;
use futures::{future::BoxFuture, stream, FutureExt, StreamExt};
use state_machines::core::GuardError;
use tracing::{debug, info, instrument, warn};

use super::{
    analysis::{analyze_unit, project_overview, UnitOutcome},
    context::PipelineContext,
    state::{Analyzed, AnalysisMachine, Fetched, Filtered, Packaged, Ready},
};
use crate::filter::{filter_units, FilterPolicy};

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id))]
pub async fn fetch_repository(
    machine: AnalysisMachine<(), Ready>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Fetched>, AppError> {
    let tree = ctx.services.fetcher.fetch(ctx.locator).await?;
    debug!(job_id = %ctx.job_id, root = %tree.root().display(), "working tree ready");
    ctx.working_tree = Some(tree);

    machine
        .fetch()
        .map_err(|(_, guard)| map_guard_error("fetch", &guard))
}

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id))]
pub async fn select_units(
    machine: AnalysisMachine<(), Fetched>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Filtered>, AppError> {
    let policy = FilterPolicy::new(
        ctx.config.max_file_bytes,
        &ctx.config.extra_ignore_patterns,
    )?;
    let root = ctx.working_tree()?.root().to_path_buf();

    let units = tokio::task::spawn_blocking(move || filter_units(&root, &policy)).await??;
    let total_bytes: u64 = units.iter().map(|unit| unit.size).sum();
    info!(
        job_id = %ctx.job_id,
        unit_count = units.len(),
        total_bytes,
        "units selected for analysis"
    );
    ctx.units = units;

    machine
        .filter()
        .map_err(|(_, guard)| map_guard_error("filter", &guard))
}

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id))]
pub async fn analyze_units(
    machine: AnalysisMachine<(), Filtered>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Analyzed>, AppError> {
    let (config, services) = (ctx.config, ctx.services);
    let tuning = &config.tuning;
    let summarizer = services.summarizer.as_ref();
    let units = std::mem::take(&mut ctx.units);

    // Built up front so the stream holds plain futures rather than a borrowing closure.
    let pending: Vec<BoxFuture<'_, UnitOutcome>> = units
        .iter()
        .map(|unit| analyze_unit(summarizer, unit, tuning).boxed())
        .collect();
    let outcomes: Vec<UnitOutcome> = stream::iter(pending)
        .buffered(tuning.unit_concurrency.max(1))
        .collect()
        .await;

    let mut documented = 0_usize;
    for outcome in outcomes {
        match outcome {
            UnitOutcome::Documented(fragment) => {
                documented = documented.saturating_add(1);
                ctx.fragments.push(fragment);
            }
            UnitOutcome::Placeholder { fragment, reason } => {
                warn!(job_id = %ctx.job_id, unit = %fragment.path, %reason, "unit replaced by placeholder");
                ctx.record_degraded(&fragment.path, reason);
                ctx.fragments.push(fragment);
            }
            UnitOutcome::Skipped { path, reason } => {
                warn!(job_id = %ctx.job_id, unit = %path, %reason, "unit skipped");
                ctx.record_degraded(&path, reason);
            }
        }
    }

    if !units.is_empty() && documented == 0 {
        return Err(AppError::AnalysisExhausted(format!(
            "all {} selected files failed analysis",
            units.len()
        )));
    }

    if documented > 0 {
        match project_overview(summarizer, &ctx.fragments, tuning).await {
            Ok(overview) => ctx.overview = Some(overview),
            Err(err) => {
                warn!(job_id = %ctx.job_id, error = %err, "project overview skipped");
            }
        }
    }

    debug!(
        job_id = %ctx.job_id,
        unit_count = units.len(),
        documented,
        degraded = units.len().saturating_sub(documented),
        "analysis finished"
    );

    machine
        .analyze()
        .map_err(|(_, guard)| map_guard_error("analyze", &guard))
}

#[instrument(level = "trace", skip_all, fields(job_id = %ctx.job_id))]
pub async fn package_artifact(
    machine: AnalysisMachine<(), Analyzed>,
    ctx: &mut PipelineContext<'_>,
) -> Result<AnalysisMachine<(), Packaged>, AppError> {
    let fragments = std::mem::take(&mut ctx.fragments);
    let overview = ctx.overview.take();
    let artifact = ctx
        .services
        .packager
        .package(ctx.job_id, fragments, overview)
        .await?;
    ctx.artifact = Some(artifact);

    ctx.release_working_tree().await;

    machine
        .package()
        .map_err(|(_, guard)| map_guard_error("package", &guard))
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid analysis pipeline transition during {event}: {guard:?}"
    ))
}
