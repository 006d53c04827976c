mod analysis;
mod config;
mod context;
mod services;
mod stages;
mod state;

pub use analysis::{file_tree, retry_strategy, Fragment, UnitOutcome};
pub use config::{AnalysisConfig, AnalysisTuning};
pub use services::AnalysisServices;

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use common::{
    error::AppError,
    storage::{
        job_store::JobStore,
        store::StorageManager,
        types::job::{ArtifactRef, JobId, JobTransition},
    },
    utils::config::AppConfig,
};
use tracing::info;

use self::{
    context::PipelineContext,
    stages::{analyze_units, fetch_repository, package_artifact, select_units},
    state::ready,
};
use crate::{fetcher::GitFetcher, packager::Packager, summarizer::OpenAiSummarizer};

/// Runs clone, filter, analysis and packaging for one job.
///
/// The pipeline only moves a job into PROCESSING; the terminal transition is
/// committed by whoever supervises the run.
pub struct AnalysisPipeline {
    jobs: JobStore,
    config: AnalysisConfig,
    services: AnalysisServices,
}

impl AnalysisPipeline {
    pub fn new(jobs: JobStore, config: AnalysisConfig, services: AnalysisServices) -> Self {
        Self {
            jobs,
            config,
            services,
        }
    }

    /// Production wiring: git for fetching, OpenAI for summaries.
    pub fn from_app_config(jobs: JobStore, app_config: &AppConfig, storage: StorageManager) -> Self {
        let services = AnalysisServices::new(
            Arc::new(GitFetcher::new(
                app_config.git_binary.clone(),
                app_config.work_dir.as_ref().map(PathBuf::from),
            )),
            Arc::new(OpenAiSummarizer::from_config(app_config)),
            Packager::new(storage),
        );
        Self::new(jobs, AnalysisConfig::from_app_config(app_config), services)
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Drops the stored archive of `job_id`; used when a run is abandoned.
    pub async fn discard_artifact(&self, job_id: JobId) -> Result<(), AppError> {
        self.services.packager.discard(job_id).await
    }

    fn duration_millis(duration: Duration) -> u64 {
        u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
    }

    #[tracing::instrument(skip_all, fields(job_id = %job_id, locator = %locator))]
    pub async fn run(&self, job_id: JobId, locator: &str) -> Result<ArtifactRef, AppError> {
        self.jobs.transition(&job_id, JobTransition::StartProcessing)?;

        let mut ctx = PipelineContext::new(
            job_id,
            locator,
            &self.jobs,
            &self.config,
            &self.services,
        );

        match Self::run_stages(&mut ctx).await {
            Ok(artifact) => Ok(artifact),
            Err(err) => {
                ctx.release_working_tree().await;
                Err(ctx.abort(err))
            }
        }
    }

    async fn run_stages(ctx: &mut PipelineContext<'_>) -> Result<ArtifactRef, AppError> {
        let machine = ready();
        let pipeline_started = Instant::now();

        let stage_start = Instant::now();
        let machine = fetch_repository(machine, ctx).await?;
        let fetch_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = select_units(machine, ctx).await?;
        let filter_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let machine = analyze_units(machine, ctx).await?;
        let analyze_duration = stage_start.elapsed();

        let stage_start = Instant::now();
        let _machine = package_artifact(machine, ctx).await?;
        let package_duration = stage_start.elapsed();

        info!(
            job_id = %ctx.job_id,
            total_ms = Self::duration_millis(pipeline_started.elapsed()),
            fetch_ms = Self::duration_millis(fetch_duration),
            filter_ms = Self::duration_millis(filter_duration),
            analyze_ms = Self::duration_millis(analyze_duration),
            package_ms = Self::duration_millis(package_duration),
            "analysis pipeline finished"
        );

        ctx.take_artifact()
    }
}
