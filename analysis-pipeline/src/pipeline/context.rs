use common::{
    error::AppError,
    storage::{
        job_store::JobStore,
        types::job::{ArtifactRef, DegradedUnit, JobId},
    },
};
use tracing::{error, warn};

use super::{analysis::Fragment, config::AnalysisConfig, AnalysisServices};
use crate::{fetcher::WorkingTree, filter::AnalyzableUnit};

pub struct PipelineContext<'a> {
    pub job_id: JobId,
    pub locator: &'a str,
    pub jobs: &'a JobStore,
    pub config: &'a AnalysisConfig,
    pub services: &'a AnalysisServices,
    pub working_tree: Option<WorkingTree>,
    pub units: Vec<AnalyzableUnit>,
    pub fragments: Vec<Fragment>,
    pub overview: Option<String>,
    pub artifact: Option<ArtifactRef>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        job_id: JobId,
        locator: &'a str,
        jobs: &'a JobStore,
        config: &'a AnalysisConfig,
        services: &'a AnalysisServices,
    ) -> Self {
        Self {
            job_id,
            locator,
            jobs,
            config,
            services,
            working_tree: None,
            units: Vec::new(),
            fragments: Vec::new(),
            overview: None,
            artifact: None,
        }
    }

    pub fn working_tree(&self) -> Result<&WorkingTree, AppError> {
        self.working_tree
            .as_ref()
            .ok_or_else(|| AppError::InternalError("working tree expected to be available".into()))
    }

    pub fn take_artifact(&mut self) -> Result<ArtifactRef, AppError> {
        self.artifact.take().ok_or_else(|| {
            AppError::InternalError("artifact expected to be available after packaging".into())
        })
    }

    /// Records a unit that did not get real documentation. Diagnostic only, so a
    /// failed write is logged rather than failing the job.
    pub fn record_degraded(&self, path: &str, reason: String) {
        let unit = DegradedUnit {
            path: path.to_string(),
            reason,
        };
        if let Err(err) = self.jobs.record_degraded(&self.job_id, unit) {
            warn!(job_id = %self.job_id, path, error = %err, "could not record degraded unit");
        }
    }

    /// Deletes the working tree on the blocking pool. Cleanup failures are logged
    /// and never change the job outcome.
    pub async fn release_working_tree(&mut self) {
        let Some(tree) = self.working_tree.take() else {
            return;
        };
        match tokio::task::spawn_blocking(move || tree.remove()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(job_id = %self.job_id, error = %err, "working tree cleanup failed"),
            Err(err) => warn!(job_id = %self.job_id, error = %err, "working tree cleanup panicked"),
        }
    }

    pub fn abort(&mut self, err: AppError) -> AppError {
        error!(
            job_id = %self.job_id,
            locator = self.locator,
            error = %err,
            "analysis pipeline aborted"
        );
        err
    }
}
