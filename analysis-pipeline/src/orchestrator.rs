use std::{sync::Arc, time::Duration};

use common::{
    error::{AppError, GENERIC_FAILURE_MESSAGE},
    storage::{
        job_store::JobStore,
        types::job::{Job, JobId, JobTransition},
    },
};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::pipeline::AnalysisPipeline;

/// Handle to a submitted job. Dropping it leaves the job running.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    supervisor: JoinHandle<()>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.job_id
    }

    /// Waits until the job has reached a terminal state.
    pub async fn wait(self) -> Result<(), JoinError> {
        self.supervisor.await
    }
}

/// Accepts submissions and runs each job's pipeline off the request path.
#[derive(Clone)]
pub struct Orchestrator {
    jobs: JobStore,
    pipeline: Arc<AnalysisPipeline>,
    job_timeout: Duration,
}

impl Orchestrator {
    pub fn new(pipeline: Arc<AnalysisPipeline>, job_timeout: Duration) -> Self {
        Self {
            jobs: pipeline.jobs().clone(),
            pipeline,
            job_timeout,
        }
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Creates a PENDING job and schedules its pipeline. Returns without waiting
    /// on any pipeline work.
    pub fn submit(&self, locator: &str) -> Result<JobHandle, AppError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(AppError::Validation(
                "a repository locator is required".into(),
            ));
        }

        let job = Job::new(locator.to_string());
        let job_id = job.id;
        self.jobs.insert(job)?;
        info!(%job_id, locator, "job submitted");

        let supervisor = tokio::spawn(supervise(
            self.jobs.clone(),
            Arc::clone(&self.pipeline),
            job_id,
            locator.to_string(),
            self.job_timeout,
        ));

        Ok(JobHandle { job_id, supervisor })
    }
}

/// Owns one pipeline run and guarantees the job ends in a terminal state,
/// whether the run succeeds, errors, panics, or overruns its deadline.
async fn supervise(
    jobs: JobStore,
    pipeline: Arc<AnalysisPipeline>,
    job_id: JobId,
    locator: String,
    job_timeout: Duration,
) {
    let runner = Arc::clone(&pipeline);
    let mut run = tokio::spawn(async move { runner.run(job_id, &locator).await });

    let mut timed_out = false;
    let transition = match tokio::time::timeout(job_timeout, &mut run).await {
        Ok(Ok(Ok(artifact))) => JobTransition::Complete(artifact),
        Ok(Ok(Err(err))) => {
            warn!(%job_id, error = %err, "job failed");
            JobTransition::Fail(err.user_message())
        }
        Ok(Err(join_err)) => {
            error!(%job_id, error = %join_err, "job worker crashed");
            JobTransition::Fail(GENERIC_FAILURE_MESSAGE.to_string())
        }
        Err(_) => {
            run.abort();
            timed_out = true;
            let err = AppError::TimeoutExceeded(job_timeout.as_secs());
            warn!(%job_id, error = %err, "job timed out; run aborted");
            JobTransition::Fail(err.user_message())
        }
    };

    // An aborted run drops its working tree once the task is torn down.
    if !run.is_finished() {
        let _ = run.await;
    }

    // The run may have stored its archive just before the deadline; a FAILED
    // job must not leave a downloadable artifact behind.
    if timed_out {
        if let Err(err) = pipeline.discard_artifact(job_id).await {
            warn!(%job_id, error = %err, "could not discard artifact of timed out job");
        }
    }

    match jobs.transition(&job_id, transition) {
        Ok(job) => info!(%job_id, status = %job.status, "job finished"),
        Err(err) => error!(%job_id, error = %err, "could not record job outcome"),
    }
}
