use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use state_machines::state_machine;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AppError::Validation(format!("Invalid job id: {s}")))
    }
}

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum JobStatus {
    #[serde(rename = "PENDING")]
    #[default]
    Pending,
    #[serde(rename = "PROCESSING")]
    Processing,
    #[serde(rename = "COMPLETE")]
    Complete,
    #[serde(rename = "FAILED")]
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finished job's archive lives and how clients download it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Bare file name, used as the `/download/{name}` segment.
    pub name: String,
    /// Object location inside the storage backend.
    pub location: String,
    pub download_url: String,
}

impl ArtifactRef {
    pub const PREFIX: &'static str = "artifacts";

    pub fn for_job(job_id: JobId) -> Self {
        let name = format!("documentation_{job_id}.zip");
        Self {
            location: Self::location_for(&name),
            download_url: format!("/download/{name}"),
            name,
        }
    }

    pub fn location_for(name: &str) -> String {
        format!("{}/{name}", Self::PREFIX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedUnit {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub enum JobTransition {
    StartProcessing,
    Complete(ArtifactRef),
    Fail(String),
}

impl JobTransition {
    fn as_str(&self) -> &'static str {
        match self {
            JobTransition::StartProcessing => "start_processing",
            JobTransition::Complete(_) => "complete",
            JobTransition::Fail(_) => "fail",
        }
    }
}

mod lifecycle {
    use super::state_machine;

    state_machine! {
        name: JobLifecycleMachine,
        initial: Pending,
        states: [Pending, Processing, Complete, Failed],
        events {
            start_processing {
                transition: { from: Pending, to: Processing }
            }
            complete {
                transition: { from: Processing, to: Complete }
            }
            fail {
                transition: { from: Pending, to: Failed }
                transition: { from: Processing, to: Failed }
            }
        }
    }

    pub(super) fn pending() -> JobLifecycleMachine<(), Pending> {
        JobLifecycleMachine::new(())
    }
}

fn invalid_transition(state: JobStatus, transition: &JobTransition) -> AppError {
    AppError::Validation(format!(
        "Invalid job transition: {} -> {}",
        state.as_str(),
        transition.as_str()
    ))
}

fn compute_next_state(state: JobStatus, transition: &JobTransition) -> Result<JobStatus, AppError> {
    use lifecycle::pending;

    match (state, transition) {
        (JobStatus::Pending, JobTransition::StartProcessing) => pending()
            .start_processing()
            .map(|_| JobStatus::Processing)
            .map_err(|_| invalid_transition(state, transition)),
        (JobStatus::Pending, JobTransition::Fail(_)) => pending()
            .fail()
            .map(|_| JobStatus::Failed)
            .map_err(|_| invalid_transition(state, transition)),
        (JobStatus::Processing, JobTransition::Complete(_)) => pending()
            .start_processing()
            .map_err(|_| invalid_transition(state, transition))?
            .complete()
            .map(|_| JobStatus::Complete)
            .map_err(|_| invalid_transition(state, transition)),
        (JobStatus::Processing, JobTransition::Fail(_)) => pending()
            .start_processing()
            .map_err(|_| invalid_transition(state, transition))?
            .fail()
            .map(|_| JobStatus::Failed)
            .map_err(|_| invalid_transition(state, transition)),
        _ => Err(invalid_transition(state, transition)),
    }
}

/// One tracked documentation run for a single repository submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub source_locator: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<ArtifactRef>,
    pub error_message: Option<String>,
    pub degraded_units: Vec<DegradedUnit>,
}

impl Job {
    pub fn new(source_locator: String) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            status: JobStatus::Pending,
            source_locator,
            created_at: now,
            updated_at: now,
            result: None,
            error_message: None,
            degraded_units: Vec::new(),
        }
    }

    /// Applies a lifecycle transition. Status and terminal payload change together
    /// or not at all.
    pub fn apply(&mut self, transition: JobTransition) -> Result<(), AppError> {
        let next = compute_next_state(self.status, &transition)?;

        match transition {
            JobTransition::StartProcessing => {}
            JobTransition::Complete(artifact) => self.result = Some(artifact),
            JobTransition::Fail(message) => self.error_message = Some(message),
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(job: &Job) -> ArtifactRef {
        ArtifactRef::for_job(job.id)
    }

    #[test]
    fn test_new_job_defaults() {
        let job = Job::new("github.com/example/repo".into());

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.source_locator, "github.com/example/repo");
        assert!(job.result.is_none());
        assert!(job.error_message.is_none());
        assert!(job.degraded_units.is_empty());
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = Job::new("repo".into());
        job.apply(JobTransition::StartProcessing)
            .expect("pending -> processing");
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.result.is_none());

        let artifact = artifact(&job);
        job.apply(JobTransition::Complete(artifact.clone()))
            .expect("processing -> complete");
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.result, Some(artifact));
        assert!(job.error_message.is_none());
    }

    #[test]
    fn test_fail_from_pending_and_processing() {
        let mut pending = Job::new("repo".into());
        pending
            .apply(JobTransition::Fail("boom".into()))
            .expect("pending -> failed");
        assert_eq!(pending.status, JobStatus::Failed);
        assert_eq!(pending.error_message.as_deref(), Some("boom"));

        let mut processing = Job::new("repo".into());
        processing
            .apply(JobTransition::StartProcessing)
            .expect("start");
        processing
            .apply(JobTransition::Fail("later".into()))
            .expect("processing -> failed");
        assert_eq!(processing.status, JobStatus::Failed);
        assert!(processing.result.is_none());
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut job = Job::new("repo".into());
        job.apply(JobTransition::StartProcessing).expect("start");
        job.apply(JobTransition::Complete(artifact(&job)))
            .expect("complete");

        let err = job
            .apply(JobTransition::Fail("too late".into()))
            .expect_err("complete is terminal");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(job.status, JobStatus::Complete);
        assert!(job.error_message.is_none());

        assert!(job.apply(JobTransition::StartProcessing).is_err());
        assert_eq!(job.status, JobStatus::Complete);
    }

    #[test]
    fn test_complete_requires_processing() {
        let mut job = Job::new("repo".into());
        let err = job
            .apply(JobTransition::Complete(artifact(&job)))
            .expect_err("pending cannot complete");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.result.is_none());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&JobStatus::Processing).expect("serialize");
        assert_eq!(json, "\"PROCESSING\"");
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }

    #[test]
    fn test_job_id_parsing() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().expect("round trip");
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn test_artifact_ref_layout() {
        let id = JobId::new();
        let artifact = ArtifactRef::for_job(id);
        assert_eq!(artifact.name, format!("documentation_{id}.zip"));
        assert_eq!(artifact.location, format!("artifacts/{}", artifact.name));
        assert_eq!(artifact.download_url, format!("/download/{}", artifact.name));
    }
}
