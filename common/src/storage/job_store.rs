use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::debug;

use crate::{
    error::AppError,
    storage::types::job::{DegradedUnit, Job, JobId, JobTransition},
};

/// Process-wide map of jobs keyed by id.
///
/// Entries live in sharded maps, so reads and writes for different jobs do not
/// contend. Every mutation runs under the entry's shard lock and returns before
/// any pipeline work resumes; readers always receive a cloned snapshot.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<DashMap<JobId, Job>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly created job. Ids are never reused.
    pub fn insert(&self, job: Job) -> Result<(), AppError> {
        match self.jobs.entry(job.id) {
            Entry::Occupied(_) => Err(AppError::Validation(format!(
                "Job {} already exists",
                job.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(job);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.get(id).map(|entry| entry.value().clone())
    }

    /// Commits a lifecycle transition atomically and returns the new snapshot.
    pub fn transition(&self, id: &JobId, transition: JobTransition) -> Result<Job, AppError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("job {id}")))?;

        let previous = entry.status;
        entry.apply(transition)?;
        debug!(job_id = %id, from = %previous, to = %entry.status, "Job status transition");

        Ok(entry.value().clone())
    }

    /// Records a unit that was skipped or replaced by a placeholder.
    pub fn record_degraded(&self, id: &JobId, unit: DegradedUnit) -> Result<(), AppError> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("job {id}")))?;

        if entry.is_terminal() {
            return Err(AppError::Validation(format!(
                "Job {id} is already {}",
                entry.status
            )));
        }
        entry.degraded_units.push(unit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
