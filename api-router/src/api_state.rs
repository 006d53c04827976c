use analysis_pipeline::Orchestrator;
use common::storage::{job_store::JobStore, store::StorageManager};

#[derive(Clone)]
pub struct ApiState {
    pub jobs: JobStore,
    pub orchestrator: Orchestrator,
    pub storage: StorageManager,
}

impl ApiState {
    /// Status reads go to the same store the orchestrator writes to.
    pub fn new(orchestrator: Orchestrator, storage: StorageManager) -> Self {
        Self {
            jobs: orchestrator.jobs().clone(),
            orchestrator,
            storage,
        }
    }
}
