//! Job Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{GenerationJob, JobManagerPort};
use crate::application::queries::GetJobStatus;

/// GetJobStatus Handler
pub struct GetJobStatusHandler {
    job_manager: Arc<dyn JobManagerPort>,
}

impl GetJobStatusHandler {
    pub fn new(job_manager: Arc<dyn JobManagerPort>) -> Self {
        Self { job_manager }
    }

    pub fn handle(&self, query: GetJobStatus) -> Result<GenerationJob, ApplicationError> {
        self.job_manager
            .get_job(&query.job_id)
            .ok_or_else(|| ApplicationError::validation(format!("Job not found: {}", query.job_id)))
    }
}
