//! In-memory putaway board.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use jiff::Timestamp;

use crate::{
    ids::PutawayJobId,
    putaway::{PutawayError, PutawayJob, PutawayRequest, PutawayTrigger},
};

/// Records putaway jobs as pending entries.
#[derive(Debug, Default)]
pub struct InMemoryPutawayBoard {
    jobs: Mutex<Vec<PutawayJob>>,
}

impl InMemoryPutawayBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every job created so far, oldest first.
    #[must_use]
    pub fn jobs(&self) -> Vec<PutawayJob> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PutawayTrigger for InMemoryPutawayBoard {
    async fn create_job(&self, request: PutawayRequest) -> Result<PutawayJobId, PutawayError> {
        if request.quantity == 0 {
            return Err(PutawayError::Refused("nothing to put away".to_string()));
        }

        let job = PutawayJob::pending(&request, Timestamp::now());
        let id = job.id;

        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(job);

        Ok(id)
    }
}
