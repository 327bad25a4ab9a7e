//! In-memory change request queue.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::{
    ids::{RequestId, SiteId},
    repository::{ChangeRequestRepository, StoreError},
    requests::{ChangeRequest, RequestStatus, StatusUpdate},
};

#[derive(Debug, Default)]
pub struct InMemoryChangeRequestRepository {
    requests: Mutex<FxHashMap<RequestId, ChangeRequest>>,
}

impl InMemoryChangeRequestRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored requests, whatever their status.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FxHashMap<RequestId, ChangeRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ChangeRequestRepository for InMemoryChangeRequestRepository {
    async fn get_by_id(&self, id: RequestId) -> Result<Option<ChangeRequest>, StoreError> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn list_by_status(
        &self,
        status: RequestStatus,
        site: Option<SiteId>,
    ) -> Result<Vec<ChangeRequest>, StoreError> {
        let mut matching: Vec<ChangeRequest> = self
            .lock()
            .values()
            .filter(|request| request.status == status)
            .filter(|request| site.is_none_or(|site| request.site_id == site))
            .cloned()
            .collect();

        matching.sort_by_key(|request| (request.requested_at, request.id));

        Ok(matching)
    }

    async fn insert(&self, request: ChangeRequest) -> Result<ChangeRequest, StoreError> {
        self.lock().insert(request.id, request.clone());

        Ok(request)
    }

    async fn compare_and_set_status(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: StatusUpdate,
    ) -> Result<bool, StoreError> {
        let mut requests = self.lock();

        let request = requests.get_mut(&id).ok_or(StoreError::NotFound)?;

        if request.status != expected {
            return Ok(false);
        }

        request.apply_status(&update);

        Ok(true)
    }

    async fn delete(&self, id: RequestId) -> Result<bool, StoreError> {
        Ok(self.lock().remove(&id).is_some())
    }
}
