//! Change Requests Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{PgPool, Postgres, query, query_as, query_scalar, types::Json};
use stockgate::{
    ids::{RequestId, SiteId},
    repository::{ChangeRequestRepository, StoreError},
    requests::{ChangeRequest, Decision, RequestStatus, StatusUpdate},
};

use crate::{database::store_error, domain::requests::records::ChangeRequestRecord};

const GET_REQUEST_SQL: &str = include_str!("sql/get_request.sql");
const LIST_REQUESTS_BY_STATUS_SQL: &str = include_str!("sql/list_requests_by_status.sql");
const CREATE_REQUEST_SQL: &str = include_str!("sql/create_request.sql");
const COMPARE_AND_SET_STATUS_SQL: &str = include_str!("sql/compare_and_set_status.sql");
const REQUEST_EXISTS_SQL: &str = include_str!("sql/request_exists.sql");
const DELETE_REQUEST_SQL: &str = include_str!("sql/delete_request.sql");

/// Change request queue backed by the `change_requests` table.
#[derive(Debug, Clone)]
pub struct PgChangeRequestRepository {
    pool: PgPool,
}

impl PgChangeRequestRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChangeRequestRepository for PgChangeRequestRepository {
    async fn get_by_id(&self, id: RequestId) -> Result<Option<ChangeRequest>, StoreError> {
        let record = query_as::<Postgres, ChangeRequestRecord>(GET_REQUEST_SQL)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(record.map(|record| record.0))
    }

    async fn list_by_status(
        &self,
        status: RequestStatus,
        site: Option<SiteId>,
    ) -> Result<Vec<ChangeRequest>, StoreError> {
        let records = query_as::<Postgres, ChangeRequestRecord>(LIST_REQUESTS_BY_STATUS_SQL)
            .bind(status.as_str())
            .bind(site.map(SiteId::into_uuid))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(records.into_iter().map(|record| record.0).collect())
    }

    #[tracing::instrument(
        name = "change_requests.repository.insert",
        skip(self, request),
        fields(request_id = %request.id, change_type = %request.kind()),
        err
    )]
    async fn insert(&self, request: ChangeRequest) -> Result<ChangeRequest, StoreError> {
        let (decided_by, decided_at, reason) = match &request.decision {
            None => (None, None, None),
            Some(Decision::Approved { by, at }) => (Some(by.into_uuid()), Some(*at), None),
            Some(Decision::Rejected { by, at, reason }) => {
                (Some(by.into_uuid()), Some(*at), Some(reason.as_str()))
            }
        };

        let record = query_as::<Postgres, ChangeRequestRecord>(CREATE_REQUEST_SQL)
            .bind(request.id.into_uuid())
            .bind(request.product_id.map(|id| id.into_uuid()))
            .bind(&request.product_name)
            .bind(&request.product_sku)
            .bind(request.site_id.into_uuid())
            .bind(request.kind().as_str())
            .bind(Json(&request.payload))
            .bind(request.requested_by.id.into_uuid())
            .bind(&request.requested_by.name)
            .bind(request.requested_by.role.as_str())
            .bind(SqlxTimestamp::from(request.requested_at))
            .bind(&request.acknowledged_violation)
            .bind(request.status.as_str())
            .bind(decided_by)
            .bind(decided_at.map(SqlxTimestamp::from))
            .bind(reason)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(record.0)
    }

    #[tracing::instrument(
        name = "change_requests.repository.compare_and_set_status",
        skip(self, update),
        fields(target = %update.target()),
        err
    )]
    async fn compare_and_set_status(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: StatusUpdate,
    ) -> Result<bool, StoreError> {
        let (decided_by, decided_at, reason) = match &update {
            StatusUpdate::Approve { by, at } => (Some(by.into_uuid()), Some(*at), None),
            StatusUpdate::Reject { by, at, reason } => {
                (Some(by.into_uuid()), Some(*at), Some(reason.as_str()))
            }
            StatusUpdate::Reopen => (None, None, None),
        };

        let rows_affected = query(COMPARE_AND_SET_STATUS_SQL)
            .bind(id.into_uuid())
            .bind(expected.as_str())
            .bind(update.target().as_str())
            .bind(decided_by)
            .bind(decided_at.map(SqlxTimestamp::from))
            .bind(reason)
            .execute(&self.pool)
            .await
            .map_err(store_error)?
            .rows_affected();

        if rows_affected > 0 {
            return Ok(true);
        }

        let exists: bool = query_scalar(REQUEST_EXISTS_SQL)
            .bind(id.into_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        if exists {
            Ok(false)
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn delete(&self, id: RequestId) -> Result<bool, StoreError> {
        let rows_affected = query(DELETE_REQUEST_SQL)
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(store_error)?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
