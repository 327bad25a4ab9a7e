//! Putaway Jobs Repository

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, PgPool, Postgres, Row, error::ErrorKind, postgres::PgRow, query_as, query_scalar,
};
use stockgate::{
    ids::{ActorId, ProductId, PutawayJobId, SiteId},
    putaway::{
        PutawayError, PutawayJob, PutawayRequest, PutawaySource, PutawayStatus, PutawayTrigger,
    },
};
use uuid::Uuid;

use crate::database::{get_parsed, get_u64, to_i64, violation_kind};

const CREATE_PUTAWAY_JOB_SQL: &str = include_str!("sql/create_putaway_job.sql");
const LIST_PUTAWAY_JOBS_SQL: &str = include_str!("sql/list_putaway_jobs.sql");

/// Creates receiving tasks as rows in `putaway_jobs`.
#[derive(Debug, Clone)]
pub struct PgPutawayTrigger {
    pool: PgPool,
}

impl PgPutawayTrigger {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Jobs in `status`, oldest first, optionally for one site.
    ///
    /// # Errors
    ///
    /// Returns [`PutawayError::Unavailable`] when the query fails.
    pub async fn jobs(
        &self,
        site: Option<SiteId>,
        status: PutawayStatus,
    ) -> Result<Vec<PutawayJob>, PutawayError> {
        let records = query_as::<Postgres, PutawayJobRecord>(LIST_PUTAWAY_JOBS_SQL)
            .bind(site.map(SiteId::into_uuid))
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(putaway_error)?;

        Ok(records.into_iter().map(|record| record.0).collect())
    }
}

fn putaway_error(error: sqlx::Error) -> PutawayError {
    match violation_kind(&error) {
        Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => {
            PutawayError::Refused(error.to_string())
        }
        _ => PutawayError::Unavailable(error.to_string()),
    }
}

struct PutawayJobRecord(PutawayJob);

impl<'r> FromRow<'r, PgRow> for PutawayJobRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(PutawayJob {
            id: PutawayJobId::from_uuid(row.try_get("uuid")?),
            product_id: ProductId::from_uuid(row.try_get("product_uuid")?),
            site_id: SiteId::from_uuid(row.try_get("site_uuid")?),
            product_name: row.try_get("product_name")?,
            product_sku: row.try_get("product_sku")?,
            quantity: get_u64(row, "quantity")?,
            requested_by: ActorId::from_uuid(row.try_get("requested_by")?),
            source: get_parsed(row, "source", PutawaySource::parse)?,
            status: get_parsed(row, "status", PutawayStatus::parse)?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        }))
    }
}

#[async_trait]
impl PutawayTrigger for PgPutawayTrigger {
    #[tracing::instrument(
        name = "putaway.create_job",
        skip(self, request),
        fields(
            product_id = %request.product.id,
            quantity = request.quantity,
            source = %request.source
        ),
        err
    )]
    async fn create_job(&self, request: PutawayRequest) -> Result<PutawayJobId, PutawayError> {
        let job = PutawayJob::pending(&request, Timestamp::now());

        let quantity = to_i64(job.quantity, "quantity")
            .map_err(|error| PutawayError::Refused(error.to_string()))?;

        let uuid: Uuid = query_scalar(CREATE_PUTAWAY_JOB_SQL)
            .bind(job.id.into_uuid())
            .bind(job.product_id.into_uuid())
            .bind(job.site_id.into_uuid())
            .bind(&job.product_name)
            .bind(&job.product_sku)
            .bind(quantity)
            .bind(job.requested_by.into_uuid())
            .bind(job.source.as_str())
            .bind(job.status.as_str())
            .bind(SqlxTimestamp::from(job.created_at))
            .fetch_one(&self.pool)
            .await
            .map_err(putaway_error)?;

        Ok(PutawayJobId::from_uuid(uuid))
    }
}
