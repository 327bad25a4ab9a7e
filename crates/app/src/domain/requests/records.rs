//! Change Request Records

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Row, postgres::PgRow, types::Json};
use stockgate::{
    ids::{ActorId, ProductId, RequestId, SiteId},
    requests::{ChangePayload, ChangeRequest, Decision, RequestStatus},
    roles::{Actor, Role},
};
use thiserror::Error;
use uuid::Uuid;

use crate::database::{column_error, get_parsed};

#[derive(Debug, Error)]
#[error("{status} request is missing its decision fields")]
struct MissingDecision {
    status: RequestStatus,
}

/// A `change_requests` row.
#[derive(Debug, Clone)]
pub(crate) struct ChangeRequestRecord(pub(crate) ChangeRequest);

fn decision(row: &PgRow, status: RequestStatus) -> sqlx::Result<Option<Decision>> {
    if status == RequestStatus::Pending {
        return Ok(None);
    }

    let by = row.try_get::<Option<Uuid>, _>("decided_by")?;
    let at = row.try_get::<Option<SqlxTimestamp>, _>("decided_at")?;
    let reason = row.try_get::<Option<String>, _>("rejection_reason")?;

    let (Some(by), Some(at)) = (by, at) else {
        return Err(column_error("decided_by", MissingDecision { status }));
    };

    let (by, at) = (ActorId::from_uuid(by), at.to_jiff());

    match (status, reason) {
        (RequestStatus::Rejected, Some(reason)) => Ok(Some(Decision::Rejected { by, at, reason })),
        (RequestStatus::Rejected, None) => {
            Err(column_error("rejection_reason", MissingDecision { status }))
        }
        _ => Ok(Some(Decision::Approved { by, at })),
    }
}

impl<'r> FromRow<'r, PgRow> for ChangeRequestRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status = get_parsed(row, "status", RequestStatus::parse)?;
        let Json(payload) = row.try_get::<Json<ChangePayload>, _>("payload")?;

        Ok(Self(ChangeRequest {
            id: RequestId::from_uuid(row.try_get("uuid")?),
            product_id: row
                .try_get::<Option<Uuid>, _>("product_uuid")?
                .map(ProductId::from_uuid),
            product_name: row.try_get("product_name")?,
            product_sku: row.try_get("product_sku")?,
            site_id: SiteId::from_uuid(row.try_get("site_uuid")?),
            payload,
            requested_by: Actor::new(
                ActorId::from_uuid(row.try_get("requested_by")?),
                row.try_get::<String, _>("requested_by_name")?,
                get_parsed(row, "requested_by_role", Role::parse)?,
            ),
            requested_at: row.try_get::<SqlxTimestamp, _>("requested_at")?.to_jiff(),
            acknowledged_violation: row.try_get("acknowledged_violation")?,
            status,
            decision: decision(row, status)?,
        }))
    }
}
