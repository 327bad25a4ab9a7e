//! Audit Logs Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{PgPool, query, types::Json};
use stockgate::audit::{AuditEntry, AuditLog};
use tracing::warn;
use uuid::Uuid;

const CREATE_AUDIT_LOG_SQL: &str = include_str!("sql/create_audit_log.sql");

/// Persists audit entries to `audit_logs`.
///
/// Audit writes never fail the operation being audited; a failed insert is
/// reported as a warning and the entry is dropped.
#[derive(Debug, Clone)]
pub struct PgAuditLog {
    pool: PgPool,
}

impl PgAuditLog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn log(&self, entry: AuditEntry) {
        let result = query(CREATE_AUDIT_LOG_SQL)
            .bind(Uuid::now_v7())
            .bind(entry.category.as_str())
            .bind(entry.severity.as_str())
            .bind(&entry.action)
            .bind(&entry.details)
            .bind(entry.actor.id.into_uuid())
            .bind(&entry.actor.name)
            .bind(entry.actor.role.as_str())
            .bind(Json(&entry.metadata))
            .bind(SqlxTimestamp::from(entry.at))
            .execute(&self.pool)
            .await;

        if let Err(error) = result {
            warn!(action = %entry.action, %error, "failed to write audit entry");
        }
    }
}
