//! Audit Logs

mod repository;

pub use repository::PgAuditLog;
