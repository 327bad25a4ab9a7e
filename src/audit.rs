//! Audit Log

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::roles::Actor;

/// Audit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Permission checks and refusals.
    Security,
    /// Inventory changes.
    Operations,
}

impl AuditCategory {
    /// Stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AuditCategory::Security => "SECURITY",
            AuditCategory::Operations => "OPERATIONS",
        }
    }
}

impl Display for AuditCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Audit severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSeverity {
    /// Routine.
    Info,
    /// Worth a look.
    Warning,
    /// A failed operation.
    Error,
    /// A security-relevant failure.
    Critical,
}

impl AuditSeverity {
    /// Stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AuditSeverity::Info => "INFO",
            AuditSeverity::Warning => "WARNING",
            AuditSeverity::Error => "ERROR",
            AuditSeverity::Critical => "CRITICAL",
        }
    }
}

impl Display for AuditSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Category.
    pub category: AuditCategory,
    /// Severity.
    pub severity: AuditSeverity,
    /// Short action label, e.g. `change_request.approved`.
    pub action: String,
    /// Human-readable details.
    pub details: String,
    /// Who acted.
    pub actor: Actor,
    /// Request and product ids, error kinds and similar.
    pub metadata: BTreeMap<String, String>,
    /// When.
    pub at: Timestamp,
}

impl AuditEntry {
    /// A new entry stamped now.
    pub fn new(
        category: AuditCategory,
        severity: AuditSeverity,
        action: impl Into<String>,
        details: impl Into<String>,
        actor: &Actor,
    ) -> Self {
        Self {
            category,
            severity,
            action: action.into(),
            details: details.into(),
            actor: actor.clone(),
            metadata: BTreeMap::new(),
            at: Timestamp::now(),
        }
    }

    /// Attach a metadata value.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Append-only audit sink. Nothing it returns is consumed.
#[automock]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append an entry.
    async fn log(&self, entry: AuditEntry);
}

/// Writes audit entries as tracing events under the `stockgate::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn log(&self, entry: AuditEntry) {
        let AuditEntry {
            category,
            severity,
            action,
            details,
            actor,
            metadata,
            ..
        } = entry;

        match severity {
            AuditSeverity::Info => info!(
                target: "stockgate::audit",
                %category, %action, actor = %actor.id, role = %actor.role, ?metadata,
                "{details}"
            ),
            AuditSeverity::Warning => warn!(
                target: "stockgate::audit",
                %category, %action, actor = %actor.id, role = %actor.role, ?metadata,
                "{details}"
            ),
            AuditSeverity::Error | AuditSeverity::Critical => error!(
                target: "stockgate::audit",
                %category, %severity, %action, actor = %actor.id, role = %actor.role, ?metadata,
                "{details}"
            ),
        }
    }
}
