//! Putaway Trigger
//!
//! Committing stock onto a product (a direct or approved creation) requests a
//! putaway job so the units get shelved. The job is owned downstream; the
//! workflow only asks for it and reports a failed request as a warning.

use std::fmt::{Display, Formatter, Result as FmtResult};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::{ActorId, ProductId, PutawayJobId, SiteId},
    products::Product,
};

/// Where the stock being put away came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PutawaySource {
    /// A privileged user created the product directly.
    #[serde(rename = "Direct Entry")]
    DirectEntry,
    /// A reviewer approved a queued creation.
    #[serde(rename = "Change Approval")]
    ChangeApproval,
}

impl PutawaySource {
    /// Stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PutawaySource::DirectEntry => "Direct Entry",
            PutawaySource::ChangeApproval => "Change Approval",
        }
    }

    /// Parse a stored label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Direct Entry" => Some(Self::DirectEntry),
            "Change Approval" => Some(Self::ChangeApproval),
            _ => None,
        }
    }
}

impl Display for PutawaySource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A request for units to be shelved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutawayRequest {
    /// Product as committed.
    pub product: Product,
    /// Units to shelve.
    pub quantity: u64,
    /// Who caused the stock to arrive.
    pub requested_by: ActorId,
    /// Where it came from.
    pub source: PutawaySource,
}

/// Lifecycle of a putaway job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutawayStatus {
    /// Waiting for a worker.
    Pending,
    /// Being shelved.
    InProgress,
    /// Shelved.
    Completed,
}

impl PutawayStatus {
    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PutawayStatus::Pending => "pending",
            PutawayStatus::InProgress => "in_progress",
            PutawayStatus::Completed => "completed",
        }
    }

    /// Parse a stored status name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// A recorded putaway job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutawayJob {
    /// Job id.
    pub id: PutawayJobId,
    /// Product to shelve.
    pub product_id: ProductId,
    /// Site receiving the units.
    pub site_id: SiteId,
    /// Product name when the job was created.
    pub product_name: String,
    /// Product SKU when the job was created.
    pub product_sku: String,
    /// Units to shelve.
    pub quantity: u64,
    /// Who caused the stock to arrive.
    pub requested_by: ActorId,
    /// Where it came from.
    pub source: PutawaySource,
    /// Lifecycle state.
    pub status: PutawayStatus,
    /// When the job was created.
    pub created_at: Timestamp,
}

impl PutawayJob {
    /// A fresh pending job for `request`.
    #[must_use]
    pub fn pending(request: &PutawayRequest, now: Timestamp) -> Self {
        Self {
            id: PutawayJobId::new(),
            product_id: request.product.id,
            site_id: request.product.site_id,
            product_name: request.product.name.clone(),
            product_sku: request.product.sku.clone(),
            quantity: request.quantity,
            requested_by: request.requested_by,
            source: request.source,
            status: PutawayStatus::Pending,
            created_at: now,
        }
    }
}

/// Putaway job creation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PutawayError {
    #[error("putaway job refused: {0}")]
    Refused(String),

    #[error("putaway service unavailable: {0}")]
    Unavailable(String),
}

/// Downstream receiving-task creation.
#[automock]
#[async_trait]
pub trait PutawayTrigger: Send + Sync {
    /// Request a putaway job.
    async fn create_job(&self, request: PutawayRequest) -> Result<PutawayJobId, PutawayError>;
}
