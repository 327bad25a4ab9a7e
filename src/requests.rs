//! Change Requests
//!
//! A change request is a frozen snapshot of a proposed catalog mutation. Its
//! payload is never re-derived from the live product; reviewers re-validate
//! it against current state when they decide.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    ids::{ActorId, ProductId, RequestId, SiteId},
    products::{ProductDraft, ProductPatch},
    roles::Actor,
};

/// The four kinds of catalog mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// New product.
    Create,
    /// Field changes on an existing product.
    Edit,
    /// Product removal.
    Delete,
    /// Stock moved in or out.
    StockAdjustment,
}

impl ChangeKind {
    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Edit => "edit",
            ChangeKind::Delete => "delete",
            ChangeKind::StockAdjustment => "stock_adjustment",
        }
    }
}

impl Display for ChangeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Direction of a stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockDirection {
    /// Units received.
    #[serde(rename = "IN")]
    In,
    /// Units removed.
    #[serde(rename = "OUT")]
    Out,
}

impl StockDirection {
    /// Stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StockDirection::In => "IN",
            StockDirection::Out => "OUT",
        }
    }

    /// Parse a stored name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "IN" => Some(Self::In),
            "OUT" => Some(Self::Out),
            _ => None,
        }
    }
}

impl Display for StockDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A signed change to a product's stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDelta {
    /// In or out.
    pub direction: StockDirection,
    /// Units moved, always positive.
    pub quantity: u64,
}

impl StockDelta {
    /// Stock after applying this delta to `stock`, or `None` if it would go
    /// negative or overflow.
    #[must_use]
    pub const fn apply(self, stock: u64) -> Option<u64> {
        match self.direction {
            StockDirection::In => stock.checked_add(self.quantity),
            StockDirection::Out => stock.checked_sub(self.quantity),
        }
    }
}

/// What a change request proposes. Each variant carries only what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "snake_case")]
pub enum ChangePayload {
    /// Create a product from a full snapshot.
    Create {
        /// Proposed product.
        proposed: ProductDraft,
    },
    /// Overwrite the fields present in a partial snapshot.
    Edit {
        /// Proposed field changes.
        proposed: ProductPatch,
    },
    /// Remove the product.
    Delete,
    /// Move stock in or out.
    StockAdjustment {
        /// In or out.
        direction: StockDirection,
        /// Units, always positive.
        quantity: u64,
        /// Why the stock moved.
        reason: String,
    },
}

impl ChangePayload {
    /// The kind of mutation.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            ChangePayload::Create { .. } => ChangeKind::Create,
            ChangePayload::Edit { .. } => ChangeKind::Edit,
            ChangePayload::Delete => ChangeKind::Delete,
            ChangePayload::StockAdjustment { .. } => ChangeKind::StockAdjustment,
        }
    }
}

/// Review state of a change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting review.
    Pending,
    /// Applied to the catalog.
    Approved,
    /// Turned down; the catalog was not touched.
    Rejected,
}

impl RequestStatus {
    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Parse a stored status name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Reviewer decision recorded on a terminal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    /// Approved and applied.
    Approved {
        /// Reviewer.
        by: ActorId,
        /// When.
        at: Timestamp,
    },
    /// Rejected.
    Rejected {
        /// Reviewer.
        by: ActorId,
        /// When.
        at: Timestamp,
        /// Why.
        reason: String,
    },
}

/// Status transition applied by a compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// `pending → approved`.
    Approve {
        /// Reviewer.
        by: ActorId,
        /// When.
        at: Timestamp,
    },
    /// `pending → rejected`.
    Reject {
        /// Reviewer.
        by: ActorId,
        /// When.
        at: Timestamp,
        /// Why.
        reason: String,
    },
    /// `approved → pending`, releasing a claim whose commit failed.
    Reopen,
}

impl StatusUpdate {
    /// Status after the update.
    #[must_use]
    pub const fn target(&self) -> RequestStatus {
        match self {
            StatusUpdate::Approve { .. } => RequestStatus::Approved,
            StatusUpdate::Reject { .. } => RequestStatus::Rejected,
            StatusUpdate::Reopen => RequestStatus::Pending,
        }
    }

    /// Decision fields recorded by the update.
    #[must_use]
    pub fn decision(&self) -> Option<Decision> {
        match self {
            StatusUpdate::Approve { by, at } => Some(Decision::Approved { by: *by, at: *at }),
            StatusUpdate::Reject { by, at, reason } => Some(Decision::Rejected {
                by: *by,
                at: *at,
                reason: reason.clone(),
            }),
            StatusUpdate::Reopen => None,
        }
    }
}

/// A queued catalog mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Request id.
    pub id: RequestId,
    /// Target product; `None` for creations.
    pub product_id: Option<ProductId>,
    /// Product name when the request was submitted.
    pub product_name: String,
    /// Product SKU when the request was submitted.
    pub product_sku: String,
    /// Site context when the request was submitted.
    pub site_id: SiteId,
    /// The proposed mutation.
    pub payload: ChangePayload,
    /// Who proposed it, including their role at the time.
    pub requested_by: Actor,
    /// When it was proposed.
    pub requested_at: Timestamp,
    /// The site-assignment violation the proposer confirmed past, if any.
    pub acknowledged_violation: Option<String>,
    /// Review state.
    pub status: RequestStatus,
    /// Reviewer decision, once terminal.
    pub decision: Option<Decision>,
}

impl ChangeRequest {
    /// The kind of mutation.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        self.payload.kind()
    }

    /// Apply a status transition in place.
    pub fn apply_status(&mut self, update: &StatusUpdate) {
        self.status = update.target();
        self.decision = update.decision();
    }

    /// Reviewer who approved the request.
    #[must_use]
    pub fn approved_by(&self) -> Option<ActorId> {
        match self.decision {
            Some(Decision::Approved { by, .. }) => Some(by),
            _ => None,
        }
    }

    /// Reason given for rejecting the request.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.decision {
            Some(Decision::Rejected { reason, .. }) => Some(reason),
            _ => None,
        }
    }
}
