//! Workflow errors.

use thiserror::Error;

use crate::{
    products::InvalidProduct,
    repository::StoreError,
    requests::RequestStatus,
    roles::Role,
};

/// Things the workflow reports as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// A product.
    Product,
    /// A change request.
    Request,
    /// A site.
    Site,
}

impl Missing {
    const fn as_str(self) -> &'static str {
        match self {
            Missing::Product => "product",
            Missing::Request => "change request",
            Missing::Site => "site",
        }
    }
}

/// Workflow failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The proposed change is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced record does not exist.
    #[error("{} {id} not found", .missing.as_str())]
    NotFound {
        /// What kind of record.
        missing: Missing,
        /// Its id.
        id: String,
    },

    /// The actor's role does not allow the operation.
    #[error("{role} may not {action}")]
    Forbidden {
        /// The actor's role.
        role: Role,
        /// What was refused.
        action: &'static str,
    },

    /// The SKU is held by another product at submission.
    #[error("sku {0} is already in use")]
    DuplicateSku(String),

    /// The SKU was taken between submission and commit.
    #[error("sku {0} was claimed by another product before this change was committed")]
    ConflictSku(String),

    /// The request has left `pending`.
    #[error("change request is already {0}")]
    AlreadyDecided(RequestStatus),

    /// An outgoing adjustment exceeds stock on hand.
    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock {
        /// Units on hand.
        available: u64,
        /// Units asked for.
        requested: u64,
    },

    /// The site assignment breaks policy and was not acknowledged.
    #[error("site assignment violates policy: {0}")]
    PolicyViolation(String),

    /// A collaborator failed or timed out; retrying may succeed.
    #[error("{operation} did not complete: {reason}")]
    UpstreamUnavailable {
        /// The call that failed.
        operation: &'static str,
        /// Why.
        reason: String,
    },
}

impl WorkflowError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, WorkflowError::UpstreamUnavailable { .. })
    }

    /// Short machine-readable kind, used in audit metadata.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            WorkflowError::InvalidInput(_) => "invalid_input",
            WorkflowError::NotFound { .. } => "not_found",
            WorkflowError::Forbidden { .. } => "forbidden",
            WorkflowError::DuplicateSku(_) => "duplicate_sku",
            WorkflowError::ConflictSku(_) => "conflict_sku",
            WorkflowError::AlreadyDecided(_) => "already_decided",
            WorkflowError::InsufficientStock { .. } => "insufficient_stock",
            WorkflowError::PolicyViolation(_) => "policy_violation",
            WorkflowError::UpstreamUnavailable { .. } => "upstream_unavailable",
        }
    }

    pub(crate) fn not_found(missing: Missing, id: impl ToString) -> Self {
        Self::NotFound {
            missing,
            id: id.to_string(),
        }
    }

    pub(crate) const fn forbidden(role: Role) -> Self {
        Self::Forbidden {
            role,
            action: "review change requests",
        }
    }

    /// Map a storage error hit while committing. SKU clashes at commit are
    /// hard conflicts.
    pub(crate) fn from_commit(
        operation: &'static str,
        missing: Missing,
        id: impl ToString,
    ) -> impl FnOnce(StoreError) -> Self {
        let id = id.to_string();

        move |error| match error {
            StoreError::NotFound => Self::NotFound { missing, id },
            StoreError::DuplicateSku(sku) => Self::ConflictSku(sku),
            StoreError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available,
                requested,
            },
            StoreError::Unavailable(reason) => Self::UpstreamUnavailable { operation, reason },
        }
    }

    /// Map a storage error hit while reading.
    pub(crate) fn from_store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |error| match error {
            StoreError::DuplicateSku(sku) => Self::DuplicateSku(sku),
            StoreError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                available,
                requested,
            },
            StoreError::NotFound | StoreError::Unavailable(_) => Self::UpstreamUnavailable {
                operation,
                reason: error.to_string(),
            },
        }
    }
}

impl From<InvalidProduct> for WorkflowError {
    fn from(error: InvalidProduct) -> Self {
        Self::InvalidInput(error.to_string())
    }
}
