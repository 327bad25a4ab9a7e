//! Mutation intents and workflow outcomes.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    ids::{ProductId, RequestId},
    products::{Product, ProductDraft, ProductPatch},
    putaway::PutawayError,
    repository::StoreError,
    requests::{ChangeKind, ChangePayload, ChangeRequest, StockDirection},
};

/// A proposed catalog mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    /// Create a product.
    CreateProduct(ProductDraft),
    /// Overwrite fields on an existing product.
    EditProduct {
        /// Target product.
        product: ProductId,
        /// Fields to overwrite.
        patch: ProductPatch,
    },
    /// Remove a product.
    DeleteProduct(ProductId),
    /// Move stock in or out of a product.
    AdjustStock {
        /// Target product.
        product: ProductId,
        /// In or out.
        direction: StockDirection,
        /// Units, must be positive.
        quantity: u64,
        /// Why the stock moved.
        reason: String,
    },
}

impl MutationIntent {
    /// The kind of mutation.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            MutationIntent::CreateProduct(_) => ChangeKind::Create,
            MutationIntent::EditProduct { .. } => ChangeKind::Edit,
            MutationIntent::DeleteProduct(_) => ChangeKind::Delete,
            MutationIntent::AdjustStock { .. } => ChangeKind::StockAdjustment,
        }
    }

    /// Target product, if the intent has one.
    #[must_use]
    pub const fn product(&self) -> Option<ProductId> {
        match self {
            MutationIntent::CreateProduct(_) => None,
            MutationIntent::EditProduct { product, .. }
            | MutationIntent::AdjustStock { product, .. } => Some(*product),
            MutationIntent::DeleteProduct(product) => Some(*product),
        }
    }

    /// The frozen payload a change request carries for this intent.
    #[must_use]
    pub fn into_payload(self) -> ChangePayload {
        match self {
            MutationIntent::CreateProduct(proposed) => ChangePayload::Create { proposed },
            MutationIntent::EditProduct { patch, .. } => ChangePayload::Edit { proposed: patch },
            MutationIntent::DeleteProduct(_) => ChangePayload::Delete,
            MutationIntent::AdjustStock {
                direction,
                quantity,
                reason,
                ..
            } => ChangePayload::StockAdjustment {
                direction,
                quantity,
                reason,
            },
        }
    }
}

/// An intent plus whether the proposer already confirmed past a site warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// The proposed mutation.
    pub intent: MutationIntent,
    /// Proceed despite a site-assignment violation.
    pub acknowledge_policy: bool,
}

impl Submission {
    /// A first submission, which stops at the confirmation gate on a violation.
    #[must_use]
    pub const fn new(intent: MutationIntent) -> Self {
        Self {
            intent,
            acknowledge_policy: false,
        }
    }

    /// Re-submit after the proposer chose to proceed anyway.
    #[must_use]
    pub const fn acknowledging_policy(mut self) -> Self {
        self.acknowledge_policy = true;
        self
    }
}

impl From<MutationIntent> for Submission {
    fn from(intent: MutationIntent) -> Self {
        Self::new(intent)
    }
}

/// Side effects that failed after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowWarning {
    /// The putaway job could not be created; the units still need shelving.
    PutawayFailed {
        /// Product that received stock.
        product: ProductId,
        /// Units awaiting putaway.
        quantity: u64,
        /// Why.
        error: PutawayError,
    },
    /// The stock movement ledger did not accept the entry.
    MovementNotRecorded {
        /// Product whose stock moved.
        product: ProductId,
        /// Why.
        error: StoreError,
    },
}

impl Display for WorkflowWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            WorkflowWarning::PutawayFailed {
                product,
                quantity,
                error,
            } => write!(
                f,
                "putaway of {quantity} units for product {product} was not requested: {error}"
            ),
            WorkflowWarning::MovementNotRecorded { product, error } => write!(
                f,
                "stock movement for product {product} was not recorded: {error}"
            ),
        }
    }
}

/// Result of [`submit`](crate::workflow::WorkflowEngine::submit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Committed directly. `product` is `None` after a delete.
    Applied {
        /// Product as committed.
        product: Option<Product>,
        /// Non-fatal side-effect failures.
        warnings: Vec<WorkflowWarning>,
    },
    /// Stored for review; the catalog was not touched.
    Queued(ChangeRequest),
    /// Site policy objects; re-submit with
    /// [`Submission::acknowledging_policy`] to proceed.
    NeedsConfirmation {
        /// What the policy objects to.
        violation: String,
    },
}

/// Result of a review decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The request was approved and its change committed.
    Applied {
        /// The request, now approved.
        request: ChangeRequest,
        /// Product as committed. `None` after a delete.
        product: Option<Product>,
        /// Non-fatal side-effect failures.
        warnings: Vec<WorkflowWarning>,
    },
    /// The request was rejected; the catalog was not touched.
    Rejected(ChangeRequest),
}

impl ReviewOutcome {
    /// The reviewed request.
    #[must_use]
    pub const fn request(&self) -> &ChangeRequest {
        match self {
            ReviewOutcome::Applied { request, .. } | ReviewOutcome::Rejected(request) => request,
        }
    }

    /// Id of the reviewed request.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request().id
    }
}
