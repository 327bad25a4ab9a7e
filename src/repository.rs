//! Storage Interfaces
//!
//! Every method is atomic at the single-record level. The workflow relies on
//! three storage guarantees:
//!
//! - [`ProductRepository::insert`] and [`ProductRepository::update`] enforce
//!   catalog-wide SKU uniqueness in the same write, failing with
//!   [`StoreError::DuplicateSku`].
//! - [`ProductRepository::update`] applies a [`ProductPatch`] field by field
//!   inside the write, so concurrent edits to different fields all land.
//! - [`ProductRepository::adjust_stock`] is a read-modify-write under the
//!   store's own lock or a conditional `UPDATE`, never a client-side
//!   overwrite, and refuses to take stock below zero.
//! - [`ChangeRequestRepository::compare_and_set_status`] only moves a request
//!   whose current status equals the expected one.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    ids::{ActorId, MovementId, ProductId, RequestId, SiteId},
    products::{Product, ProductPatch},
    requests::{ChangeRequest, RequestStatus, StatusUpdate, StockDelta, StockDirection},
};

/// Storage failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("sku {0} is already in use")]
    DuplicateSku(String),

    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: u64, requested: u64 },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Product persistence.
#[automock]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fetch a product by id.
    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Fetch a product by SKU.
    async fn get_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError>;

    /// Insert a product, failing with [`StoreError::DuplicateSku`] if the SKU is taken.
    async fn insert(&self, product: Product) -> Result<Product, StoreError>;

    /// Overwrite the fields present in `patch` and stamp the approval. Never
    /// touches `stock`. Fails with [`StoreError::NotFound`] if the product no
    /// longer exists.
    async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        approved_by: ActorId,
        at: Timestamp,
    ) -> Result<Product, StoreError>;

    /// Delete a product. Returns whether a row was removed.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Atomically move stock and return the updated product.
    async fn adjust_stock(&self, id: ProductId, delta: StockDelta) -> Result<Product, StoreError>;
}

/// Change request persistence.
#[automock]
#[async_trait]
pub trait ChangeRequestRepository: Send + Sync {
    /// Fetch a request by id.
    async fn get_by_id(&self, id: RequestId) -> Result<Option<ChangeRequest>, StoreError>;

    /// List requests with the given status, oldest first, optionally for one site.
    async fn list_by_status(
        &self,
        status: RequestStatus,
        site: Option<SiteId>,
    ) -> Result<Vec<ChangeRequest>, StoreError>;

    /// Store a new request.
    async fn insert(&self, request: ChangeRequest) -> Result<ChangeRequest, StoreError>;

    /// Move a request from `expected` to `update.target()` and record the decision
    /// fields, only if its status is still `expected`.
    ///
    /// Returns `Ok(false)` when the status had already moved on and
    /// [`StoreError::NotFound`] when the request does not exist.
    async fn compare_and_set_status(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: StatusUpdate,
    ) -> Result<bool, StoreError>;

    /// Remove a request. Returns whether a row was removed.
    async fn delete(&self, id: RequestId) -> Result<bool, StoreError>;
}

/// An appended stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Movement id.
    pub id: MovementId,
    /// Product moved.
    pub product_id: ProductId,
    /// Site the product lives at.
    pub site_id: SiteId,
    /// Product name at the time of the movement.
    pub product_name: String,
    /// In or out.
    pub direction: StockDirection,
    /// Units moved.
    pub quantity: u64,
    /// Why.
    pub reason: String,
    /// Who applied it.
    pub performed_by: ActorId,
    /// When.
    pub performed_at: Timestamp,
}

/// Append-only stock movement ledger.
#[automock]
#[async_trait]
pub trait StockMovementSink: Send + Sync {
    /// Append a movement.
    async fn record(&self, movement: StockMovement) -> Result<(), StoreError>;
}
