//! In-memory Backend
//!
//! Lock-protected implementations of every storage and putaway interface,
//! for embedding the workflow without a database and for tests.

use std::sync::Arc;

use crate::{
    audit::{AuditLog, TracingAuditLog},
    authority::ApprovalAuthority,
    notify::{Notifier, TracingNotifier},
    workflow::{Collaborators, WorkflowEngine},
};

mod movements;
mod products;
mod putaway;
mod requests;
mod sites;

pub use movements::InMemoryStockMovements;
pub use products::InMemoryProductRepository;
pub use putaway::InMemoryPutawayBoard;
pub use requests::InMemoryChangeRequestRepository;
pub use sites::InMemorySiteDirectory;

/// One of each in-memory store, shared by handle.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    pub products: Arc<InMemoryProductRepository>,
    pub requests: Arc<InMemoryChangeRequestRepository>,
    pub movements: Arc<InMemoryStockMovements>,
    pub putaway: Arc<InMemoryPutawayBoard>,
    pub sites: Arc<InMemorySiteDirectory>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collaborators over these stores with the given feedback sinks.
    #[must_use]
    pub fn collaborators(
        &self,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditLog>,
    ) -> Collaborators {
        Collaborators {
            products: self.products.clone(),
            requests: self.requests.clone(),
            movements: self.movements.clone(),
            sites: self.sites.clone(),
            putaway: self.putaway.clone(),
            notifier,
            audit,
        }
    }

    /// An engine over these stores that reports through `tracing`.
    #[must_use]
    pub fn engine(&self, authority: ApprovalAuthority) -> WorkflowEngine {
        WorkflowEngine::new(
            self.collaborators(Arc::new(TracingNotifier), Arc::new(TracingAuditLog)),
            authority,
        )
    }
}
