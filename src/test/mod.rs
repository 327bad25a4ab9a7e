//! Test context over the in-memory backend.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use jiff::Timestamp;

use crate::{
    audit::{AuditEntry, AuditLog},
    authority::ApprovalAuthority,
    ids::{ActorId, ProductId, SiteId},
    memory::InMemoryBackend,
    notify::{NotificationKind, Notifier},
    products::{Product, ProductDraft},
    putaway::PutawayTrigger,
    repository::{ChangeRequestRepository, ProductRepository, StockMovementSink, StoreError},
    roles::SiteKind,
    sites::SiteDirectory,
    workflow::{Collaborators, WorkflowEngine},
};

pub(crate) mod actors {
    use crate::{
        ids::ActorId,
        roles::{Actor, Role},
    };

    fn actor(name: &str, role: Role) -> Actor {
        Actor::new(ActorId::new(), name, role)
    }

    pub(crate) fn super_admin() -> Actor {
        actor("Selam", Role::SuperAdmin)
    }

    pub(crate) fn admin() -> Actor {
        actor("Dawit", Role::Admin)
    }

    pub(crate) fn pos() -> Actor {
        actor("Hana", Role::Pos)
    }

    pub(crate) fn picker() -> Actor {
        actor("Yonas", Role::Picker)
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingNotifier {
    messages: Mutex<Vec<(NotificationKind, String)>>,
}

impl RecordingNotifier {
    pub(crate) fn messages(&self) -> Vec<(NotificationKind, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, message.to_string()));
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditLog {
    pub(crate) fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn actions(&self) -> Vec<String> {
        self.entries().into_iter().map(|entry| entry.action).collect()
    }
}

#[async_trait]
impl AuditLog for RecordingAuditLog {
    async fn log(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

/// An engine over fresh in-memory stores, with handles on every store.
#[derive(Clone)]
pub(crate) struct TestContext {
    pub engine: WorkflowEngine,
    pub backend: InMemoryBackend,
    pub products: Arc<crate::memory::InMemoryProductRepository>,
    pub requests: Arc<crate::memory::InMemoryChangeRequestRepository>,
    pub movements: Arc<crate::memory::InMemoryStockMovements>,
    pub putaway: Arc<crate::memory::InMemoryPutawayBoard>,
    pub notifier: Arc<RecordingNotifier>,
    pub audit: Arc<RecordingAuditLog>,
    collaborators: Collaborators,
    authority: Arc<ApprovalAuthority>,
}

impl TestContext {
    pub(crate) fn new() -> Self {
        let backend = InMemoryBackend::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let audit = Arc::new(RecordingAuditLog::default());
        let collaborators = backend.collaborators(notifier.clone(), audit.clone());
        let authority = Arc::new(ApprovalAuthority::default());

        Self {
            engine: WorkflowEngine::new(collaborators.clone(), authority.clone()),
            products: backend.products.clone(),
            requests: backend.requests.clone(),
            movements: backend.movements.clone(),
            putaway: backend.putaway.clone(),
            backend,
            notifier,
            audit,
            collaborators,
            authority,
        }
    }

    fn rebuild(mut self) -> Self {
        self.engine = WorkflowEngine::new(self.collaborators.clone(), self.authority.clone());
        self
    }

    /// Same stores, different capability table.
    pub(crate) fn with_authority(mut self, authority: ApprovalAuthority) -> Self {
        self.authority = Arc::new(authority);
        self.rebuild()
    }

    pub(crate) fn with_products(mut self, products: Arc<dyn ProductRepository>) -> Self {
        self.collaborators.products = products;
        self.rebuild()
    }

    pub(crate) fn with_requests(mut self, requests: Arc<dyn ChangeRequestRepository>) -> Self {
        self.collaborators.requests = requests;
        self.rebuild()
    }

    pub(crate) fn with_sites(mut self, sites: Arc<dyn SiteDirectory>) -> Self {
        self.collaborators.sites = sites;
        self.rebuild()
    }

    pub(crate) fn with_putaway(mut self, putaway: Arc<dyn PutawayTrigger>) -> Self {
        self.collaborators.putaway = putaway;
        self.rebuild()
    }

    pub(crate) fn with_movements(mut self, movements: Arc<dyn StockMovementSink>) -> Self {
        self.collaborators.movements = movements;
        self.rebuild()
    }

    pub(crate) fn store_site(&self) -> SiteId {
        self.backend.sites.add("Bole Market", SiteKind::Store)
    }

    pub(crate) fn warehouse_site(&self) -> SiteId {
        self.backend
            .sites
            .add("Akaki Distribution Center", SiteKind::Warehouse)
    }

    pub(crate) fn hq_site(&self) -> SiteId {
        self.backend.sites.add("Head Office", SiteKind::Administration)
    }

    pub(crate) fn draft(&self, site: SiteId, sku: &str, stock: u64) -> ProductDraft {
        ProductDraft {
            site_id: Some(site),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category: "Pantry".to_string(),
            price: Some(5_00),
            cost_price: Some(3_00),
            stock,
            ..ProductDraft::default()
        }
    }

    /// Insert a product straight into the catalog, bypassing the workflow.
    pub(crate) async fn seed_product(
        &self,
        site: SiteId,
        sku: &str,
        stock: u64,
    ) -> Result<Product, StoreError> {
        let product =
            self.draft(site, sku, stock)
                .into_product(site, ActorId::new(), ActorId::new(), Timestamp::now());

        self.products.insert(product).await
    }

    pub(crate) async fn stock_of(&self, id: ProductId) -> Result<Option<u64>, StoreError> {
        Ok(self.products.get_by_id(id).await?.map(|product| product.stock))
    }
}
