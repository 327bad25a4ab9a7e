//! Workflow Engine
//!
//! Owns the collaborators and the commit logic shared by the direct path
//! ([`WorkflowEngine::submit`]) and the review path
//! ([`WorkflowEngine::approve`]). Every call into a collaborator is bounded by
//! [`WorkflowSettings::upstream_timeout`].

use std::{future::Future, sync::Arc, time::Duration};

use jiff::Timestamp;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    audit::{AuditCategory, AuditEntry, AuditLog, AuditSeverity},
    authority::{ApprovalAuthority, SiteAssignment},
    ids::{MovementId, ProductId, RequestId, SiteId},
    notify::{NotificationKind, Notifier},
    products::Product,
    putaway::{PutawayError, PutawayRequest, PutawaySource, PutawayTrigger},
    repository::{
        ChangeRequestRepository, ProductRepository, StockMovement, StockMovementSink, StoreError,
    },
    requests::{ChangePayload, ChangeRequest, RequestStatus, StockDelta},
    roles::{Actor, Role, SiteKind},
    sites::SiteDirectory,
    workflow::{
        errors::{Missing, WorkflowError},
        intent::WorkflowWarning,
    },
};

/// Default bound on a single collaborator call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Upper bound on any single persistence, site or putaway call.
    pub upstream_timeout: Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

/// Everything the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Product catalog.
    pub products: Arc<dyn ProductRepository>,
    /// Change request queue.
    pub requests: Arc<dyn ChangeRequestRepository>,
    /// Stock movement ledger.
    pub movements: Arc<dyn StockMovementSink>,
    /// Site registry.
    pub sites: Arc<dyn SiteDirectory>,
    /// Putaway job service.
    pub putaway: Arc<dyn PutawayTrigger>,
    /// User-facing notifications.
    pub notifier: Arc<dyn Notifier>,
    /// Audit trail.
    pub audit: Arc<dyn AuditLog>,
}

/// The approval state machine.
#[derive(Clone)]
pub struct WorkflowEngine {
    pub(super) collaborators: Collaborators,
    pub(super) authority: Arc<ApprovalAuthority>,
    pub(super) settings: WorkflowSettings,
}

/// A change about to be written to the catalog.
pub(super) struct Commit<'a> {
    pub product: Option<ProductId>,
    pub payload: &'a ChangePayload,
    pub proposer: &'a Actor,
    pub committer: &'a Actor,
    pub acknowledged_violation: Option<&'a str>,
    pub source: PutawaySource,
}

/// What a commit wrote, plus side effects that failed afterwards.
pub(super) struct Committed {
    pub product: Option<Product>,
    pub warnings: Vec<WorkflowWarning>,
}

impl WorkflowEngine {
    /// Build an engine with default settings.
    #[must_use]
    pub fn new(collaborators: Collaborators, authority: impl Into<Arc<ApprovalAuthority>>) -> Self {
        Self {
            collaborators,
            authority: authority.into(),
            settings: WorkflowSettings::default(),
        }
    }

    /// Replace the engine settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The capability table in force.
    #[must_use]
    pub fn authority(&self) -> &ApprovalAuthority {
        &self.authority
    }

    /// Pending requests, oldest first, optionally for one site.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UpstreamUnavailable`] if the queue cannot be read.
    pub async fn pending_requests(
        &self,
        site: Option<SiteId>,
    ) -> Result<Vec<ChangeRequest>, WorkflowError> {
        self.requests_with_status(RequestStatus::Pending, site).await
    }

    /// Requests in `status`, oldest first, optionally for one site.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::UpstreamUnavailable`] if the queue cannot be read.
    pub async fn requests_with_status(
        &self,
        status: RequestStatus,
        site: Option<SiteId>,
    ) -> Result<Vec<ChangeRequest>, WorkflowError> {
        self.bounded(
            self.collaborators.requests.list_by_status(status, site),
            StoreError::Unavailable,
        )
        .await
        .map_err(WorkflowError::from_store("list change requests"))
    }

    /// A single request.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::NotFound`] if no request has this id.
    pub async fn request(&self, id: RequestId) -> Result<ChangeRequest, WorkflowError> {
        self.load_request(id).await
    }

    /// Await `call`, failing through `on_timeout` once the upstream bound passes.
    pub(super) async fn bounded<T, E>(
        &self,
        call: impl Future<Output = Result<T, E>>,
        on_timeout: impl FnOnce(String) -> E,
    ) -> Result<T, E> {
        let limit = self.settings.upstream_timeout;

        match timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(format!("timed out after {}ms", limit.as_millis()))),
        }
    }

    pub(super) async fn load_product(&self, id: ProductId) -> Result<Product, WorkflowError> {
        self.bounded(
            self.collaborators.products.get_by_id(id),
            StoreError::Unavailable,
        )
        .await
        .map_err(WorkflowError::from_store("load product"))?
        .ok_or_else(|| WorkflowError::not_found(Missing::Product, id))
    }

    pub(super) async fn load_request(&self, id: RequestId) -> Result<ChangeRequest, WorkflowError> {
        self.bounded(
            self.collaborators.requests.get_by_id(id),
            StoreError::Unavailable,
        )
        .await
        .map_err(WorkflowError::from_store("load change request"))?
        .ok_or_else(|| WorkflowError::not_found(Missing::Request, id))
    }

    /// Fail with [`WorkflowError::DuplicateSku`] if another product holds `sku`.
    pub(super) async fn ensure_sku_free(
        &self,
        sku: &str,
        owner: Option<ProductId>,
    ) -> Result<(), WorkflowError> {
        let holder = self
            .bounded(
                self.collaborators.products.get_by_sku(sku),
                StoreError::Unavailable,
            )
            .await
            .map_err(WorkflowError::from_store("look up sku"))?;

        match holder {
            Some(product) if Some(product.id) != owner => {
                Err(WorkflowError::DuplicateSku(sku.to_string()))
            }
            _ => Ok(()),
        }
    }

    async fn site_kind(&self, id: SiteId) -> Result<SiteKind, WorkflowError> {
        self.bounded(
            self.collaborators.sites.get_site(id),
            StoreError::Unavailable,
        )
        .await
        .map_err(WorkflowError::from_store("load site"))?
        .map(|site| site.kind)
        .ok_or_else(|| WorkflowError::not_found(Missing::Site, id))
    }

    /// Check where `role` proposes to place a product.
    pub(super) async fn site_policy(
        &self,
        role: Role,
        site: SiteId,
    ) -> Result<SiteAssignment, WorkflowError> {
        let kind = self.site_kind(site).await?;

        Ok(self.authority.validate_site_assignment(role, kind))
    }

    /// Commit-time site check. Only the violation the proposer acknowledged
    /// passes; one that appeared since submission is a hard block.
    async fn enforce_site_policy(
        &self,
        role: Role,
        site: SiteId,
        acknowledged: Option<&str>,
    ) -> Result<(), WorkflowError> {
        match self.site_policy(role, site).await? {
            SiteAssignment::Ok => Ok(()),
            SiteAssignment::Violation(message) if acknowledged == Some(message.as_str()) => {
                info!(%role, %site, %message, "committing past acknowledged site policy violation");
                Ok(())
            }
            SiteAssignment::Violation(message) => Err(WorkflowError::PolicyViolation(message)),
        }
    }

    /// Write a change to the catalog and run its side effects.
    ///
    /// Either the catalog write happens in full or it does not happen at all;
    /// putaway and ledger failures afterwards come back as warnings.
    pub(super) async fn commit(&self, change: Commit<'_>) -> Result<Committed, WorkflowError> {
        let Commit {
            product,
            payload,
            proposer,
            committer,
            acknowledged_violation,
            source,
        } = change;

        let now = Timestamp::now();

        match payload {
            ChangePayload::Create { proposed } => {
                let site_id = proposed
                    .site_id
                    .ok_or_else(|| WorkflowError::InvalidInput("site is required".to_string()))?;

                self.enforce_site_policy(proposer.role, site_id, acknowledged_violation)
                    .await?;

                let candidate = proposed
                    .clone()
                    .into_product(site_id, proposer.id, committer.id, now);

                let created = self
                    .bounded(
                        self.collaborators.products.insert(candidate.clone()),
                        StoreError::Unavailable,
                    )
                    .await
                    .map_err(WorkflowError::from_commit(
                        "insert product",
                        Missing::Product,
                        candidate.id,
                    ))?;

                let mut warnings = Vec::new();

                if created.stock > 0 {
                    warnings.extend(
                        self.request_putaway(&created, created.stock, committer, source)
                            .await,
                    );
                }

                Ok(Committed {
                    product: Some(created),
                    warnings,
                })
            }
            ChangePayload::Edit { proposed } => {
                let id = target(product)?;
                let current = self.load_product(id).await?;

                proposed.validate(&current)?;

                self.enforce_site_policy(
                    proposer.role,
                    proposed.site_id.unwrap_or(current.site_id),
                    acknowledged_violation,
                )
                .await?;

                let updated = self
                    .bounded(
                        self.collaborators
                            .products
                            .update(id, proposed.clone(), committer.id, now),
                        StoreError::Unavailable,
                    )
                    .await
                    .map_err(WorkflowError::from_commit("update product", Missing::Product, id))?;

                Ok(Committed {
                    product: Some(updated),
                    warnings: Vec::new(),
                })
            }
            ChangePayload::Delete => {
                let id = target(product)?;

                let removed = self
                    .bounded(
                        self.collaborators.products.delete(id),
                        StoreError::Unavailable,
                    )
                    .await
                    .map_err(WorkflowError::from_commit("delete product", Missing::Product, id))?;

                if !removed {
                    info!(product = %id, "product already absent, delete is a no-op");
                }

                Ok(Committed {
                    product: None,
                    warnings: Vec::new(),
                })
            }
            ChangePayload::StockAdjustment {
                direction,
                quantity,
                reason,
            } => {
                let id = target(product)?;
                let delta = StockDelta {
                    direction: *direction,
                    quantity: *quantity,
                };

                let adjusted = self
                    .bounded(
                        self.collaborators.products.adjust_stock(id, delta),
                        StoreError::Unavailable,
                    )
                    .await
                    .map_err(WorkflowError::from_commit("adjust stock", Missing::Product, id))?;

                let movement = StockMovement {
                    id: MovementId::new(),
                    product_id: adjusted.id,
                    site_id: adjusted.site_id,
                    product_name: adjusted.name.clone(),
                    direction: delta.direction,
                    quantity: delta.quantity,
                    reason: reason.clone(),
                    performed_by: committer.id,
                    performed_at: now,
                };

                let warnings = self.record_movement(movement).await.into_iter().collect();

                Ok(Committed {
                    product: Some(adjusted),
                    warnings,
                })
            }
        }
    }

    async fn request_putaway(
        &self,
        product: &Product,
        quantity: u64,
        committer: &Actor,
        source: PutawaySource,
    ) -> Option<WorkflowWarning> {
        let request = PutawayRequest {
            product: product.clone(),
            quantity,
            requested_by: committer.id,
            source,
        };

        match self
            .bounded(
                self.collaborators.putaway.create_job(request),
                PutawayError::Unavailable,
            )
            .await
        {
            Ok(job) => {
                info!(product = %product.id, %job, quantity, %source, "putaway job created");
                None
            }
            Err(error) => {
                warn!(product = %product.id, quantity, %error, "putaway job was not created");

                self.notify(
                    NotificationKind::Alert,
                    &format!(
                        "{} was saved but its putaway job could not be created: {error}",
                        product.name
                    ),
                );

                Some(WorkflowWarning::PutawayFailed {
                    product: product.id,
                    quantity,
                    error,
                })
            }
        }
    }

    async fn record_movement(&self, movement: StockMovement) -> Option<WorkflowWarning> {
        let product = movement.product_id;

        match self
            .bounded(
                self.collaborators.movements.record(movement),
                StoreError::Unavailable,
            )
            .await
        {
            Ok(()) => None,
            Err(error) => {
                warn!(%product, %error, "stock movement was not recorded");
                Some(WorkflowWarning::MovementNotRecorded { product, error })
            }
        }
    }

    pub(super) async fn audit(&self, entry: AuditEntry) {
        let action = entry.action.clone();

        if timeout(
            self.settings.upstream_timeout,
            self.collaborators.audit.log(entry),
        )
        .await
        .is_err()
        {
            warn!(%action, "audit entry timed out");
        }
    }

    pub(super) fn notify(&self, kind: NotificationKind, message: &str) {
        self.collaborators.notifier.notify(kind, message);
    }

    /// Report a refused or failed operation to the actor and the audit log.
    pub(super) async fn record_failure(
        &self,
        actor: &Actor,
        action: &str,
        subject: Option<(&str, String)>,
        error: &WorkflowError,
    ) {
        let (category, severity) = match error {
            WorkflowError::Forbidden { .. } => (AuditCategory::Security, AuditSeverity::Warning),
            WorkflowError::AlreadyDecided(_) => (AuditCategory::Operations, AuditSeverity::Info),
            WorkflowError::UpstreamUnavailable { .. } => {
                (AuditCategory::Operations, AuditSeverity::Error)
            }
            _ => (AuditCategory::Operations, AuditSeverity::Warning),
        };

        warn!(actor = %actor.id, role = %actor.role, %action, %error, "workflow operation failed");

        self.notify(
            if matches!(error, WorkflowError::AlreadyDecided(_)) {
                NotificationKind::Info
            } else {
                NotificationKind::Alert
            },
            &error.to_string(),
        );

        let mut entry = AuditEntry::new(
            category,
            severity,
            format!("{action}.failed"),
            error.to_string(),
            actor,
        )
        .with("error", error.kind());

        if let Some((key, id)) = subject {
            entry = entry.with(key, id);
        }

        self.audit(entry).await;
    }
}

fn target(product: Option<ProductId>) -> Result<ProductId, WorkflowError> {
    product.ok_or_else(|| WorkflowError::InvalidInput("change has no target product".to_string()))
}

#[cfg(test)]
mod tests {
    use std::{future::pending, sync::Arc};

    use async_trait::async_trait;
    use testresult::TestResult;

    use crate::{
        sites::Site,
        test::{TestContext, actors},
        workflow::{MutationIntent, SubmissionOutcome},
    };

    use super::*;

    struct StalledSites;

    #[async_trait]
    impl SiteDirectory for StalledSites {
        async fn get_site(&self, _id: SiteId) -> Result<Option<Site>, StoreError> {
            pending().await
        }
    }

    #[tokio::test]
    async fn review_queue_lists_pending_requests_by_site() -> TestResult {
        let ctx = TestContext::new();
        let store = ctx.store_site();
        let other = ctx.store_site();

        for (site, sku) in [(store, "Q-001"), (other, "Q-002"), (store, "Q-003")] {
            let outcome = ctx
                .engine
                .submit(
                    &actors::pos(),
                    MutationIntent::CreateProduct(ctx.draft(site, sku, 0)).into(),
                )
                .await?;

            assert!(
                matches!(outcome, SubmissionOutcome::Queued(_)),
                "expected Queued, got {outcome:?}"
            );
        }

        let all = ctx.engine.pending_requests(None).await?;
        let at_store = ctx.engine.pending_requests(Some(store)).await?;

        assert_eq!(all.len(), 3);
        assert_eq!(
            at_store
                .iter()
                .map(|request| request.product_sku.as_str())
                .collect::<Vec<_>>(),
            vec!["Q-001", "Q-003"]
        );

        Ok(())
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let ctx = TestContext::new();

        let result = ctx.engine.request(RequestId::new()).await;

        assert!(
            matches!(
                result,
                Err(WorkflowError::NotFound {
                    missing: Missing::Request,
                    ..
                })
            ),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_site_lookup_fails_with_retryable_error() {
        let ctx = TestContext::new().with_sites(Arc::new(StalledSites));

        let result = ctx
            .engine
            .submit(
                &actors::super_admin(),
                MutationIntent::CreateProduct(ctx.draft(SiteId::new(), "S-001", 1)).into(),
            )
            .await;

        assert!(
            matches!(&result, Err(error) if error.is_retryable()),
            "expected retryable timeout, got {result:?}"
        );
        assert!(ctx.products.is_empty());
    }

    #[tokio::test]
    async fn create_for_unknown_site_is_not_found() {
        let ctx = TestContext::new();

        let result = ctx
            .engine
            .submit(
                &actors::super_admin(),
                MutationIntent::CreateProduct(ctx.draft(SiteId::new(), "S-404", 1)).into(),
            )
            .await;

        assert!(
            matches!(
                result,
                Err(WorkflowError::NotFound {
                    missing: Missing::Site,
                    ..
                })
            ),
            "expected site NotFound, got {result:?}"
        );
    }
}
