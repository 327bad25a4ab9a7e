//! Submission path.

use jiff::Timestamp;
use tracing::{Span, info, warn};

use crate::{
    audit::{AuditCategory, AuditEntry, AuditSeverity},
    authority::SiteAssignment,
    ids::{RequestId, SiteId},
    notify::NotificationKind,
    products::Product,
    putaway::PutawaySource,
    repository::StoreError,
    requests::{ChangeKind, ChangeRequest, RequestStatus, StockDelta, StockDirection},
    roles::Actor,
    workflow::{
        engine::{Commit, WorkflowEngine},
        errors::WorkflowError,
        intent::{MutationIntent, Submission, SubmissionOutcome},
    },
};

/// Display snapshot of what a submission targets.
struct Subject {
    site: SiteId,
    name: String,
    sku: String,
}

impl WorkflowEngine {
    /// Propose a catalog mutation.
    ///
    /// Actors the capability table lets auto-approve this kind of change have
    /// it committed immediately; everyone else gets a pending change request
    /// and the catalog is left alone. A site-assignment violation stops at a
    /// confirmation gate until the submission is repeated with
    /// [`Submission::acknowledging_policy`].
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError`] if the intent is invalid, targets a missing
    /// product or site, reuses a taken SKU, would take stock below zero, or an
    /// upstream call fails. Nothing is persisted on error.
    #[tracing::instrument(
        name = "workflow.submit",
        skip(self, actor, submission),
        fields(
            actor_id = %actor.id,
            role = %actor.role,
            kind = %submission.intent.kind(),
            product_id = tracing::field::Empty,
            request_id = tracing::field::Empty
        ),
        err
    )]
    pub async fn submit(
        &self,
        actor: &Actor,
        submission: Submission,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        let subject = submission
            .intent
            .product()
            .map(|product| ("product_id", product.to_string()));

        let result = self.submit_intent(actor, submission).await;

        if let Err(error) = &result {
            self.record_failure(actor, "product.submit", subject, error)
                .await;
        }

        result
    }

    async fn submit_intent(
        &self,
        actor: &Actor,
        submission: Submission,
    ) -> Result<SubmissionOutcome, WorkflowError> {
        let Submission {
            intent,
            acknowledge_policy,
        } = submission;

        let kind = intent.kind();

        let current = match intent.product() {
            Some(id) => Some(self.load_product(id).await?),
            None => None,
        };

        let subject = self.check_intent(&intent, current.as_ref()).await?;

        let mut acknowledged_violation = None;

        if matches!(kind, ChangeKind::Create | ChangeKind::Edit) {
            if let SiteAssignment::Violation(violation) =
                self.site_policy(actor.role, subject.site).await?
            {
                if !acknowledge_policy {
                    info!(site = %subject.site, %violation, "submission held at confirmation gate");

                    self.notify(
                        NotificationKind::Info,
                        &format!("{violation}. Confirm to proceed anyway."),
                    );

                    return Ok(SubmissionOutcome::NeedsConfirmation { violation });
                }

                warn!(site = %subject.site, %violation, "proposer acknowledged site policy violation");
                acknowledged_violation = Some(violation);
            }
        }

        let product_id = intent.product();
        let payload = intent.into_payload();

        if self.authority.can_auto_approve_change(actor.role, kind) {
            let committed = self
                .commit(Commit {
                    product: product_id,
                    payload: &payload,
                    proposer: actor,
                    committer: actor,
                    acknowledged_violation: acknowledged_violation.as_deref(),
                    source: PutawaySource::DirectEntry,
                })
                .await?;

            let applied_id = committed.product.as_ref().map(|p| p.id).or(product_id);

            if let Some(id) = applied_id {
                Span::current().record("product_id", tracing::field::display(id));
            }

            info!(path = "direct", "change applied");

            self.notify(
                NotificationKind::Success,
                &format!("{} {}", subject.name, applied_verb(kind)),
            );

            let mut entry = AuditEntry::new(
                AuditCategory::Operations,
                AuditSeverity::Info,
                format!("product.{kind}"),
                format!("{} {} directly", subject.name, applied_verb(kind)),
                actor,
            )
            .with("path", "direct")
            .with("sku", &subject.sku)
            .with("site_id", subject.site);

            if let Some(id) = applied_id {
                entry = entry.with("product_id", id);
            }

            if let Some(violation) = &acknowledged_violation {
                entry = entry.with("acknowledged_violation", violation);
            }

            self.audit(entry).await;

            return Ok(SubmissionOutcome::Applied {
                product: committed.product,
                warnings: committed.warnings,
            });
        }

        let request = ChangeRequest {
            id: RequestId::new(),
            product_id,
            product_name: subject.name,
            product_sku: subject.sku,
            site_id: subject.site,
            payload,
            requested_by: actor.clone(),
            requested_at: Timestamp::now(),
            acknowledged_violation,
            status: RequestStatus::Pending,
            decision: None,
        };

        let queued = self
            .bounded(
                self.collaborators.requests.insert(request),
                StoreError::Unavailable,
            )
            .await
            .map_err(WorkflowError::from_store("queue change request"))?;

        Span::current().record("request_id", tracing::field::display(queued.id));
        info!(path = "queued", "change request submitted for approval");

        self.notify(
            NotificationKind::Info,
            &format!(
                "{} request for {} submitted for approval",
                kind, queued.product_name
            ),
        );

        let mut entry = AuditEntry::new(
            AuditCategory::Operations,
            AuditSeverity::Info,
            "change_request.submitted",
            format!("{kind} request for {} queued for approval", queued.product_name),
            actor,
        )
        .with("path", "queued")
        .with("request_id", queued.id)
        .with("change_type", kind)
        .with("sku", &queued.product_sku);

        if let Some(id) = queued.product_id {
            entry = entry.with("product_id", id);
        }

        self.audit(entry).await;

        Ok(SubmissionOutcome::Queued(queued))
    }

    /// Validate an intent against the product it targets and describe it.
    async fn check_intent(
        &self,
        intent: &MutationIntent,
        current: Option<&Product>,
    ) -> Result<Subject, WorkflowError> {
        match (intent, current) {
            (MutationIntent::CreateProduct(draft), _) => {
                draft.validate()?;

                let site = draft
                    .site_id
                    .ok_or_else(|| WorkflowError::InvalidInput("site is required".to_string()))?;

                self.ensure_sku_free(&draft.sku, None).await?;

                Ok(Subject {
                    site,
                    name: draft.name.clone(),
                    sku: draft.sku.clone(),
                })
            }
            (MutationIntent::EditProduct { patch, .. }, Some(product)) => {
                patch.validate(product)?;

                if let Some(sku) = patch.sku.as_deref().filter(|sku| *sku != product.sku) {
                    self.ensure_sku_free(sku, Some(product.id)).await?;
                }

                Ok(Subject {
                    site: patch.site_id.unwrap_or(product.site_id),
                    name: product.name.clone(),
                    sku: product.sku.clone(),
                })
            }
            (
                MutationIntent::AdjustStock {
                    direction,
                    quantity,
                    ..
                },
                Some(product),
            ) => {
                if *quantity == 0 {
                    return Err(WorkflowError::InvalidInput(
                        "quantity must be positive".to_string(),
                    ));
                }

                let delta = StockDelta {
                    direction: *direction,
                    quantity: *quantity,
                };

                if delta.apply(product.stock).is_none() {
                    return Err(match direction {
                        StockDirection::Out => WorkflowError::InsufficientStock {
                            available: product.stock,
                            requested: *quantity,
                        },
                        StockDirection::In => {
                            WorkflowError::InvalidInput("quantity is too large".to_string())
                        }
                    });
                }

                Ok(Subject::of(product))
            }
            (MutationIntent::DeleteProduct(_), Some(product)) => Ok(Subject::of(product)),
            (_, None) => Err(WorkflowError::InvalidInput(
                "change has no target product".to_string(),
            )),
        }
    }
}

impl Subject {
    fn of(product: &Product) -> Self {
        Self {
            site: product.site_id,
            name: product.name.clone(),
            sku: product.sku.clone(),
        }
    }
}

const fn applied_verb(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Create => "created",
        ChangeKind::Edit => "updated",
        ChangeKind::Delete => "deleted",
        ChangeKind::StockAdjustment => "stock adjusted",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;

    use crate::{
        notify::NotificationKind,
        products::{ApprovalStatus, ProductPatch},
        putaway::{MockPutawayTrigger, PutawayError},
        repository::ProductRepository,
        test::{TestContext, actors},
        workflow::{Missing, WorkflowWarning},
    };

    use super::*;

    #[tokio::test]
    async fn non_privileged_create_is_queued_without_touching_catalog() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.store_site();

        let outcome = ctx
            .engine
            .submit(
                &actors::pos(),
                MutationIntent::CreateProduct(ctx.draft(site, "X-001", 10)).into(),
            )
            .await?;

        let SubmissionOutcome::Queued(request) = outcome else {
            unreachable!("expected Queued, got {outcome:?}");
        };

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.product_sku, "X-001");
        assert_eq!(request.product_id, None);
        assert!(ctx.products.get_by_sku("X-001").await?.is_none());
        assert!(ctx.putaway.jobs().is_empty());
        assert_eq!(
            ctx.audit.actions(),
            vec!["change_request.submitted".to_string()]
        );

        Ok(())
    }

    #[tokio::test]
    async fn privileged_create_is_applied_without_a_request() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.store_site();

        let outcome = ctx
            .engine
            .submit(
                &actors::super_admin(),
                MutationIntent::CreateProduct(ctx.draft(site, "X-002", 0)).into(),
            )
            .await?;

        let SubmissionOutcome::Applied {
            product: Some(product),
            warnings,
        } = outcome
        else {
            unreachable!("expected Applied, got {outcome:?}");
        };

        assert_eq!(product.approval_status, ApprovalStatus::Approved);
        assert!(warnings.is_empty());
        assert!(ctx.engine.pending_requests(None).await?.is_empty());
        assert!(ctx.requests.is_empty());
        assert!(ctx.putaway.jobs().is_empty(), "no stock, no putaway");

        Ok(())
    }

    #[tokio::test]
    async fn direct_create_with_stock_requests_putaway() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.store_site();

        let outcome = ctx
            .engine
            .submit(
                &actors::admin(),
                MutationIntent::CreateProduct(ctx.draft(site, "X-003", 24)).into(),
            )
            .await?;

        assert!(
            matches!(outcome, SubmissionOutcome::Applied { .. }),
            "admin auto-approves creation, got {outcome:?}"
        );

        let jobs = ctx.putaway.jobs();

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].quantity, 24);
        assert_eq!(jobs[0].source, PutawaySource::DirectEntry);
        assert!(ctx.movements.entries().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn admin_edit_is_queued() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.store_site();
        let product = ctx.seed_product(site, "E-001", 5).await?;

        let outcome = ctx
            .engine
            .submit(
                &actors::admin(),
                MutationIntent::EditProduct {
                    product: product.id,
                    patch: ProductPatch {
                        name: Some("Renamed".to_string()),
                        ..ProductPatch::default()
                    },
                }
                .into(),
            )
            .await?;

        assert!(
            matches!(outcome, SubmissionOutcome::Queued(_)),
            "admin only auto-approves creation, got {outcome:?}"
        );
        assert_eq!(
            ctx.products.get_by_id(product.id).await?.map(|p| p.name),
            Some(product.name)
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_fail_fast() {
        let ctx = TestContext::new();

        let result = ctx
            .engine
            .submit(
                &actors::pos(),
                MutationIntent::CreateProduct(crate::products::ProductDraft::default()).into(),
            )
            .await;

        assert!(
            matches!(result, Err(WorkflowError::InvalidInput(_))),
            "expected InvalidInput, got {result:?}"
        );
        assert!(ctx.requests.is_empty());
    }

    #[tokio::test]
    async fn taken_sku_is_a_soft_duplicate() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.store_site();
        ctx.seed_product(site, "DUP-1", 1).await?;

        let result = ctx
            .engine
            .submit(
                &actors::pos(),
                MutationIntent::CreateProduct(ctx.draft(site, "DUP-1", 1)).into(),
            )
            .await;

        assert!(
            matches!(&result, Err(WorkflowError::DuplicateSku(sku)) if sku == "DUP-1"),
            "expected DuplicateSku, got {result:?}"
        );
        assert!(ctx.requests.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn edit_to_taken_sku_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.store_site();
        ctx.seed_product(site, "A-1", 1).await?;
        let product = ctx.seed_product(site, "B-1", 1).await?;

        let result = ctx
            .engine
            .submit(
                &actors::pos(),
                MutationIntent::EditProduct {
                    product: product.id,
                    patch: ProductPatch {
                        sku: Some("A-1".to_string()),
                        ..ProductPatch::default()
                    },
                }
                .into(),
            )
            .await;

        assert!(
            matches!(result, Err(WorkflowError::DuplicateSku(_))),
            "expected DuplicateSku, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let ctx = TestContext::new();

        let result = ctx
            .engine
            .submit(
                &actors::pos(),
                MutationIntent::DeleteProduct(crate::ids::ProductId::new()).into(),
            )
            .await;

        assert!(
            matches!(
                result,
                Err(WorkflowError::NotFound {
                    missing: Missing::Product,
                    ..
                })
            ),
            "expected NotFound, got {result:?}"
        );
        assert_eq!(ctx.audit.actions(), vec!["product.submit.failed".to_string()]);
    }

    #[tokio::test]
    async fn oversized_out_adjustment_fails_at_submission() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.store_site();
        let product = ctx.seed_product(site, "S-1", 3).await?;

        let result = ctx
            .engine
            .submit(
                &actors::pos(),
                MutationIntent::AdjustStock {
                    product: product.id,
                    direction: StockDirection::Out,
                    quantity: 4,
                    reason: "damaged".to_string(),
                }
                .into(),
            )
            .await;

        assert!(
            matches!(
                result,
                Err(WorkflowError::InsufficientStock {
                    available: 3,
                    requested: 4
                })
            ),
            "expected InsufficientStock, got {result:?}"
        );
        assert!(ctx.requests.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_adjustment_is_invalid() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.store_site();
        let product = ctx.seed_product(site, "S-2", 3).await?;

        let result = ctx
            .engine
            .submit(
                &actors::super_admin(),
                MutationIntent::AdjustStock {
                    product: product.id,
                    direction: StockDirection::In,
                    quantity: 0,
                    reason: "count".to_string(),
                }
                .into(),
            )
            .await;

        assert!(
            matches!(result, Err(WorkflowError::InvalidInput(_))),
            "expected InvalidInput, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn site_violation_is_a_confirmation_gate() -> TestResult {
        let ctx = TestContext::new();
        let store = ctx.store_site();
        let draft = ctx.draft(store, "W-001", 0);

        let first = ctx
            .engine
            .submit(&actors::picker(), MutationIntent::CreateProduct(draft.clone()).into())
            .await?;

        assert!(
            matches!(&first, SubmissionOutcome::NeedsConfirmation { violation } if violation.contains("warehouse")),
            "expected confirmation gate, got {first:?}"
        );
        assert!(ctx.requests.is_empty());

        let second = ctx
            .engine
            .submit(
                &actors::picker(),
                Submission::new(MutationIntent::CreateProduct(draft)).acknowledging_policy(),
            )
            .await?;

        let SubmissionOutcome::Queued(request) = second else {
            unreachable!("expected Queued after confirmation, got {second:?}");
        };

        assert!(
            request
                .acknowledged_violation
                .as_deref()
                .is_some_and(|violation| violation.contains("warehouse")),
            "expected the confirmed violation on the request, got {:?}",
            request.acknowledged_violation
        );

        Ok(())
    }

    #[tokio::test]
    async fn administrative_site_needs_confirmation_even_for_approvers() -> TestResult {
        let ctx = TestContext::new();
        let hq = ctx.hq_site();

        let outcome = ctx
            .engine
            .submit(
                &actors::super_admin(),
                MutationIntent::CreateProduct(ctx.draft(hq, "HQ-1", 0)).into(),
            )
            .await?;

        assert!(
            matches!(outcome, SubmissionOutcome::NeedsConfirmation { .. }),
            "expected confirmation gate, got {outcome:?}"
        );
        assert!(ctx.products.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn putaway_failure_is_a_warning_not_a_rollback() -> TestResult {
        let mut putaway = MockPutawayTrigger::new();

        putaway
            .expect_create_job()
            .times(1)
            .returning(|_| Err(PutawayError::Unavailable("receiving offline".to_string())));

        let ctx = TestContext::new().with_putaway(Arc::new(putaway));
        let site = ctx.store_site();

        let outcome = ctx
            .engine
            .submit(
                &actors::super_admin(),
                MutationIntent::CreateProduct(ctx.draft(site, "P-001", 8)).into(),
            )
            .await?;

        let SubmissionOutcome::Applied {
            product: Some(product),
            warnings,
        } = outcome
        else {
            unreachable!("expected Applied, got {outcome:?}");
        };

        assert_eq!(product.stock, 8);
        assert!(
            matches!(
                warnings.as_slice(),
                [WorkflowWarning::PutawayFailed { quantity: 8, .. }]
            ),
            "expected putaway warning, got {warnings:?}"
        );
        assert!(ctx.products.get_by_sku("P-001").await?.is_some());
        assert!(
            ctx.notifier
                .messages()
                .iter()
                .any(|(kind, _)| *kind == NotificationKind::Alert)
        );

        Ok(())
    }

    #[tokio::test]
    async fn direct_adjustment_records_a_movement() -> TestResult {
        let ctx = TestContext::new();
        let site = ctx.warehouse_site();
        let product = ctx.seed_product(site, "M-1", 2).await?;

        let outcome = ctx
            .engine
            .submit(
                &actors::super_admin(),
                MutationIntent::AdjustStock {
                    product: product.id,
                    direction: StockDirection::In,
                    quantity: 5,
                    reason: "delivery".to_string(),
                }
                .into(),
            )
            .await?;

        assert!(
            matches!(&outcome, SubmissionOutcome::Applied { product: Some(p), .. } if p.stock == 7),
            "expected stock 7, got {outcome:?}"
        );

        let movements = ctx.movements.entries();

        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity, 5);
        assert_eq!(movements[0].reason, "delivery");

        Ok(())
    }
}
