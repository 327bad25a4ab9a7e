//! Review path.
//!
//! A review decision is a compare-and-set on the request's status. Approval
//! claims the request (`pending → approved`) before touching the catalog, so a
//! second approver loses the claim and gets [`WorkflowError::AlreadyDecided`]
//! instead of applying the change twice. A commit that fails afterwards
//! releases the claim (`approved → pending`) and the request waits for another
//! decision.

use jiff::Timestamp;
use tracing::{error, info};

use crate::{
    audit::{AuditCategory, AuditEntry, AuditSeverity},
    ids::RequestId,
    notify::NotificationKind,
    putaway::PutawaySource,
    repository::StoreError,
    requests::{ChangeRequest, RequestStatus, StatusUpdate},
    roles::Actor,
    workflow::{
        engine::{Commit, WorkflowEngine},
        errors::{Missing, WorkflowError},
        intent::ReviewOutcome,
    },
};

const TRANSITION_ATTEMPTS: usize = 2;

impl WorkflowEngine {
    /// Approve a pending request and commit its change.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Forbidden`] unless the approver sits in the
    /// approver tier, [`WorkflowError::AlreadyDecided`] once the request has
    /// left `pending`, and the commit error (conflicting SKU, missing product,
    /// insufficient stock, tightened site policy, upstream failure) otherwise.
    /// The request stays `pending` on every commit error.
    #[tracing::instrument(
        name = "workflow.approve",
        skip(self, approver),
        fields(
            approver_id = %approver.id,
            role = %approver.role,
            request_id = %id
        ),
        err
    )]
    pub async fn approve(
        &self,
        approver: &Actor,
        id: RequestId,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let result = self.approve_request(approver, id).await;

        if let Err(error) = &result {
            self.record_failure(
                approver,
                "change_request.approve",
                Some(("request_id", id.to_string())),
                error,
            )
            .await;
        }

        result
    }

    /// Reject a pending request. The catalog is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Forbidden`], [`WorkflowError::NotFound`] or
    /// [`WorkflowError::AlreadyDecided`] like [`approve`](Self::approve), and
    /// [`WorkflowError::InvalidInput`] when `reason` is blank.
    #[tracing::instrument(
        name = "workflow.reject",
        skip(self, reviewer, reason),
        fields(
            reviewer_id = %reviewer.id,
            role = %reviewer.role,
            request_id = %id
        ),
        err
    )]
    pub async fn reject(
        &self,
        reviewer: &Actor,
        id: RequestId,
        reason: &str,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let result = self.reject_request(reviewer, id, reason).await;

        if let Err(error) = &result {
            self.record_failure(
                reviewer,
                "change_request.reject",
                Some(("request_id", id.to_string())),
                error,
            )
            .await;
        }

        result
    }

    async fn approve_request(
        &self,
        approver: &Actor,
        id: RequestId,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let mut request = self.pending_for_review(approver, id).await?;

        let claim = StatusUpdate::Approve {
            by: approver.id,
            at: Timestamp::now(),
        };

        self.transition(id, RequestStatus::Pending, claim.clone())
            .await?;

        let committed = match self
            .commit(Commit {
                product: request.product_id,
                payload: &request.payload,
                proposer: &request.requested_by,
                committer: approver,
                acknowledged_violation: request.acknowledged_violation.as_deref(),
                source: PutawaySource::ChangeApproval,
            })
            .await
        {
            Ok(committed) => committed,
            Err(error) => {
                self.release_claim(approver, id).await;
                return Err(error);
            }
        };

        request.apply_status(&claim);

        let product = committed.product.as_ref().map(|p| p.id).or(request.product_id);

        info!(
            kind = %request.kind(),
            product = ?product.map(|id| id.to_string()),
            warnings = committed.warnings.len(),
            "change request approved"
        );

        self.notify(
            NotificationKind::Success,
            &format!(
                "{} request for {} approved",
                request.kind(),
                request.product_name
            ),
        );

        let mut entry = AuditEntry::new(
            AuditCategory::Operations,
            AuditSeverity::Info,
            "change_request.approved",
            format!(
                "{} request for {} approved and applied",
                request.kind(),
                request.product_name
            ),
            approver,
        )
        .with("request_id", id)
        .with("change_type", request.kind())
        .with("requested_by", request.requested_by.id);

        if let Some(product) = product {
            entry = entry.with("product_id", product);
        }

        self.audit(entry).await;

        Ok(ReviewOutcome::Applied {
            request,
            product: committed.product,
            warnings: committed.warnings,
        })
    }

    async fn reject_request(
        &self,
        reviewer: &Actor,
        id: RequestId,
        reason: &str,
    ) -> Result<ReviewOutcome, WorkflowError> {
        let mut request = self.pending_for_review(reviewer, id).await?;

        let reason = reason.trim();

        if reason.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "a rejection reason is required".to_string(),
            ));
        }

        let update = StatusUpdate::Reject {
            by: reviewer.id,
            at: Timestamp::now(),
            reason: reason.to_string(),
        };

        self.transition(id, RequestStatus::Pending, update.clone())
            .await?;

        request.apply_status(&update);

        info!(kind = %request.kind(), %reason, "change request rejected");

        self.notify(
            NotificationKind::Info,
            &format!(
                "{} request for {} rejected",
                request.kind(),
                request.product_name
            ),
        );

        self.audit(
            AuditEntry::new(
                AuditCategory::Operations,
                AuditSeverity::Info,
                "change_request.rejected",
                format!(
                    "{} request for {} rejected: {reason}",
                    request.kind(),
                    request.product_name
                ),
                reviewer,
            )
            .with("request_id", id)
            .with("change_type", request.kind())
            .with("requested_by", request.requested_by.id),
        )
        .await;

        Ok(ReviewOutcome::Rejected(request))
    }

    /// Authority and state preconditions shared by both decisions.
    async fn pending_for_review(
        &self,
        reviewer: &Actor,
        id: RequestId,
    ) -> Result<ChangeRequest, WorkflowError> {
        if !self.authority.can_auto_approve(reviewer.role) {
            return Err(WorkflowError::forbidden(reviewer.role));
        }

        let request = self.load_request(id).await?;

        if request.status == RequestStatus::Pending {
            Ok(request)
        } else {
            Err(WorkflowError::AlreadyDecided(request.status))
        }
    }

    /// Compare-and-set the request's status, reporting a lost race as
    /// [`WorkflowError::AlreadyDecided`].
    ///
    /// A request that is back at `expected` after a failed swap had its
    /// approval claim released mid-review; the swap is retried, and a request
    /// that keeps slipping away is a retryable
    /// [`WorkflowError::UpstreamUnavailable`].
    async fn transition(
        &self,
        id: RequestId,
        expected: RequestStatus,
        update: StatusUpdate,
    ) -> Result<(), WorkflowError> {
        let target = update.target();

        for _ in 0..TRANSITION_ATTEMPTS {
            let moved = self
                .bounded(
                    self.collaborators
                        .requests
                        .compare_and_set_status(id, expected, update.clone()),
                    StoreError::Unavailable,
                )
                .await
                .map_err(WorkflowError::from_commit(
                    "update change request",
                    Missing::Request,
                    id,
                ))?;

            if moved {
                return Ok(());
            }

            let current = self.load_request(id).await?.status;

            if current != expected {
                info!(request = %id, %current, %target, "lost review race");
                return Err(WorkflowError::AlreadyDecided(current));
            }

            info!(request = %id, %target, "competing approval claim was released, retrying");
        }

        Err(WorkflowError::UpstreamUnavailable {
            operation: "update change request",
            reason: "another reviewer keeps claiming the request".to_string(),
        })
    }

    async fn release_claim(&self, approver: &Actor, id: RequestId) {
        let released = self
            .bounded(
                self.collaborators.requests.compare_and_set_status(
                    id,
                    RequestStatus::Approved,
                    StatusUpdate::Reopen,
                ),
                StoreError::Unavailable,
            )
            .await;

        match released {
            Ok(true) => info!(request = %id, "approval claim released"),
            Ok(false) | Err(_) => {
                error!(
                    request = %id,
                    ?released,
                    "approval claim could not be released; request is marked approved but was not applied"
                );

                self.audit(
                    AuditEntry::new(
                        AuditCategory::Operations,
                        AuditSeverity::Critical,
                        "change_request.claim_stuck",
                        "approval failed and the request could not be returned to pending",
                        approver,
                    )
                    .with("request_id", id),
                )
                .await;
            }
        }
    }
}
