//! Stockgate prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    audit::{AuditCategory, AuditEntry, AuditLog, AuditSeverity, TracingAuditLog},
    authority::{ApprovalAuthority, PolicyError, RoleCapabilities, SiteAssignment},
    ids::{ActorId, ProductId, PutawayJobId, RequestId, SiteId, TypedUuid},
    memory::InMemoryBackend,
    notify::{NotificationKind, Notifier, TracingNotifier},
    products::{Product, ProductDraft, ProductPatch, StockStatus},
    putaway::{PutawayError, PutawayRequest, PutawaySource, PutawayTrigger},
    repository::{
        ChangeRequestRepository, ProductRepository, StockMovement, StockMovementSink, StoreError,
    },
    requests::{ChangeKind, ChangePayload, ChangeRequest, RequestStatus, StockDirection},
    roles::{Actor, Role, SiteKind},
    sites::{Site, SiteDirectory},
    workflow::{
        Collaborators, MutationIntent, ReviewOutcome, Submission, SubmissionOutcome,
        WorkflowEngine, WorkflowError, WorkflowSettings, WorkflowWarning,
    },
};
