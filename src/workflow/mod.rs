//! Approval Workflow
//!
//! [`WorkflowEngine::submit`] routes a proposed mutation either straight into
//! the catalog or into the change request queue, depending on what the
//! [`ApprovalAuthority`](crate::authority::ApprovalAuthority) allows the actor.
//! [`WorkflowEngine::approve`] and [`WorkflowEngine::reject`] decide queued
//! requests.

mod engine;
mod errors;
mod intent;
mod review;
mod submit;

pub use engine::{Collaborators, DEFAULT_UPSTREAM_TIMEOUT, WorkflowEngine, WorkflowSettings};
pub use errors::{Missing, WorkflowError};
pub use intent::{MutationIntent, ReviewOutcome, Submission, SubmissionOutcome, WorkflowWarning};
