//! Stockgate
//!
//! Stockgate is the approval workflow for inventory changes: product
//! creation, edits, deletions and stock adjustments proposed by one user and
//! committed to the catalog either directly, when the proposer's role allows
//! it, or after a reviewer approves the queued change request.
//!
//! The crate is storage-agnostic. The [`workflow::WorkflowEngine`] talks to
//! the catalog, the change request queue, the stock movement ledger, the site
//! registry and the putaway service through the traits in [`repository`],
//! [`sites`] and [`putaway`]; [`memory`] implements all of them in process.

pub mod audit;
pub mod authority;
pub mod ids;
pub mod memory;
pub mod notify;
pub mod prelude;
pub mod products;
pub mod putaway;
pub mod repository;
pub mod requests;
pub mod roles;
pub mod sites;
pub mod workflow;

#[cfg(test)]
mod test;
