//! `PostgreSQL` implementations of the workflow's collaborators

pub mod audit;
pub mod movements;
pub mod products;
pub mod putaway;
pub mod requests;
pub mod sites;
