//! `PostgreSQL` backend, configuration and wiring for the stockgate workflow.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod observability;

#[cfg(test)]
mod test;
