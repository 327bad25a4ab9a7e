//! Test harness for the `PostgreSQL` backend.

mod db;
pub(crate) mod helpers;

pub(crate) use db::TestDb;
