//! Putaway Jobs

mod repository;

pub use repository::PgPutawayTrigger;
