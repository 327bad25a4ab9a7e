//! Change Requests

mod records;
mod repository;

pub use repository::PgChangeRequestRepository;
