//! Products

mod records;
mod repository;

pub use repository::PgProductRepository;
