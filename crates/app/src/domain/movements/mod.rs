//! Stock Movements

mod repository;

pub use repository::PgStockMovements;
