//! In-memory stock movement ledger.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::repository::{StockMovement, StockMovementSink, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryStockMovements {
    entries: Mutex<Vec<StockMovement>>,
}

impl InMemoryStockMovements {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded movement, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<StockMovement> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StockMovementSink for InMemoryStockMovements {
    async fn record(&self, movement: StockMovement) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(movement);

        Ok(())
    }
}
