//! Stock Movements Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query, query_as};
use stockgate::{
    ids::{ActorId, MovementId, ProductId, SiteId},
    repository::{StockMovement, StockMovementSink, StoreError},
    requests::StockDirection,
};

use crate::database::{get_parsed, get_u64, store_error, to_i64};

const CREATE_MOVEMENT_SQL: &str = include_str!("sql/create_movement.sql");
const LIST_MOVEMENTS_FOR_PRODUCT_SQL: &str = include_str!("sql/list_movements_for_product.sql");

/// Append-only movement ledger in `stock_movements`.
#[derive(Debug, Clone)]
pub struct PgStockMovements {
    pool: PgPool,
}

impl PgStockMovements {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Movements recorded for a product, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the query fails.
    pub async fn for_product(&self, product: ProductId) -> Result<Vec<StockMovement>, StoreError> {
        let records = query_as::<Postgres, MovementRecord>(LIST_MOVEMENTS_FOR_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(records.into_iter().map(|record| record.0).collect())
    }
}

struct MovementRecord(StockMovement);

impl<'r> FromRow<'r, PgRow> for MovementRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(StockMovement {
            id: MovementId::from_uuid(row.try_get("uuid")?),
            product_id: ProductId::from_uuid(row.try_get("product_uuid")?),
            site_id: SiteId::from_uuid(row.try_get("site_uuid")?),
            product_name: row.try_get("product_name")?,
            direction: get_parsed(row, "movement_type", StockDirection::parse)?,
            quantity: get_u64(row, "quantity")?,
            reason: row.try_get("reason")?,
            performed_by: ActorId::from_uuid(row.try_get("performed_by")?),
            performed_at: row.try_get::<SqlxTimestamp, _>("performed_at")?.to_jiff(),
        }))
    }
}

#[async_trait]
impl StockMovementSink for PgStockMovements {
    async fn record(&self, movement: StockMovement) -> Result<(), StoreError> {
        query(CREATE_MOVEMENT_SQL)
            .bind(movement.id.into_uuid())
            .bind(movement.product_id.into_uuid())
            .bind(movement.site_id.into_uuid())
            .bind(&movement.product_name)
            .bind(movement.direction.as_str())
            .bind(to_i64(movement.quantity, "quantity").map_err(store_error)?)
            .bind(&movement.reason)
            .bind(movement.performed_by.into_uuid())
            .bind(SqlxTimestamp::from(movement.performed_at))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::test::TestDb;

    use super::*;

    #[tokio::test]
    #[ignore = "requires a docker daemon"]
    async fn recorded_movements_are_listed_per_product() -> TestResult {
        let db = TestDb::new().await;
        let ledger = PgStockMovements::new(db.pool().clone());
        let product = ProductId::new();

        ledger
            .record(StockMovement {
                id: MovementId::new(),
                product_id: product,
                site_id: SiteId::new(),
                product_name: "Coffee 250g".to_string(),
                direction: StockDirection::Out,
                quantity: 3,
                reason: "damaged".to_string(),
                performed_by: ActorId::new(),
                performed_at: Timestamp::now(),
            })
            .await?;

        let listed = ledger.for_product(product).await?;
        let other = ledger.for_product(ProductId::new()).await?;

        assert_eq!(
            listed.iter().map(|m| (m.direction, m.quantity)).collect::<Vec<_>>(),
            vec![(StockDirection::Out, 3)]
        );
        assert!(other.is_empty());

        Ok(())
    }
}
