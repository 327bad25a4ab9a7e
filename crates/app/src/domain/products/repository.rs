//! Products Repository

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{PgPool, Postgres, error::ErrorKind, query, query_as, query_scalar};
use stockgate::{
    ids::{ActorId, ProductId, SiteId},
    products::{Product, ProductPatch},
    repository::{ProductRepository, StoreError},
    requests::{StockDelta, StockDirection},
};

use crate::{
    database::{opt_to_i64, store_error, to_i64, violation_kind},
    domain::products::records::ProductRecord,
};

const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const GET_PRODUCT_BY_SKU_SQL: &str = include_str!("sql/get_product_by_sku.sql");
const CREATE_PRODUCT_SQL: &str = include_str!("sql/create_product.sql");
const UPDATE_PRODUCT_SQL: &str = include_str!("sql/update_product.sql");
const DELETE_PRODUCT_SQL: &str = include_str!("sql/delete_product.sql");
const ADJUST_STOCK_SQL: &str = include_str!("sql/adjust_stock.sql");
const GET_STOCK_SQL: &str = include_str!("sql/get_stock.sql");

/// Product catalog backed by the `products` table.
///
/// SKU uniqueness rests on the `products_sku_key` unique index and stock
/// moves through a single conditional `UPDATE`, so neither depends on a
/// client-side read.
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sku_error(sku: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |error| match violation_kind(&error) {
        Some(ErrorKind::UniqueViolation) => StoreError::DuplicateSku(sku.to_string()),
        _ => store_error(error),
    }
}

fn signed(delta: StockDelta) -> Result<i64, StoreError> {
    let quantity = to_i64(delta.quantity, "stock").map_err(store_error)?;

    Ok(match delta.direction {
        StockDirection::In => quantity,
        StockDirection::Out => -quantity,
    })
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let record = query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(record.map(|record| record.0))
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let record = query_as::<Postgres, ProductRecord>(GET_PRODUCT_BY_SKU_SQL)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(record.map(|record| record.0))
    }

    #[tracing::instrument(
        name = "products.repository.insert",
        skip(self, product),
        fields(product_id = %product.id, sku = %product.sku),
        err
    )]
    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let record = query_as::<Postgres, ProductRecord>(CREATE_PRODUCT_SQL)
            .bind(product.id.into_uuid())
            .bind(product.site_id.into_uuid())
            .bind(&product.sku)
            .bind(&product.name)
            .bind(&product.category)
            .bind(to_i64(product.price, "price").map_err(store_error)?)
            .bind(opt_to_i64(product.cost_price, "cost_price").map_err(store_error)?)
            .bind(to_i64(product.stock, "stock").map_err(store_error)?)
            .bind(opt_to_i64(product.min_stock, "min_stock").map_err(store_error)?)
            .bind(&product.location)
            .bind(&product.barcode)
            .bind(product.barcode_type.map(|kind| kind.as_str()))
            .bind(product.approval_status.as_str())
            .bind(product.created_by.into_uuid())
            .bind(SqlxTimestamp::from(product.created_at))
            .bind(product.approved_by.map(|id| id.into_uuid()))
            .bind(product.approved_at.map(SqlxTimestamp::from))
            .bind(product.rejected_by.map(|id| id.into_uuid()))
            .bind(product.rejected_at.map(SqlxTimestamp::from))
            .bind(&product.rejection_reason)
            .bind(SqlxTimestamp::from(product.updated_at))
            .fetch_one(&self.pool)
            .await
            .map_err(sku_error(&product.sku))?;

        Ok(record.0)
    }

    #[tracing::instrument(
        name = "products.repository.update",
        skip(self, patch, approved_by, at),
        fields(product_id = %id),
        err
    )]
    async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        approved_by: ActorId,
        at: Timestamp,
    ) -> Result<Product, StoreError> {
        // Absent fields bind as NULL and COALESCE keeps the stored value.
        let record = query_as::<Postgres, ProductRecord>(UPDATE_PRODUCT_SQL)
            .bind(id.into_uuid())
            .bind(patch.site_id.map(SiteId::into_uuid))
            .bind(&patch.sku)
            .bind(&patch.name)
            .bind(&patch.category)
            .bind(opt_to_i64(patch.price, "price").map_err(store_error)?)
            .bind(opt_to_i64(patch.cost_price, "cost_price").map_err(store_error)?)
            .bind(opt_to_i64(patch.min_stock, "min_stock").map_err(store_error)?)
            .bind(&patch.location)
            .bind(&patch.barcode)
            .bind(patch.barcode_type.map(|kind| kind.as_str()))
            .bind(approved_by.into_uuid())
            .bind(SqlxTimestamp::from(at))
            .fetch_optional(&self.pool)
            .await
            .map_err(sku_error(patch.sku.as_deref().unwrap_or_default()))?;

        record.map(|record| record.0).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let rows_affected = query(DELETE_PRODUCT_SQL)
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(store_error)?
            .rows_affected();

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(
        name = "products.repository.adjust_stock",
        skip(self),
        fields(product_id = %id),
        err
    )]
    async fn adjust_stock(&self, id: ProductId, delta: StockDelta) -> Result<Product, StoreError> {
        let record = query_as::<Postgres, ProductRecord>(ADJUST_STOCK_SQL)
            .bind(id.into_uuid())
            .bind(signed(delta)?)
            .bind(SqlxTimestamp::from(Timestamp::now()))
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        if let Some(record) = record {
            return Ok(record.0);
        }

        // The guard refused the write; tell a missing row from a short one.
        let stock: Option<i64> = query_scalar(GET_STOCK_SQL)
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match stock {
            None => Err(StoreError::NotFound),
            Some(stock) => Err(StoreError::InsufficientStock {
                available: u64::try_from(stock).unwrap_or_default(),
                requested: delta.quantity,
            }),
        }
    }
}
