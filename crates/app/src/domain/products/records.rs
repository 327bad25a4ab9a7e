//! Product Records

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Row, postgres::PgRow};
use stockgate::{
    ids::{ActorId, ProductId, SiteId},
    products::{ApprovalStatus, BarcodeType, Product},
};
use uuid::Uuid;

use crate::database::{get_opt_u64, get_parsed, get_u64};

/// A `products` row.
#[derive(Debug, Clone)]
pub(crate) struct ProductRecord(pub(crate) Product);

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(Product {
            id: ProductId::from_uuid(row.try_get("uuid")?),
            site_id: SiteId::from_uuid(row.try_get("site_uuid")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            price: get_u64(row, "price")?,
            cost_price: get_opt_u64(row, "cost_price")?,
            stock: get_u64(row, "stock")?,
            min_stock: get_opt_u64(row, "min_stock")?,
            location: row.try_get("location")?,
            barcode: row.try_get("barcode")?,
            barcode_type: row
                .try_get::<Option<String>, _>("barcode_type")?
                .as_deref()
                .map(BarcodeType::parse),
            approval_status: get_parsed(row, "approval_status", ApprovalStatus::parse)?,
            created_by: ActorId::from_uuid(row.try_get("created_by")?),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            approved_by: row
                .try_get::<Option<Uuid>, _>("approved_by")?
                .map(ActorId::from_uuid),
            approved_at: row
                .try_get::<Option<SqlxTimestamp>, _>("approved_at")?
                .map(SqlxTimestamp::to_jiff),
            rejected_by: row
                .try_get::<Option<Uuid>, _>("rejected_by")?
                .map(ActorId::from_uuid),
            rejected_at: row
                .try_get::<Option<SqlxTimestamp>, _>("rejected_at")?
                .map(SqlxTimestamp::to_jiff),
            rejection_reason: row.try_get("rejection_reason")?,
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        }))
    }
}
