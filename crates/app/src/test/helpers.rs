//! Fixtures shared by repository and context tests.

use sqlx::PgPool;
use stockgate::{ids::SiteId, products::ProductDraft};

use crate::domain::sites::{PgSiteDirectory, SiteError};

pub(crate) fn draft(site: SiteId, sku: &str, stock: u64) -> ProductDraft {
    ProductDraft {
        site_id: Some(site),
        sku: sku.to_string(),
        name: format!("Product {sku}"),
        category: "Pantry".to_string(),
        price: Some(12_50),
        cost_price: Some(9_00),
        stock,
        ..ProductDraft::default()
    }
}

pub(crate) async fn seed_site(pool: &PgPool, site_type: &str) -> Result<SiteId, SiteError> {
    let site = PgSiteDirectory::new(pool.clone())
        .create_site(&format!("{site_type} site"), site_type)
        .await?;

    Ok(site.id)
}
