//! In-memory product catalog.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;

use crate::{
    ids::{ActorId, ProductId},
    products::{Product, ProductPatch},
    repository::{ProductRepository, StoreError},
    requests::{StockDelta, StockDirection},
};

#[derive(Debug, Default)]
struct Catalog {
    products: FxHashMap<ProductId, Product>,
    skus: FxHashMap<String, ProductId>,
}

impl Catalog {
    fn claim_sku(&mut self, sku: &str, owner: ProductId) -> Result<(), StoreError> {
        match self.skus.get(sku) {
            Some(holder) if *holder != owner => Err(StoreError::DuplicateSku(sku.to_string())),
            _ => {
                self.skus.insert(sku.to_string(), owner);
                Ok(())
            }
        }
    }
}

/// Product catalog held behind one lock. The SKU index is updated in the same
/// critical section as the row, so uniqueness holds under concurrent writers.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    catalog: Mutex<Catalog>,
}

impl InMemoryProductRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().products.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().products.is_empty()
    }

    /// Every product, in no particular order.
    #[must_use]
    pub fn all(&self) -> Vec<Product> {
        self.lock().products.values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Catalog> {
        self.catalog.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        let catalog = self.lock();

        Ok(catalog
            .skus
            .get(sku)
            .and_then(|id| catalog.products.get(id))
            .cloned())
    }

    async fn insert(&self, product: Product) -> Result<Product, StoreError> {
        let mut catalog = self.lock();

        catalog.claim_sku(&product.sku, product.id)?;
        catalog.products.insert(product.id, product.clone());

        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
        approved_by: ActorId,
        at: Timestamp,
    ) -> Result<Product, StoreError> {
        let mut catalog = self.lock();

        let previous_sku = catalog
            .products
            .get(&id)
            .map(|current| current.sku.clone())
            .ok_or(StoreError::NotFound)?;

        if let Some(sku) = patch.sku.as_ref().filter(|sku| **sku != previous_sku) {
            catalog.claim_sku(sku, id)?;
            catalog.skus.remove(&previous_sku);
        }

        let product = catalog.products.get_mut(&id).ok_or(StoreError::NotFound)?;

        patch.apply_to(product);
        product.approved_by = Some(approved_by);
        product.approved_at = Some(at);
        product.updated_at = at;

        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut catalog = self.lock();

        let Some(removed) = catalog.products.remove(&id) else {
            return Ok(false);
        };

        catalog.skus.remove(&removed.sku);

        Ok(true)
    }

    async fn adjust_stock(&self, id: ProductId, delta: StockDelta) -> Result<Product, StoreError> {
        let mut catalog = self.lock();

        let product = catalog.products.get_mut(&id).ok_or(StoreError::NotFound)?;

        let Some(stock) = delta.apply(product.stock) else {
            return Err(match delta.direction {
                StockDirection::Out => StoreError::InsufficientStock {
                    available: product.stock,
                    requested: delta.quantity,
                },
                StockDirection::In => {
                    StoreError::Unavailable(format!("stock for product {id} would overflow"))
                }
            });
        };

        product.stock = stock;
        product.updated_at = Timestamp::now();

        Ok(product.clone())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{ids::SiteId, products::ProductDraft};

    use super::*;

    fn product(sku: &str, stock: u64) -> Product {
        ProductDraft {
            site_id: Some(SiteId::new()),
            sku: sku.to_string(),
            name: "Injera".to_string(),
            category: "Bakery".to_string(),
            price: Some(3_00),
            stock,
            ..ProductDraft::default()
        }
        .into_product(SiteId::new(), ActorId::new(), ActorId::new(), Timestamp::now())
    }

    #[tokio::test]
    async fn insert_enforces_unique_sku() -> TestResult {
        let repo = InMemoryProductRepository::new();

        repo.insert(product("A-1", 0)).await?;
        let result = repo.insert(product("A-1", 0)).await;

        assert_eq!(result, Err(StoreError::DuplicateSku("A-1".to_string())));
        assert_eq!(repo.len(), 1);

        Ok(())
    }

    fn patch(build: impl FnOnce(&mut ProductPatch)) -> ProductPatch {
        let mut patch = ProductPatch::default();
        build(&mut patch);
        patch
    }

    #[tokio::test]
    async fn update_moves_sku_index_and_keeps_stock() -> TestResult {
        let repo = InMemoryProductRepository::new();
        let stored = repo.insert(product("A-1", 4)).await?;
        let approver = ActorId::new();

        let updated = repo
            .update(
                stored.id,
                patch(|p| p.sku = Some("A-2".to_string())),
                approver,
                Timestamp::now(),
            )
            .await?;

        assert_eq!(updated.stock, 4);
        assert_eq!(updated.approved_by, Some(approver));
        assert!(repo.get_by_sku("A-1").await?.is_none());
        assert!(repo.get_by_sku("A-2").await?.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn update_to_a_taken_sku_leaves_both_products_alone() -> TestResult {
        let repo = InMemoryProductRepository::new();
        let first = repo.insert(product("A-1", 0)).await?;
        repo.insert(product("A-2", 0)).await?;

        let result = repo
            .update(
                first.id,
                patch(|p| p.sku = Some("A-2".to_string())),
                ActorId::new(),
                Timestamp::now(),
            )
            .await;

        assert_eq!(result, Err(StoreError::DuplicateSku("A-2".to_string())));
        assert_eq!(repo.get_by_sku("A-1").await?.map(|p| p.id), Some(first.id));

        Ok(())
    }

    #[tokio::test]
    async fn updates_to_different_fields_both_land() -> TestResult {
        let repo = InMemoryProductRepository::new();
        let stored = repo.insert(product("A-1", 0)).await?;

        repo.update(
            stored.id,
            patch(|p| p.name = Some("Renamed".to_string())),
            ActorId::new(),
            Timestamp::now(),
        )
        .await?;
        repo.update(
            stored.id,
            patch(|p| p.price = Some(9_00)),
            ActorId::new(),
            Timestamp::now(),
        )
        .await?;

        let current = repo.get_by_id(stored.id).await?.ok_or("product vanished")?;

        assert_eq!((current.name.as_str(), current.price), ("Renamed", 9_00));

        Ok(())
    }

    #[tokio::test]
    async fn update_of_missing_product_is_not_found() {
        let repo = InMemoryProductRepository::new();

        let result = repo
            .update(
                ProductId::new(),
                patch(|p| p.name = Some("Ghost".to_string())),
                ActorId::new(),
                Timestamp::now(),
            )
            .await;

        assert_eq!(result, Err(StoreError::NotFound));
        assert!(repo.is_empty(), "update must not insert");
    }

    #[tokio::test]
    async fn adjust_stock_refuses_to_go_negative() -> TestResult {
        let repo = InMemoryProductRepository::new();
        let stored = repo.insert(product("A-1", 2)).await?;

        let result = repo
            .adjust_stock(
                stored.id,
                StockDelta {
                    direction: StockDirection::Out,
                    quantity: 3,
                },
            )
            .await;

        assert_eq!(
            result,
            Err(StoreError::InsufficientStock {
                available: 2,
                requested: 3
            })
        );
        assert_eq!(repo.get_by_id(stored.id).await?.map(|p| p.stock), Some(2));

        Ok(())
    }

    #[tokio::test]
    async fn overflowing_receipt_is_not_reported_as_a_shortfall() -> TestResult {
        let repo = InMemoryProductRepository::new();
        let stored = repo.insert(product("A-1", u64::MAX)).await?;

        let result = repo
            .adjust_stock(
                stored.id,
                StockDelta {
                    direction: StockDirection::In,
                    quantity: 1,
                },
            )
            .await;

        assert!(
            matches!(result, Err(StoreError::Unavailable(_))),
            "expected Unavailable, got {result:?}"
        );
        assert_eq!(
            repo.get_by_id(stored.id).await?.map(|p| p.stock),
            Some(u64::MAX)
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_frees_the_sku() -> TestResult {
        let repo = InMemoryProductRepository::new();
        let stored = repo.insert(product("A-1", 0)).await?;

        assert!(repo.delete(stored.id).await?);
        assert!(!repo.delete(stored.id).await?);

        repo.insert(product("A-1", 0)).await?;

        Ok(())
    }
}
