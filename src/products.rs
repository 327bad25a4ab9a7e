//! Products
//!
//! The catalog record plus the two payload shapes the workflow carries for it:
//! [`ProductDraft`] for creations and [`ProductPatch`] for edits.
//!
//! A patch has no `stock` field. Stock only moves through stock adjustments,
//! initial creation and putaway, so a `stock` key in an incoming edit snapshot
//! is dropped when the patch is deserialised.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{ActorId, ProductId, SiteId};

/// Longest accepted product name, in characters.
pub const MAX_NAME_LEN: usize = 200;

/// Highest accepted price, in minor units.
pub const MAX_PRICE: u64 = 100_000_000;

/// Approval state of a catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Visible to normal consumers.
    Approved,
    /// Legacy rows awaiting approval.
    Pending,
    /// Legacy rows that were turned down.
    Rejected,
}

impl ApprovalStatus {
    /// Stable snake-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    /// Parse a stored status name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(Self::Approved),
            "pending" => Some(Self::Pending),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Barcode symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeType {
    /// EAN-13.
    #[serde(rename = "EAN-13")]
    Ean13,
    /// UPC-A.
    #[serde(rename = "UPC-A")]
    UpcA,
    /// Code 128.
    #[serde(rename = "CODE128")]
    Code128,
    /// Code 39.
    #[serde(rename = "CODE39")]
    Code39,
    /// QR code.
    #[serde(rename = "QR")]
    Qr,
    /// Anything else.
    #[serde(rename = "OTHER")]
    Other,
}

impl BarcodeType {
    /// Stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BarcodeType::Ean13 => "EAN-13",
            BarcodeType::UpcA => "UPC-A",
            BarcodeType::Code128 => "CODE128",
            BarcodeType::Code39 => "CODE39",
            BarcodeType::Qr => "QR",
            BarcodeType::Other => "OTHER",
        }
    }

    /// Parse a stored name; unknown symbologies map to [`BarcodeType::Other`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "EAN-13" => Self::Ean13,
            "UPC-A" => Self::UpcA,
            "CODE128" => Self::Code128,
            "CODE39" => Self::Code39,
            "QR" => Self::Qr,
            _ => Self::Other,
        }
    }
}

/// Shelf availability derived from stock levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    /// Stock above the reorder threshold.
    Active,
    /// Stock at or below the reorder threshold.
    LowStock,
    /// No stock.
    OutOfStock,
}

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id.
    pub id: ProductId,
    /// Owning site.
    pub site_id: SiteId,
    /// Catalog-wide unique stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub category: String,
    /// Retail price, in minor units.
    pub price: u64,
    /// Cost of goods, in minor units.
    pub cost_price: Option<u64>,
    /// Units on hand.
    pub stock: u64,
    /// Reorder threshold.
    pub min_stock: Option<u64>,
    /// Bin, shelf or site-level label.
    pub location: Option<String>,
    /// External barcode.
    pub barcode: Option<String>,
    /// Barcode symbology.
    pub barcode_type: Option<BarcodeType>,
    /// Approval state.
    pub approval_status: ApprovalStatus,
    /// Who proposed the product.
    pub created_by: ActorId,
    /// When the product row was created.
    pub created_at: Timestamp,
    /// Who last approved a change to the product.
    pub approved_by: Option<ActorId>,
    /// When the product was last approved.
    pub approved_at: Option<Timestamp>,
    /// Who rejected the product (legacy rows only).
    pub rejected_by: Option<ActorId>,
    /// When the product was rejected (legacy rows only).
    pub rejected_at: Option<Timestamp>,
    /// Why the product was rejected (legacy rows only).
    pub rejection_reason: Option<String>,
    /// Last modification.
    pub updated_at: Timestamp,
}

impl Product {
    /// Whether normal consumers (POS, stock views) should see this product.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self.approval_status, ApprovalStatus::Approved)
    }

    /// Availability derived from stock and the reorder threshold.
    #[must_use]
    pub fn stock_status(&self) -> StockStatus {
        match (self.stock, self.min_stock) {
            (0, _) => StockStatus::OutOfStock,
            (stock, Some(min)) if stock <= min => StockStatus::LowStock,
            _ => StockStatus::Active,
        }
    }
}

/// Product validation failures, collected rather than reported one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .problems.join("; "))]
pub struct InvalidProduct {
    /// Every problem found.
    pub problems: Vec<String>,
}

/// Proposed product for a creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    /// Target site.
    pub site_id: Option<SiteId>,
    /// Stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Category.
    pub category: String,
    /// Retail price, in minor units.
    pub price: Option<u64>,
    /// Cost of goods, in minor units.
    pub cost_price: Option<u64>,
    /// Initial units on hand.
    pub stock: u64,
    /// Reorder threshold.
    pub min_stock: Option<u64>,
    /// Bin, shelf or site-level label.
    pub location: Option<String>,
    /// External barcode.
    pub barcode: Option<String>,
    /// Barcode symbology.
    pub barcode_type: Option<BarcodeType>,
}

impl ProductDraft {
    /// Check required fields and value ranges.
    ///
    /// # Errors
    ///
    /// Returns every problem found when the draft is not acceptable.
    pub fn validate(&self) -> Result<(), InvalidProduct> {
        let mut problems = Vec::new();

        if self.site_id.is_none() {
            problems.push("site is required".to_string());
        }

        check_name(&self.name, &mut problems);
        check_sku(&self.sku, &mut problems);
        check_category(&self.category, &mut problems);

        match self.price {
            None => problems.push("price is required".to_string()),
            Some(price) => check_prices(price, self.cost_price, &mut problems),
        }

        finish(problems)
    }

    /// Build the catalog row for an approved draft.
    #[must_use]
    pub fn into_product(
        self,
        site_id: SiteId,
        created_by: ActorId,
        approved_by: ActorId,
        now: Timestamp,
    ) -> Product {
        Product {
            id: ProductId::new(),
            site_id,
            sku: self.sku,
            name: self.name,
            category: self.category,
            price: self.price.unwrap_or_default(),
            cost_price: self.cost_price,
            stock: self.stock,
            min_stock: self.min_stock,
            location: self.location,
            barcode: self.barcode,
            barcode_type: self.barcode_type,
            approval_status: ApprovalStatus::Approved,
            created_by,
            created_at: now,
            approved_by: Some(approved_by),
            approved_at: Some(now),
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            updated_at: now,
        }
    }
}

/// Field-level changes for an edit. Absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    /// Move the product to another site.
    pub site_id: Option<SiteId>,
    /// New stock keeping unit.
    pub sku: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New retail price.
    pub price: Option<u64>,
    /// New cost price.
    pub cost_price: Option<u64>,
    /// New reorder threshold.
    pub min_stock: Option<u64>,
    /// New location label.
    pub location: Option<String>,
    /// New barcode.
    pub barcode: Option<String>,
    /// New barcode symbology.
    pub barcode_type: Option<BarcodeType>,
}

impl ProductPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check the fields the patch touches, against the product they will land on.
    ///
    /// # Errors
    ///
    /// Returns every problem found when the patched product would be invalid.
    pub fn validate(&self, current: &Product) -> Result<(), InvalidProduct> {
        let mut problems = Vec::new();

        if self.is_empty() {
            problems.push("no changes proposed".to_string());
        }

        if let Some(name) = &self.name {
            check_name(name, &mut problems);
        }

        if let Some(sku) = &self.sku {
            check_sku(sku, &mut problems);
        }

        if let Some(category) = &self.category {
            check_category(category, &mut problems);
        }

        if self.price.is_some() || self.cost_price.is_some() {
            check_prices(
                self.price.unwrap_or(current.price),
                self.cost_price.or(current.cost_price),
                &mut problems,
            );
        }

        finish(problems)
    }

    /// Overwrite only the fields present in the patch.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(site_id) = self.site_id {
            product.site_id = site_id;
        }
        if let Some(sku) = &self.sku {
            product.sku.clone_from(sku);
        }
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(category) = &self.category {
            product.category.clone_from(category);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if self.cost_price.is_some() {
            product.cost_price = self.cost_price;
        }
        if self.min_stock.is_some() {
            product.min_stock = self.min_stock;
        }
        if self.location.is_some() {
            product.location.clone_from(&self.location);
        }
        if self.barcode.is_some() {
            product.barcode.clone_from(&self.barcode);
        }
        if self.barcode_type.is_some() {
            product.barcode_type = self.barcode_type;
        }
    }
}

/// Whether `sku` is made only of uppercase letters, digits and hyphens.
#[must_use]
pub fn is_valid_sku(sku: &str) -> bool {
    !sku.is_empty()
        && sku
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
}

fn check_name(name: &str, problems: &mut Vec<String>) {
    if name.trim().is_empty() {
        problems.push("name is required".to_string());
    } else if name.chars().count() > MAX_NAME_LEN {
        problems.push(format!("name must be at most {MAX_NAME_LEN} characters"));
    }
}

fn check_sku(sku: &str, problems: &mut Vec<String>) {
    if sku.trim().is_empty() {
        problems.push("sku is required".to_string());
    } else if !is_valid_sku(sku) {
        problems.push("sku may only contain uppercase letters, digits and hyphens".to_string());
    }
}

fn check_category(category: &str, problems: &mut Vec<String>) {
    if category.trim().is_empty() {
        problems.push("category is required".to_string());
    }
}

fn check_prices(price: u64, cost_price: Option<u64>, problems: &mut Vec<String>) {
    if price > MAX_PRICE {
        problems.push(format!("price must not exceed {MAX_PRICE}"));
    }

    if cost_price.is_some_and(|cost| cost > price) {
        problems.push("cost price must not exceed price".to_string());
    }
}

fn finish(problems: Vec<String>) -> Result<(), InvalidProduct> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(InvalidProduct { problems })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            site_id: Some(SiteId::new()),
            sku: "X-001".to_string(),
            name: "Teff Flour 1kg".to_string(),
            category: "Grains".to_string(),
            price: Some(12_50),
            cost_price: Some(9_00),
            stock: 10,
            ..ProductDraft::default()
        }
    }

    fn product() -> Product {
        draft().into_product(
            SiteId::new(),
            ActorId::new(),
            ActorId::new(),
            Timestamp::now(),
        )
    }

    #[test]
    fn complete_draft_is_valid() {
        assert_eq!(draft().validate(), Ok(()));
    }

    #[test]
    fn draft_reports_every_missing_field() {
        let result = ProductDraft::default().validate();

        let Err(InvalidProduct { problems }) = result else {
            unreachable!("an empty draft must be invalid");
        };

        assert_eq!(problems.len(), 5, "site, name, sku, category and price: {problems:?}");
    }

    #[test]
    fn lowercase_sku_is_rejected() {
        let result = ProductDraft {
            sku: "x-001".to_string(),
            ..draft()
        }
        .validate();

        assert!(result.is_err(), "expected invalid sku, got {result:?}");
    }

    #[test]
    fn cost_above_price_is_rejected() {
        let result = ProductDraft {
            cost_price: Some(20_00),
            ..draft()
        }
        .validate();

        assert!(result.is_err(), "expected cost/price error, got {result:?}");
    }

    #[test]
    fn overlong_name_is_rejected() {
        let result = ProductDraft {
            name: "a".repeat(MAX_NAME_LEN + 1),
            ..draft()
        }
        .validate();

        assert!(result.is_err(), "expected name length error, got {result:?}");
    }

    #[test]
    fn approved_draft_keeps_initial_stock() {
        let product = product();

        assert_eq!(product.stock, 10);
        assert_eq!(product.approval_status, ApprovalStatus::Approved);
        assert!(product.approved_by.is_some());
    }

    #[test]
    fn patch_overwrites_only_present_fields() {
        let mut product = product();
        let before = product.clone();

        ProductPatch {
            name: Some("Teff Flour 2kg".to_string()),
            price: Some(20_00),
            ..ProductPatch::default()
        }
        .apply_to(&mut product);

        assert_eq!(product.name, "Teff Flour 2kg");
        assert_eq!(product.price, 20_00);
        assert_eq!(product.sku, before.sku);
        assert_eq!(product.category, before.category);
        assert_eq!(product.cost_price, before.cost_price);
        assert_eq!(product.stock, before.stock);
    }

    #[test]
    fn patch_price_is_checked_against_current_cost() {
        let product = product();

        let result = ProductPatch {
            price: Some(1_00),
            ..ProductPatch::default()
        }
        .validate(&product);

        assert!(result.is_err(), "price below cost should fail, got {result:?}");
    }

    #[test]
    fn empty_patch_is_rejected() {
        let result = ProductPatch::default().validate(&product());

        assert!(result.is_err(), "empty patch should fail, got {result:?}");
    }

    #[test]
    fn patch_ignores_stock_in_incoming_snapshot() -> Result<(), serde_json::Error> {
        let patch: ProductPatch =
            serde_json::from_str(r#"{ "name": "Renamed", "stock": 999 }"#)?;

        assert_eq!(
            patch,
            ProductPatch {
                name: Some("Renamed".to_string()),
                ..ProductPatch::default()
            }
        );

        Ok(())
    }

    #[test]
    fn stock_status_tracks_threshold() {
        let mut product = product();
        product.min_stock = Some(5);

        product.stock = 6;
        assert_eq!(product.stock_status(), StockStatus::Active);

        product.stock = 5;
        assert_eq!(product.stock_status(), StockStatus::LowStock);

        product.stock = 0;
        assert_eq!(product.stock_status(), StockStatus::OutOfStock);
    }
}
