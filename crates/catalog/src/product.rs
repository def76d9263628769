//! Product record and update patch.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Product category, a fixed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Flower,
    GreenLeaf,
}

impl ProductCategory {
    /// Returns the category name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Flower => "flower",
            ProductCategory::GreenLeaf => "green_leaf",
        }
    }

    /// Parses a category from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "flower" => Some(ProductCategory::Flower),
            "green_leaf" => Some(ProductCategory::GreenLeaf),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A product in the catalog.
///
/// The stock counter is only mutated through the store's
/// `conditional_decrement` and `increment` operations, never by direct
/// field assignment from callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier (SKU).
    pub id: ProductId,

    /// Human-readable product name.
    pub name: String,

    /// Product category.
    pub category: ProductCategory,

    /// Unit price in minor units.
    pub price: Money,

    /// Units currently in stock.
    pub stock: u32,

    /// Image location for the presentation layer.
    pub image_url: String,

    /// Descriptive text.
    pub description: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a validated product record.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: ProductCategory,
        price: Money,
        stock: u32,
        image_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidProduct {
                reason: "product name is required".to_string(),
            });
        }
        if price.is_negative() {
            return Err(CatalogError::InvalidProduct {
                reason: format!("price must be non-negative, got {}", price.cents()),
            });
        }

        Ok(Self {
            id: id.into(),
            name,
            category,
            price,
            stock,
            image_url: image_url.into(),
            description: description.into(),
            created_at: Utc::now(),
        })
    }

    /// Returns true if the requested quantity can be served from stock.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}

/// Partial update for a product.
///
/// `None` means "leave the field unchanged". `Some(0)` for price or stock
/// and `Some("")` for text fields are explicit values, distinguishable
/// from absence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl ProductPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.image_url.is_none()
            && self.description.is_none()
    }

    /// Applies the patch to a product in place.
    pub fn apply(&self, product: &mut Product) -> Result<(), CatalogError> {
        if let Some(ref name) = self.name {
            if name.trim().is_empty() {
                return Err(CatalogError::InvalidProduct {
                    reason: "product name is required".to_string(),
                });
            }
            product.name = name.clone();
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            if price.is_negative() {
                return Err(CatalogError::InvalidProduct {
                    reason: format!("price must be non-negative, got {}", price.cents()),
                });
            }
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(ref image_url) = self.image_url {
            product.image_url = image_url.clone();
        }
        if let Some(ref description) = self.description {
            product.description = description.clone();
        }
        Ok(())
    }
}
