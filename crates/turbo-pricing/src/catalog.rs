//! Product lookup.
//!
//! The catalog itself lives outside this crate. Modifiers that need to pull
//! a product into the cart (gift rules) go through [`ProductCatalog`].

use std::collections::HashMap;

use crate::error::CommerceError;
use crate::ids::ProductId;
use crate::money::Money;
use serde::{Deserialize, Serialize};

/// The slice of a catalog product a cart line needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRef {
    /// Product identifier.
    pub id: ProductId,
    /// Stock keeping unit.
    pub sku: String,
    /// Product name (denormalized for display).
    pub name: String,
    /// Current unit price.
    pub unit_price: Money,
}

impl ProductRef {
    /// Create a product reference.
    pub fn new(
        id: impl Into<ProductId>,
        sku: impl Into<String>,
        name: impl Into<String>,
        unit_price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            sku: sku.into(),
            name: name.into(),
            unit_price,
        }
    }
}

/// How to look a product up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProductCriteria {
    /// By product identifier.
    Id(ProductId),
    /// By SKU.
    Sku(String),
}

impl std::fmt::Display for ProductCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductCriteria::Id(id) => write!(f, "id:{}", id),
            ProductCriteria::Sku(sku) => write!(f, "sku:{}", sku),
        }
    }
}

/// Product lookup backend.
pub trait ProductCatalog: Send + Sync {
    /// Resolve a single product. Missing products are an error.
    fn resolve(&self, criteria: &ProductCriteria) -> Result<ProductRef, CommerceError>;
}

/// Catalog held in memory, keyed by product id with a SKU index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: HashMap<ProductId, ProductRef>,
    by_sku: HashMap<String, ProductId>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product.
    pub fn insert(&mut self, product: ProductRef) {
        if let Some(previous) = self.products.get(&product.id) {
            self.by_sku.remove(&previous.sku);
        }
        self.by_sku.insert(product.sku.clone(), product.id.clone());
        self.products.insert(product.id.clone(), product);
    }

    /// Builder-style insert.
    pub fn with_product(mut self, product: ProductRef) -> Self {
        self.insert(product);
        self
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn resolve(&self, criteria: &ProductCriteria) -> Result<ProductRef, CommerceError> {
        let id = match criteria {
            ProductCriteria::Id(id) => Some(id),
            ProductCriteria::Sku(sku) => self.by_sku.get(sku),
        };
        id.and_then(|id| self.products.get(id))
            .cloned()
            .ok_or_else(|| CommerceError::ProductNotFound(criteria.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn sample() -> ProductRef {
        ProductRef::new("prod-sample", "SAMPLE", "Sample", Money::new(1500, Currency::USD))
    }

    #[test]
    fn test_resolve_by_id_and_sku() {
        let catalog = InMemoryCatalog::new().with_product(sample());

        let by_id = catalog
            .resolve(&ProductCriteria::Id(ProductId::new("prod-sample")))
            .unwrap();
        let by_sku = catalog
            .resolve(&ProductCriteria::Sku("SAMPLE".to_string()))
            .unwrap();
        assert_eq!(by_id, by_sku);
        assert_eq!(by_id.name, "Sample");
    }

    #[test]
    fn test_resolve_missing() {
        let catalog = InMemoryCatalog::new();
        let err = catalog
            .resolve(&ProductCriteria::Sku("NOPE".to_string()))
            .unwrap_err();
        assert_eq!(err, CommerceError::ProductNotFound("sku:NOPE".to_string()));
    }

    #[test]
    fn test_reinsert_updates_sku_index() {
        let mut catalog = InMemoryCatalog::new().with_product(sample());
        let mut renamed = sample();
        renamed.sku = "SAMPLE-2".to_string();
        catalog.insert(renamed);

        assert_eq!(catalog.len(), 1);
        assert!(catalog
            .resolve(&ProductCriteria::Sku("SAMPLE".to_string()))
            .is_err());
        assert!(catalog
            .resolve(&ProductCriteria::Sku("SAMPLE-2".to_string()))
            .is_ok());
    }
}
