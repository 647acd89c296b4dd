//! Pricing file: catalog, cart contents and rules in one document.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use turbo_pricing::cart::{Cart, LineItem};
use turbo_pricing::catalog::{InMemoryCatalog, ProductCatalog, ProductCriteria, ProductRef};
use turbo_pricing::config::{ModifierConfig, PricingConfig};
use turbo_pricing::pipeline::PipelineConfig;
use turbo_pricing::{Currency, Money};

/// A pricing file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingFile {
    /// Currency for every amount in the file.
    #[serde(default)]
    pub currency: Currency,

    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Products available to the cart and to gift rules.
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,

    /// Cart lines.
    #[serde(default)]
    pub cart: Vec<CartLine>,

    /// Rules, in application order.
    #[serde(default)]
    pub modifiers: Vec<ModifierConfig>,
}

impl PricingFile {
    /// Load a pricing file. `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pricing file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON pricing file: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML pricing file: {}", path))
        }
    }

    /// Build the in-memory catalog.
    pub fn catalog(&self) -> InMemoryCatalog {
        self.catalog
            .iter()
            .fold(InMemoryCatalog::new(), |catalog, entry| {
                catalog.with_product(entry.to_product(self.currency))
            })
    }

    /// Pipeline settings and rules.
    pub fn pricing_config(&self) -> PricingConfig {
        PricingConfig {
            pipeline: self.pipeline,
            modifiers: self.modifiers.clone(),
        }
    }

    /// Fill a fresh cart from the cart lines.
    pub fn build_cart(&self, catalog: &Arc<dyn ProductCatalog>) -> Result<Cart> {
        let mut cart = Cart::new(self.currency);
        for line in &self.cart {
            let product = catalog
                .resolve(&ProductCriteria::Sku(line.sku.clone()))
                .with_context(|| format!("Cart line refers to unknown SKU {}", line.sku))?;
            let item = LineItem::new(product, line.quantity)
                .with_context(|| format!("Invalid cart line for {}", line.sku))?;
            cart.add_item(item, true)?;
        }
        Ok(cart)
    }
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Product identifier. Defaults to the SKU.
    #[serde(default)]
    pub id: Option<String>,
    /// Stock keeping unit.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Unit price in minor units.
    pub price_cents: i64,
}

impl CatalogEntry {
    fn to_product(&self, currency: Currency) -> ProductRef {
        let id = self.id.clone().unwrap_or_else(|| self.sku.clone());
        ProductRef::new(
            id,
            self.sku.clone(),
            self.name.clone(),
            Money::new(self.price_cents, currency),
        )
    }
}

/// A cart line by SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// SKU to add.
    pub sku: String,
    /// Quantity.
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}
