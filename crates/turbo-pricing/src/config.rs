//! Declarative pipeline configuration.
//!
//! A `PricingConfig` describes the pipeline settings and the ordered list
//! of rules. It deserializes from any serde format; the CLI reads it from
//! TOML or JSON.
//!
//! ```toml
//! [pipeline]
//! max_passes = 10
//!
//! [[modifiers]]
//! type = "percentage"
//! name = "spring-sale"
//! label = "Spring sale"
//! basis_points = 1000
//!
//! [[modifiers]]
//! type = "threshold_gift"
//! name = "free-sample"
//! threshold_cents = 10000
//! gift_sku = "SAMPLE"
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{ProductCatalog, ProductCriteria};
use crate::error::PricingError;
use crate::ids::ProductId;
use crate::modifier::Modifier;
use crate::modifiers::{
    CatalogGift, DiscountValue, ItemCondition, ItemDiscount, OrderDiscount, ThresholdGiftConfig,
    ThresholdGiftModifier,
};
use crate::money::{Currency, Money};
use crate::pipeline::{ModifierPipeline, PipelineConfig};

/// Pipeline settings plus the ordered rule list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PricingConfig {
    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Rules, in application order.
    #[serde(default)]
    pub modifiers: Vec<ModifierConfig>,
}

impl PricingConfig {
    /// Build a ready-to-run pipeline. Amounts are read in `currency`.
    pub fn build_pipeline(
        &self,
        currency: Currency,
        catalog: &Arc<dyn ProductCatalog>,
    ) -> Result<ModifierPipeline, PricingError> {
        self.pipeline.validate()?;
        let modifiers = self
            .modifiers
            .iter()
            .map(|m| m.build(currency, catalog))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ModifierPipeline::new(modifiers).with_config(self.pipeline))
    }
}

/// One rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModifierConfig {
    /// Percentage off qualifying lines.
    Percentage {
        name: String,
        label: String,
        basis_points: i64,
        #[serde(default)]
        products: Vec<ProductId>,
        #[serde(default)]
        min_quantity: Option<i64>,
    },
    /// Fixed amount off qualifying lines.
    Fixed {
        name: String,
        label: String,
        amount_cents: i64,
        #[serde(default)]
        products: Vec<ProductId>,
        #[serde(default)]
        min_quantity: Option<i64>,
    },
    /// Cart level discount. Exactly one of `percentage_bps`, `amount_cents`.
    OrderDiscount {
        name: String,
        label: String,
        #[serde(default)]
        percentage_bps: Option<i64>,
        #[serde(default)]
        amount_cents: Option<i64>,
        #[serde(default)]
        minimum_cents: Option<i64>,
    },
    /// Free gift at a threshold. Exactly one of `gift_sku`, `gift_id`.
    ThresholdGift {
        name: String,
        threshold_cents: i64,
        #[serde(default)]
        gift_sku: Option<String>,
        #[serde(default)]
        gift_id: Option<ProductId>,
        #[serde(default)]
        label: Option<String>,
    },
}

impl ModifierConfig {
    /// Rule name.
    pub fn name(&self) -> &str {
        match self {
            ModifierConfig::Percentage { name, .. }
            | ModifierConfig::Fixed { name, .. }
            | ModifierConfig::OrderDiscount { name, .. }
            | ModifierConfig::ThresholdGift { name, .. } => name,
        }
    }

    /// Build and validate the rule.
    pub fn build(
        &self,
        currency: Currency,
        catalog: &Arc<dyn ProductCatalog>,
    ) -> Result<Box<dyn Modifier>, PricingError> {
        let modifier: Box<dyn Modifier> = match self {
            ModifierConfig::Percentage {
                name,
                label,
                basis_points,
                products,
                min_quantity,
            } => Box::new(item_discount(
                ItemDiscount::percentage(name, label, *basis_points),
                products,
                *min_quantity,
            )),
            ModifierConfig::Fixed {
                name,
                label,
                amount_cents,
                products,
                min_quantity,
            } => Box::new(item_discount(
                ItemDiscount::fixed(name, label, Money::new(*amount_cents, currency)),
                products,
                *min_quantity,
            )),
            ModifierConfig::OrderDiscount {
                name,
                label,
                percentage_bps,
                amount_cents,
                minimum_cents,
            } => {
                let value = match (percentage_bps, amount_cents) {
                    (Some(bps), None) => DiscountValue::Percentage { basis_points: *bps },
                    (None, Some(cents)) => DiscountValue::Fixed(Money::new(*cents, currency)),
                    _ => {
                        return Err(PricingError::configuration(
                            name,
                            "set exactly one of percentage_bps or amount_cents",
                        ))
                    }
                };
                let mut discount = OrderDiscount::new(name, label, value);
                if let Some(minimum) = minimum_cents {
                    discount = discount.with_minimum_purchase(Money::new(*minimum, currency));
                }
                Box::new(discount)
            }
            ModifierConfig::ThresholdGift {
                name,
                threshold_cents,
                gift_sku,
                gift_id,
                label,
            } => {
                let mut config =
                    ThresholdGiftConfig::new(name, Money::new(*threshold_cents, currency));
                let criteria = match (gift_sku, gift_id) {
                    (Some(sku), None) => Some(ProductCriteria::Sku(sku.clone())),
                    (None, Some(id)) => Some(ProductCriteria::Id(id.clone())),
                    (None, None) => None,
                    (Some(_), Some(_)) => {
                        return Err(PricingError::configuration(
                            name,
                            "set only one of gift_sku or gift_id",
                        ))
                    }
                };
                if let Some(criteria) = criteria {
                    config = config.with_resolver(CatalogGift::new(Arc::clone(catalog), criteria));
                }
                if let Some(label) = label {
                    config = config.with_label(label);
                }
                Box::new(ThresholdGiftModifier::new(config)?)
            }
        };
        modifier.validate()?;
        Ok(modifier)
    }
}

fn item_discount(
    mut discount: ItemDiscount,
    products: &[ProductId],
    min_quantity: Option<i64>,
) -> ItemDiscount {
    if !products.is_empty() {
        discount = discount.with_condition(ItemCondition::SpecificProducts(products.to_vec()));
    }
    if let Some(quantity) = min_quantity {
        discount = discount.with_minimum_quantity(quantity);
    }
    discount
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, ProductRef};

    fn catalog() -> Arc<dyn ProductCatalog> {
        Arc::new(InMemoryCatalog::new().with_product(ProductRef::new(
            "prod-sample",
            "SAMPLE",
            "Sample",
            Money::new(1500, Currency::USD),
        )))
    }

    const CONFIG: &str = r#"
        [pipeline]
        max_passes = 4

        [[modifiers]]
        type = "percentage"
        name = "spring-sale"
        label = "Spring sale"
        basis_points = 1000
        min_quantity = 2

        [[modifiers]]
        type = "order_discount"
        name = "loyalty"
        label = "Loyalty"
        amount_cents = 500
        minimum_cents = 5000

        [[modifiers]]
        type = "threshold_gift"
        name = "free-sample"
        threshold_cents = 10000
        gift_sku = "SAMPLE"
    "#;

    #[test]
    fn test_parse_and_build() {
        let config: PricingConfig = toml::from_str(CONFIG).unwrap();
        assert_eq!(config.pipeline.max_passes, 4);
        assert_eq!(config.modifiers.len(), 3);
        assert_eq!(config.modifiers[2].name(), "free-sample");

        let pipeline = config.build_pipeline(Currency::USD, &catalog()).unwrap();
        assert_eq!(
            pipeline.modifier_names(),
            vec!["spring-sale", "loyalty", "free-sample"]
        );
        assert_eq!(pipeline.config().max_passes, 4);
    }

    #[test]
    fn test_defaults() {
        let config: PricingConfig = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.max_passes, crate::pipeline::DEFAULT_MAX_PASSES);
        assert!(config.modifiers.is_empty());
    }

    #[test]
    fn test_gift_without_product_is_configuration_error() {
        let config = ModifierConfig::ThresholdGift {
            name: "free-sample".to_string(),
            threshold_cents: 10000,
            gift_sku: None,
            gift_id: None,
            label: None,
        };
        let err = config.build(Currency::USD, &catalog()).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_order_discount_needs_one_value() {
        let config = ModifierConfig::OrderDiscount {
            name: "loyalty".to_string(),
            label: "Loyalty".to_string(),
            percentage_bps: Some(500),
            amount_cents: Some(500),
            minimum_cents: None,
        };
        assert!(config.build(Currency::USD, &catalog()).err().unwrap().is_configuration());
    }

    #[test]
    fn test_invalid_percentage_rejected_at_build() {
        let config = ModifierConfig::Percentage {
            name: "too-much".to_string(),
            label: "Too much".to_string(),
            basis_points: 15000,
            products: Vec::new(),
            min_quantity: None,
        };
        assert!(config.build(Currency::USD, &catalog()).err().unwrap().is_configuration());
    }
}
