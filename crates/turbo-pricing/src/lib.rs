//! Multi-pass cart pricing for TurboCommerce.
//!
//! This crate prices a shopping cart by running an ordered chain of
//! modifiers over it until the cart stops changing:
//!
//! - **Cart**: line items, price adjustments, convergence flag
//! - **Modifiers**: percentage/fixed line discounts, order discounts,
//!   threshold gifts
//! - **Pipeline**: bounded pass loop with convergence detection
//! - **Config**: declarative rule lists loadable from TOML or JSON
//!
//! # Example
//!
//! ```rust
//! use turbo_pricing::prelude::*;
//!
//! let usd = |cents| Money::new(cents, Currency::USD);
//! let book = ProductRef::new("prod-book", "BOOK", "Rust Book", usd(12000));
//! let sample = ProductRef::new("prod-sample", "SAMPLE", "Sample", usd(1500));
//!
//! let gift = ThresholdGiftModifier::new(
//!     ThresholdGiftConfig::new("free-sample", usd(10000))
//!         .with_resolver(move || Ok::<_, CommerceError>(sample.clone())),
//! )
//! .unwrap();
//!
//! let pipeline = ModifierPipeline::default().with_modifier(gift);
//!
//! let mut cart = Cart::new(Currency::USD);
//! cart.add_item(LineItem::new(book, 1).unwrap(), true).unwrap();
//!
//! let run = pipeline.run(&mut cart).unwrap();
//! assert_eq!(run.passes, 2);
//! assert_eq!(cart.total_price().display(), "$120.00");
//! assert_eq!(cart.unique_item_count(), 2);
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;
pub mod config;
pub mod modifier;
pub mod modifiers;
pub mod pipeline;

pub use cart::{Cart, LineItem};
pub use error::{CommerceError, PricingError};
pub use ids::*;
pub use money::{Currency, Money};
pub use pipeline::{ModifierPipeline, PricingRun};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CommerceError, PricingError};
    pub use crate::ids::*;
    pub use crate::money::{Currency, Money};

    pub use crate::cart::{
        Cart, LineItem, LineItemKind, PriceAdjustment, PricingState, MAX_QUANTITY_PER_ITEM,
    };
    pub use crate::catalog::{InMemoryCatalog, ProductCatalog, ProductCriteria, ProductRef};
    pub use crate::config::{ModifierConfig, PricingConfig};
    pub use crate::modifier::{Modifier, PassState};
    pub use crate::modifiers::{
        CatalogGift, DiscountValue, GiftResolver, ItemCondition, ItemDiscount, OrderDiscount,
        ThresholdGiftConfig, ThresholdGiftModifier, COMPLIMENTARY_LABEL,
    };
    pub use crate::pipeline::{
        run_modifiers, ModifierPipeline, PipelineConfig, PricingRun, DEFAULT_MAX_PASSES,
    };
}
