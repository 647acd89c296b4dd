//! Shopping cart module.
//!
//! Contains the cart, its line items and the adjustments the pricing
//! pipeline attaches to them.

mod adjustment;
mod cart;

pub use adjustment::PriceAdjustment;
pub use cart::{Cart, LineItem, LineItemKind, PricingState, MAX_QUANTITY_PER_ITEM};
