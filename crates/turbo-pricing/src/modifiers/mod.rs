//! Built-in modifiers.

mod discount;
mod order_discount;
mod threshold_gift;

pub use discount::{DiscountValue, ItemCondition, ItemDiscount};
pub use order_discount::OrderDiscount;
pub use threshold_gift::{
    CatalogGift, GiftResolver, ThresholdGiftConfig, ThresholdGiftModifier, COMPLIMENTARY_LABEL,
};
