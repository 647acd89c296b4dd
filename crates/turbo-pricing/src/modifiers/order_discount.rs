//! Cart level discount with an optional minimum purchase.

use crate::cart::{Cart, PriceAdjustment};
use crate::error::{CommerceError, PricingError};
use crate::modifier::{Modifier, PassState};
use crate::modifiers::DiscountValue;
use crate::money::Money;

/// Discount on the whole order, recorded as a cart adjustment.
///
/// Only [`Cart::grand_total`] reflects it; `total_price`, which threshold
/// rules compare against, stays the sum of the lines.
#[derive(Debug, Clone)]
pub struct OrderDiscount {
    name: String,
    label: String,
    value: DiscountValue,
    minimum_purchase: Option<Money>,
}

impl OrderDiscount {
    /// Create an order discount.
    pub fn new(name: impl Into<String>, label: impl Into<String>, value: DiscountValue) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            value,
            minimum_purchase: None,
        }
    }

    /// Only apply once line totals reach `amount`.
    pub fn with_minimum_purchase(mut self, amount: Money) -> Self {
        self.minimum_purchase = Some(amount);
        self
    }
}

impl Modifier for OrderDiscount {
    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> String {
        format!("{:?}", self)
    }

    fn validate(&self) -> Result<(), PricingError> {
        self.value.validate(&self.name)
    }

    fn post_process_cart(
        &self,
        cart: &mut Cart,
        _state: &mut PassState,
    ) -> Result<(), CommerceError> {
        let total = cart.total_price();
        if let Some(minimum) = self.minimum_purchase {
            if total.try_subtract(&minimum)?.is_negative() {
                return Ok(());
            }
        }
        let amount = self.value.calculate(&total)?;
        if amount.is_zero() {
            return Ok(());
        }
        cart.append_adjustment(PriceAdjustment::rebate(self.label.clone(), amount))
    }
}
