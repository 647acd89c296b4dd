//! Percentage and fixed-amount line discounts.

use crate::cart::{LineItem, PriceAdjustment};
use crate::error::{CommerceError, PricingError};
use crate::ids::ProductId;
use crate::modifier::{Modifier, PassState};
use crate::money::{Money, BASIS_POINTS_PER_UNIT};
use serde::{Deserialize, Serialize};

/// Value of a discount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountValue {
    /// Share of the base amount, in basis points (1000 = 10%).
    Percentage { basis_points: i64 },
    /// Fixed amount off.
    Fixed(Money),
}

impl DiscountValue {
    /// Calculate the discount for `base`. Never negative, never above `base`.
    pub fn calculate(&self, base: &Money) -> Result<Money, CommerceError> {
        if !base.is_positive() {
            return Ok(Money::zero(base.currency));
        }
        match self {
            DiscountValue::Percentage { basis_points } => Ok(base.percentage_bps(*basis_points)),
            DiscountValue::Fixed(amount) => amount.min(*base),
        }
    }

    pub(crate) fn validate(&self, modifier: &str) -> Result<(), PricingError> {
        match self {
            DiscountValue::Percentage { basis_points } => {
                if !(0..=BASIS_POINTS_PER_UNIT).contains(basis_points) {
                    return Err(PricingError::configuration(
                        modifier,
                        format!("percentage {} bps is outside 0..=10000", basis_points),
                    ));
                }
            }
            DiscountValue::Fixed(amount) => {
                if amount.is_negative() {
                    return Err(PricingError::configuration(
                        modifier,
                        "fixed discount can't be negative",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Condition restricting which lines a discount applies to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemCondition {
    /// Specific products only.
    SpecificProducts(Vec<ProductId>),
    /// Minimum quantity on the line.
    MinimumQuantity(i64),
}

impl ItemCondition {
    fn matches(&self, item: &LineItem) -> bool {
        match self {
            ItemCondition::SpecificProducts(products) => products.contains(item.product_id()),
            ItemCondition::MinimumQuantity(min) => item.quantity() >= *min,
        }
    }
}

/// Discount applied to every qualifying ordinary line.
///
/// The discount is computed against the line's current total, so rules
/// earlier in the pipeline change what this one takes off. Gift lines are
/// never discounted.
#[derive(Debug, Clone)]
pub struct ItemDiscount {
    name: String,
    label: String,
    value: DiscountValue,
    conditions: Vec<ItemCondition>,
}

impl ItemDiscount {
    /// Create a discount with an explicit value.
    pub fn new(name: impl Into<String>, label: impl Into<String>, value: DiscountValue) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            value,
            conditions: Vec::new(),
        }
    }

    /// Percentage discount, in basis points.
    pub fn percentage(
        name: impl Into<String>,
        label: impl Into<String>,
        basis_points: i64,
    ) -> Self {
        Self::new(name, label, DiscountValue::Percentage { basis_points })
    }

    /// Fixed amount off each qualifying line.
    pub fn fixed(name: impl Into<String>, label: impl Into<String>, amount: Money) -> Self {
        Self::new(name, label, DiscountValue::Fixed(amount))
    }

    /// Restrict to the given products.
    pub fn only_products(mut self, products: Vec<ProductId>) -> Self {
        self.conditions.push(ItemCondition::SpecificProducts(products));
        self
    }

    /// Require a minimum line quantity.
    pub fn with_minimum_quantity(mut self, quantity: i64) -> Self {
        self.conditions.push(ItemCondition::MinimumQuantity(quantity));
        self
    }

    /// Add an arbitrary condition.
    pub fn with_condition(mut self, condition: ItemCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn applies_to(&self, item: &LineItem) -> bool {
        !item.is_gift() && self.conditions.iter().all(|c| c.matches(item))
    }
}

impl Modifier for ItemDiscount {
    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> String {
        format!("{:?}", self)
    }

    fn validate(&self) -> Result<(), PricingError> {
        self.value.validate(&self.name)
    }

    fn process_item(
        &self,
        item: &mut LineItem,
        _state: &mut PassState,
    ) -> Result<(), CommerceError> {
        if !self.applies_to(item) {
            return Ok(());
        }
        let amount = self.value.calculate(&item.current_total())?;
        if amount.is_zero() {
            return Ok(());
        }
        item.append_adjustment(PriceAdjustment::rebate(self.label.clone(), amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductRef;
    use crate::money::Currency;

    fn item(id: &str, cents: i64, quantity: i64) -> LineItem {
        let product = ProductRef::new(id, id, id, Money::new(cents, Currency::USD));
        LineItem::new(product, quantity).unwrap()
    }

    fn apply(discount: &ItemDiscount, item: &mut LineItem) {
        let mut state = PassState::new(1, 10);
        discount.process_item(item, &mut state).unwrap();
    }

    #[test]
    fn test_percentage_discount() {
        let discount = ItemDiscount::percentage("ten", "10% off", 1000);
        let mut line = item("a", 10000, 1);
        apply(&discount, &mut line);
        assert_eq!(line.current_total().amount_cents, 9000);
        assert_eq!(line.adjustments()[0].amount().amount_cents, -1000);
        assert_eq!(line.adjustments()[0].label(), "10% off");
    }

    #[test]
    fn test_fixed_discount_capped() {
        let discount = ItemDiscount::fixed("big", "$100 off", Money::new(10000, Currency::USD));
        let mut line = item("a", 5000, 1);
        apply(&discount, &mut line);
        assert!(line.current_total().is_zero());
    }

    #[test]
    fn test_conditions() {
        let discount = ItemDiscount::percentage("bulk", "Bulk", 1000)
            .only_products(vec![ProductId::new("a")])
            .with_minimum_quantity(3);

        let mut too_few = item("a", 1000, 2);
        apply(&discount, &mut too_few);
        assert!(too_few.adjustments().is_empty());

        let mut other = item("b", 1000, 5);
        apply(&discount, &mut other);
        assert!(other.adjustments().is_empty());

        let mut qualifying = item("a", 1000, 3);
        apply(&discount, &mut qualifying);
        assert_eq!(qualifying.current_total().amount_cents, 2700);
    }

    #[test]
    fn test_gift_lines_skipped() {
        let discount = ItemDiscount::percentage("ten", "10% off", 1000);
        let product = ProductRef::new("g", "G", "Gift", Money::new(1500, Currency::USD));
        let mut gift = LineItem::gift(product, "gift").unwrap();
        apply(&discount, &mut gift);
        assert!(gift.adjustments().is_empty());
    }

    #[test]
    fn test_validation() {
        assert!(ItemDiscount::percentage("x", "x", 10001).validate().is_err());
        assert!(ItemDiscount::percentage("x", "x", -1).validate().is_err());
        assert!(ItemDiscount::fixed("x", "x", Money::new(-1, Currency::USD))
            .validate()
            .is_err());
        assert!(ItemDiscount::percentage("x", "x", 10000).validate().is_ok());
    }
}
