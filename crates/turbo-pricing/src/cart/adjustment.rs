//! Labelled price adjustments.

use crate::money::Money;
use serde::{Deserialize, Serialize};

/// A signed, labelled amount attached to a line item or to the cart.
///
/// Negative amounts are rebates, positive amounts are surcharges. Fields
/// are read-only once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceAdjustment {
    label: String,
    amount: Money,
}

impl PriceAdjustment {
    /// Create an adjustment.
    pub fn new(label: impl Into<String>, amount: Money) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }

    /// Create a rebate of `amount` (stored negated).
    pub fn rebate(label: impl Into<String>, amount: Money) -> Self {
        Self::new(label, amount.negate())
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Signed amount.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Whether the adjustment lowers the price.
    pub fn is_rebate(&self) -> bool {
        self.amount.is_negative()
    }
}
