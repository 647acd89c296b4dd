//! Cart and line item types.

use crate::cart::PriceAdjustment;
use crate::catalog::ProductRef;
use crate::error::CommerceError;
use crate::ids::{CartId, LineItemId, ProductId};
use crate::money::{Currency, Money};
use serde::{Deserialize, Serialize};

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: i64 = 9999;

/// Whether a cart needs another pricing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PricingState {
    /// Composition changed or a modifier asked for re-evaluation.
    NeedsPass,
    /// The last completed pass requested nothing further.
    Stable,
}

/// A shopping cart.
///
/// `total_price` is the sum of the line totals as of the last completed
/// pass. Cart level adjustments are kept apart and only show up in
/// [`Cart::grand_total`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    /// Unique cart identifier.
    pub id: CartId,
    pub(crate) currency: Currency,
    pub(crate) items: Vec<LineItem>,
    pub(crate) adjustments: Vec<PriceAdjustment>,
    pub(crate) total_price: Money,
    pub(crate) dirty: bool,
    /// Fingerprint of the pipeline that produced the current totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) priced_by: Option<String>,
}

impl Cart {
    /// Create an empty cart. A fresh cart has never been priced.
    pub fn new(currency: Currency) -> Self {
        Self::with_id(CartId::generate(), currency)
    }

    /// Create an empty cart with a known identifier.
    pub fn with_id(id: CartId, currency: Currency) -> Self {
        Self {
            id,
            currency,
            items: Vec::new(),
            adjustments: Vec::new(),
            total_price: Money::zero(currency),
            dirty: true,
            priced_by: None,
        }
    }

    /// Cart currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Items in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Mutable access to the items. Marks the cart for repricing.
    pub fn items_mut(&mut self) -> &mut Vec<LineItem> {
        self.dirty = true;
        &mut self.items
    }

    /// Add an item to the cart.
    ///
    /// With `merge`, an ordinary line for the same product absorbs the new
    /// quantity. Without it, or for gift lines, the item is always appended
    /// as its own line.
    pub fn add_item(&mut self, item: LineItem, merge: bool) -> Result<LineItemId, CommerceError> {
        if item.unit_price.currency != self.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: item.unit_price.currency.code().to_string(),
            });
        }

        if merge && !item.is_gift() {
            if let Some(existing) = self
                .items
                .iter_mut()
                .find(|i| !i.is_gift() && i.product.id == item.product.id)
            {
                let new_quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or(CommerceError::Overflow)?;
                existing.set_quantity(new_quantity)?;
                let id = existing.id.clone();
                self.dirty = true;
                return Ok(id);
            }
        }

        let id = item.id.clone();
        self.items.push(item);
        self.dirty = true;
        Ok(id)
    }

    /// Remove an item from the cart, returning it.
    pub fn remove_item(&mut self, line_item_id: &LineItemId) -> Option<LineItem> {
        let position = self.items.iter().position(|i| &i.id == line_item_id)?;
        self.dirty = true;
        Some(self.items.remove(position))
    }

    /// Update item quantity. A quantity of zero or less removes the line.
    pub fn update_quantity(
        &mut self,
        line_item_id: &LineItemId,
        quantity: i64,
    ) -> Result<(), CommerceError> {
        if quantity <= 0 {
            return self
                .remove_item(line_item_id)
                .map(|_| ())
                .ok_or_else(|| CommerceError::ItemNotInCart(line_item_id.to_string()));
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| &i.id == line_item_id)
            .ok_or_else(|| CommerceError::ItemNotInCart(line_item_id.to_string()))?;
        item.set_quantity(quantity)?;
        self.dirty = true;
        Ok(())
    }

    /// Clear all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.adjustments.clear();
        self.total_price = Money::zero(self.currency);
        self.dirty = true;
    }

    /// Ask the pipeline for another pass over this cart.
    pub fn request_another_pass(&mut self) {
        self.dirty = true;
    }

    /// Whether a pass has been requested or the cart changed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Convergence state of the cart.
    pub fn pricing_state(&self) -> PricingState {
        if self.dirty {
            PricingState::NeedsPass
        } else {
            PricingState::Stable
        }
    }

    /// Fingerprint of the pipeline that last priced this cart to convergence.
    pub fn priced_by(&self) -> Option<&str> {
        self.priced_by.as_deref()
    }

    /// Sum of line totals from the last completed pass.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// Cart level adjustments from the last pass.
    pub fn adjustments(&self) -> &[PriceAdjustment] {
        &self.adjustments
    }

    /// Attach a cart level adjustment for the current pass.
    pub fn append_adjustment(&mut self, adjustment: PriceAdjustment) -> Result<(), CommerceError> {
        if adjustment.amount().currency != self.currency {
            return Err(CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: adjustment.amount().currency.code().to_string(),
            });
        }
        self.adjustments.push(adjustment);
        Ok(())
    }

    /// `total_price` plus every cart level adjustment.
    pub fn grand_total(&self) -> Result<Money, CommerceError> {
        self.adjustments
            .iter()
            .try_fold(self.total_price, |acc, a| acc.try_add(&a.amount()))
    }

    /// Gift lines in the cart.
    pub fn gift_items(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter().filter(|i| i.is_gift())
    }

    /// Get total item count (sum of quantities).
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Get number of lines.
    pub fn unique_item_count(&self) -> usize {
        self.items.len()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reset per-pass cart state.
    pub(crate) fn begin_pass(&mut self) {
        self.dirty = false;
        self.adjustments.clear();
    }

    /// Re-sum `total_price` from the current line totals.
    pub(crate) fn recompute_total(&mut self) -> Result<Money, CommerceError> {
        self.total_price =
            Money::try_sum(self.items.iter().map(|i| &i.current_total), self.currency)?;
        Ok(self.total_price)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new(Currency::default())
    }
}

/// What a line item stands for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItemKind {
    /// A purchased product.
    Ordinary,
    /// A complimentary unit of `real_product`, added by the rule `granted_by`.
    GiftProxy {
        real_product: ProductId,
        granted_by: String,
    },
}

/// A line item in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    /// Unique line item identifier.
    pub id: LineItemId,
    /// Product this line charges for.
    pub product: ProductRef,
    pub(crate) quantity: i64,
    pub(crate) unit_price: Money,
    pub(crate) adjustments: Vec<PriceAdjustment>,
    pub(crate) current_total: Money,
    pub(crate) kind: LineItemKind,
}

impl LineItem {
    /// Create an ordinary line at the product's current price.
    pub fn new(product: ProductRef, quantity: i64) -> Result<Self, CommerceError> {
        Self::build(product, quantity, LineItemKind::Ordinary)
    }

    /// Create a gift line: one unit of `product`, tagged with the granting rule.
    pub fn gift(product: ProductRef, granted_by: impl Into<String>) -> Result<Self, CommerceError> {
        let kind = LineItemKind::GiftProxy {
            real_product: product.id.clone(),
            granted_by: granted_by.into(),
        };
        Self::build(product, 1, kind)
    }

    fn build(
        product: ProductRef,
        quantity: i64,
        kind: LineItemKind,
    ) -> Result<Self, CommerceError> {
        validate_quantity(quantity)?;
        if product.unit_price.is_negative() {
            return Err(CommerceError::NegativePrice(product.id.to_string()));
        }
        let unit_price = product.unit_price;
        let current_total = unit_price.try_multiply(quantity)?;
        Ok(Self {
            id: LineItemId::generate(),
            product,
            quantity,
            unit_price,
            adjustments: Vec::new(),
            current_total,
            kind,
        })
    }

    /// Quantity.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Unit price captured when the line was created.
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    /// `unit_price * quantity`, before any adjustment.
    pub fn line_subtotal(&self) -> Result<Money, CommerceError> {
        self.unit_price.try_multiply(self.quantity)
    }

    /// Adjustments applied during the last pass, in application order.
    pub fn adjustments(&self) -> &[PriceAdjustment] {
        &self.adjustments
    }

    /// Line total after adjustments.
    pub fn current_total(&self) -> Money {
        self.current_total
    }

    /// Line kind.
    pub fn kind(&self) -> &LineItemKind {
        &self.kind
    }

    /// Check if this is a complimentary line.
    pub fn is_gift(&self) -> bool {
        matches!(self.kind, LineItemKind::GiftProxy { .. })
    }

    /// The product given away, if this is a gift line.
    pub fn gift_of(&self) -> Option<&ProductId> {
        match &self.kind {
            LineItemKind::GiftProxy { real_product, .. } => Some(real_product),
            LineItemKind::Ordinary => None,
        }
    }

    /// Check if this is a gift line added by `rule`.
    pub fn is_gift_from(&self, rule: &str) -> bool {
        matches!(&self.kind, LineItemKind::GiftProxy { granted_by, .. } if granted_by == rule)
    }

    /// Product behind the line. Gift lines forward to the real product.
    pub fn product_id(&self) -> &ProductId {
        self.gift_of().unwrap_or(&self.product.id)
    }

    /// Apply an adjustment to this line.
    pub fn append_adjustment(&mut self, adjustment: PriceAdjustment) -> Result<(), CommerceError> {
        self.current_total = self.current_total.try_add(&adjustment.amount())?;
        self.adjustments.push(adjustment);
        Ok(())
    }

    /// Drop all adjustments and restore the line subtotal.
    pub fn reset_pricing(&mut self) -> Result<(), CommerceError> {
        self.adjustments.clear();
        self.current_total = self.line_subtotal()?;
        Ok(())
    }

    fn set_quantity(&mut self, quantity: i64) -> Result<(), CommerceError> {
        if self.is_gift() && quantity != 1 {
            return Err(CommerceError::GiftQuantityFixed(self.id.to_string()));
        }
        validate_quantity(quantity)?;
        self.quantity = quantity;
        self.reset_pricing()
    }
}

fn validate_quantity(quantity: i64) -> Result<(), CommerceError> {
    if quantity <= 0 {
        return Err(CommerceError::InvalidQuantity(quantity));
    }
    if quantity > MAX_QUANTITY_PER_ITEM {
        return Err(CommerceError::QuantityExceedsLimit(
            quantity,
            MAX_QUANTITY_PER_ITEM,
        ));
    }
    Ok(())
}
