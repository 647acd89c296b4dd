//! Free gift once the cart reaches a threshold.
//!
//! When line totals reach the threshold the rule adds one complimentary
//! unit of a gift product and asks for another pass, on which its own
//! `process_item` rebates the gift line to zero. If the cart later drops
//! below the threshold the gift line is taken out again.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::cart::{Cart, LineItem, PriceAdjustment};
use crate::catalog::{ProductCatalog, ProductCriteria, ProductRef};
use crate::error::{CommerceError, PricingError};
use crate::ids::{LineItemId, ProductId};
use crate::modifier::{Modifier, PassState};
use crate::money::Money;

/// Default label on the rebate that zeroes a gift line.
pub const COMPLIMENTARY_LABEL: &str = "Complimentary item";

/// Supplies the product to give away.
pub trait GiftResolver: Send + Sync {
    /// Resolve the gift product.
    fn resolve_gift(&self) -> Result<ProductRef, CommerceError>;

    /// What the resolver looks up, for the rule's fingerprint.
    fn describe(&self) -> String {
        String::new()
    }
}

impl<F> GiftResolver for F
where
    F: Fn() -> Result<ProductRef, CommerceError> + Send + Sync,
{
    fn resolve_gift(&self) -> Result<ProductRef, CommerceError> {
        self()
    }
}

/// Resolves the gift through a catalog lookup.
pub struct CatalogGift {
    catalog: Arc<dyn ProductCatalog>,
    criteria: ProductCriteria,
}

impl CatalogGift {
    /// Look the gift up in `catalog` by `criteria` on every use.
    pub fn new(catalog: Arc<dyn ProductCatalog>, criteria: ProductCriteria) -> Self {
        Self { catalog, criteria }
    }
}

impl GiftResolver for CatalogGift {
    fn resolve_gift(&self) -> Result<ProductRef, CommerceError> {
        self.catalog.resolve(&self.criteria)
    }

    fn describe(&self) -> String {
        self.criteria.to_string()
    }
}

/// Settings for [`ThresholdGiftModifier`].
#[derive(Clone)]
pub struct ThresholdGiftConfig {
    /// Rule name. Gift lines are tagged with it.
    pub name: String,
    /// Line total at which the gift is granted.
    pub threshold: Money,
    /// Label of the rebate on the gift line.
    pub label: String,
    /// Gift lookup. Required.
    pub resolver: Option<Arc<dyn GiftResolver>>,
}

impl ThresholdGiftConfig {
    /// Config without a resolver; set one with [`Self::with_resolver`].
    pub fn new(name: impl Into<String>, threshold: Money) -> Self {
        Self {
            name: name.into(),
            threshold,
            label: COMPLIMENTARY_LABEL.to_string(),
            resolver: None,
        }
    }

    /// Set the gift resolver.
    pub fn with_resolver(mut self, resolver: impl GiftResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Set the rebate label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl fmt::Debug for ThresholdGiftConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThresholdGiftConfig")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .field("label", &self.label)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Adds a free gift line while the cart total is at or above a threshold.
pub struct ThresholdGiftModifier {
    name: String,
    threshold: Money,
    label: String,
    resolver: Arc<dyn GiftResolver>,
}

impl ThresholdGiftModifier {
    /// Build the rule, rejecting a missing resolver or a negative threshold.
    pub fn new(config: ThresholdGiftConfig) -> Result<Self, PricingError> {
        let resolver = config.resolver.ok_or_else(|| {
            PricingError::configuration(&config.name, "gift product resolver is not configured")
        })?;
        if config.threshold.is_negative() {
            return Err(PricingError::configuration(
                &config.name,
                format!("threshold {} is negative", config.threshold),
            ));
        }
        Ok(Self {
            name: config.name,
            threshold: config.threshold,
            label: config.label,
            resolver,
        })
    }

    /// This rule's gift lines, except those giving away `keep`.
    fn own_gift_lines(&self, cart: &Cart, keep: Option<&ProductId>) -> Vec<LineItemId> {
        cart.items()
            .iter()
            .filter(|i| i.is_gift_from(&self.name))
            .filter(|i| keep.map_or(true, |product| i.gift_of() != Some(product)))
            .map(|i| i.id.clone())
            .collect()
    }
}

impl fmt::Debug for ThresholdGiftModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThresholdGiftModifier")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Modifier for ThresholdGiftModifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> String {
        format!(
            "{} threshold={} label={} gift={}",
            self.name,
            self.threshold,
            self.label,
            self.resolver.describe()
        )
    }

    fn process_item(
        &self,
        item: &mut LineItem,
        _state: &mut PassState,
    ) -> Result<(), CommerceError> {
        if !item.is_gift_from(&self.name) {
            return Ok(());
        }
        let price = item.line_subtotal()?;
        if price.is_zero() {
            return Ok(());
        }
        item.append_adjustment(PriceAdjustment::rebate(self.label.clone(), price))
    }

    fn post_process_cart(
        &self,
        cart: &mut Cart,
        _state: &mut PassState,
    ) -> Result<(), CommerceError> {
        let reached = !cart.total_price().try_subtract(&self.threshold)?.is_negative();

        if !reached {
            let stale = self.own_gift_lines(cart, None);
            if !stale.is_empty() {
                debug!(rule = %self.name, lines = stale.len(), "threshold lost");
                remove_lines(cart, &stale);
            }
            return Ok(());
        }

        let gift = self.resolver.resolve_gift()?;

        // The gift product can change between runs; drop lines for the old one.
        let replaced = self.own_gift_lines(cart, Some(&gift.id));
        if !replaced.is_empty() {
            debug!(rule = %self.name, lines = replaced.len(), "gift product changed");
            remove_lines(cart, &replaced);
        }

        if cart.gift_items().any(|i| i.gift_of() == Some(&gift.id)) {
            return Ok(());
        }
        debug!(rule = %self.name, product = %gift.id, "adding gift line");
        cart.add_item(LineItem::gift(gift, &self.name)?, false)?;
        cart.request_another_pass();
        Ok(())
    }
}

fn remove_lines(cart: &mut Cart, lines: &[LineItemId]) {
    for id in lines {
        cart.remove_item(id);
    }
    cart.request_another_pass();
}
