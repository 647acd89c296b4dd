//! The modifier interface.
//!
//! A modifier is a pricing rule. The pipeline calls its hooks once per item
//! and once per cart on every pass, in the order the modifiers were
//! registered, so each modifier sees everything earlier modifiers did in
//! the same pass.
//!
//! Hooks take `&self`: a modifier keeps no per-cart state and one instance
//! can price any number of carts. Anything a rule needs to remember between
//! passes (a gift line it added, say) lives in the cart itself.

use crate::cart::{Cart, LineItem};
use crate::error::{CommerceError, PricingError};

/// Per-pass context handed to modifier hooks.
#[derive(Debug, Clone)]
pub struct PassState {
    pass: u32,
    max_passes: u32,
    rerun_requested: bool,
}

impl PassState {
    pub(crate) fn new(pass: u32, max_passes: u32) -> Self {
        Self {
            pass,
            max_passes,
            rerun_requested: false,
        }
    }

    /// Current pass number, starting at 1.
    pub fn pass(&self) -> u32 {
        self.pass
    }

    /// Pass ceiling for this run.
    pub fn max_passes(&self) -> u32 {
        self.max_passes
    }

    /// Ask for another pass once this one completes.
    pub fn request_another_pass(&mut self) {
        self.rerun_requested = true;
    }

    /// Whether any hook asked for another pass.
    pub fn rerun_requested(&self) -> bool {
        self.rerun_requested
    }
}

/// A cart pricing rule.
///
/// Every hook defaults to a no-op. Returning an error aborts the run; the
/// pipeline reports it as [`PricingError::RuleExecution`].
pub trait Modifier: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Identity of the rule and its settings.
    ///
    /// The pipeline skips a stable cart only when the cart was priced by
    /// modifiers with the same fingerprints, so two modifiers that price
    /// differently must report different values.
    fn fingerprint(&self) -> String {
        self.name().to_string()
    }

    /// Check the rule's configuration before any pass runs.
    fn validate(&self) -> Result<(), PricingError> {
        Ok(())
    }

    /// Prepare an item for this pass. Must be idempotent.
    ///
    /// The pipeline has already reset the item's adjustments and total by
    /// the time the first modifier sees it.
    fn pre_process_item(&self, _item: &mut LineItem) -> Result<(), CommerceError> {
        Ok(())
    }

    /// Inspect an item and append adjustments to it.
    fn process_item(
        &self,
        _item: &mut LineItem,
        _state: &mut PassState,
    ) -> Result<(), CommerceError> {
        Ok(())
    }

    /// Evaluate cart wide rules once the pass total is known.
    ///
    /// May add or remove items and attach cart level adjustments. Items
    /// added here are priced on the next pass.
    fn post_process_cart(
        &self,
        _cart: &mut Cart,
        _state: &mut PassState,
    ) -> Result<(), CommerceError> {
        Ok(())
    }
}
