//! Multi-pass pricing pipeline.
//!
//! A run repeats passes over the cart until a pass completes with nobody
//! asking for another one:
//!
//! 1. reset every line to its subtotal, then run `pre_process_item` and
//!    `process_item` of each modifier, in order, on each line;
//! 2. re-sum the cart total;
//! 3. run `post_process_cart` of each modifier, in order.
//!
//! Lines added in step 3 are not part of the current pass. They are priced
//! on the next one, which the cart requests automatically since its
//! composition changed. The number of passes is capped; hitting the cap is
//! reported as [`PricingError::Convergence`].
//!
//! A converged cart is stamped with the pipeline's fingerprint (the pass
//! ceiling plus each modifier's [`Modifier::fingerprint`], in order). A
//! clean cart is only returned as-is to a pipeline with the same stamp.

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, error, info, warn};

use crate::cart::Cart;
use crate::error::{CommerceError, PricingError};
use crate::modifier::{Modifier, PassState};
use crate::money::Money;

/// Default pass ceiling.
pub const DEFAULT_MAX_PASSES: u32 = 10;

/// Pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Hard cap on passes per run.
    #[serde(default = "default_max_passes")]
    pub max_passes: u32,
}

fn default_max_passes() -> u32 {
    DEFAULT_MAX_PASSES
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl PipelineConfig {
    /// Set the pass ceiling.
    pub fn with_max_passes(mut self, max_passes: u32) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Reject settings that could never price a cart.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.max_passes == 0 {
            return Err(PricingError::configuration(
                "pipeline",
                "max_passes must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Outcome of a converged run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingRun {
    /// Passes executed. Zero when the cart was already stable.
    pub passes: u32,
    /// Sum of line totals.
    pub total: Money,
    /// Total including cart level adjustments.
    pub grand_total: Money,
}

/// An ordered chain of modifiers.
///
/// Order is significant: each modifier sees the cumulative effect of the
/// ones before it.
#[derive(Default)]
pub struct ModifierPipeline {
    modifiers: Vec<Box<dyn Modifier>>,
    config: PipelineConfig,
}

impl ModifierPipeline {
    /// Create a pipeline with the default configuration.
    pub fn new(modifiers: Vec<Box<dyn Modifier>>) -> Self {
        Self {
            modifiers,
            config: PipelineConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a modifier.
    pub fn with_modifier(mut self, modifier: impl Modifier + 'static) -> Self {
        self.push(modifier);
        self
    }

    /// Append a modifier.
    pub fn push(&mut self, modifier: impl Modifier + 'static) {
        self.modifiers.push(Box::new(modifier));
    }

    /// Current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Modifier names in application order.
    pub fn modifier_names(&self) -> Vec<&str> {
        self.modifiers.iter().map(|m| m.name()).collect()
    }

    /// Number of modifiers.
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Check if the pipeline has no modifiers.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Price `cart` until it converges.
    ///
    /// On error the cart's totals are meaningless and the cart stays marked
    /// for repricing.
    pub fn run(&self, cart: &mut Cart) -> Result<PricingRun, PricingError> {
        let modifiers: Vec<&dyn Modifier> = self.modifiers.iter().map(|m| m.as_ref()).collect();
        price_cart(cart, &modifiers, &self.config)
    }
}

/// Run `modifiers` over `cart` with the default configuration.
pub fn run_modifiers(
    cart: &mut Cart,
    modifiers: &[&dyn Modifier],
) -> Result<PricingRun, PricingError> {
    price_cart(cart, modifiers, &PipelineConfig::default())
}

fn price_cart(
    cart: &mut Cart,
    modifiers: &[&dyn Modifier],
    config: &PipelineConfig,
) -> Result<PricingRun, PricingError> {
    let span = debug_span!("pricing_run", cart_id = %cart.id);
    let _enter = span.enter();

    config.validate()?;
    for modifier in modifiers {
        modifier.validate()?;
    }

    let stamp = fingerprint(modifiers, config);
    if !cart.is_dirty() {
        if cart.priced_by() == Some(stamp.as_str()) {
            debug!("cart already stable");
            return finish(cart, 0);
        }
        debug!("cart was priced by a different pipeline");
    }
    cart.priced_by = None;

    let mut passes = 0;
    while passes < config.max_passes {
        passes += 1;
        match run_pass(cart, modifiers, passes, config.max_passes) {
            Ok(false) => {
                info!(passes, total = %cart.total_price(), "pricing converged");
                cart.priced_by = Some(stamp);
                return finish(cart, passes);
            }
            Ok(true) => debug!(pass = passes, "another pass requested"),
            Err(e) => {
                cart.request_another_pass();
                return Err(e);
            }
        }
    }

    warn!(passes, "pricing did not converge");
    Err(PricingError::Convergence { passes })
}

fn fingerprint(modifiers: &[&dyn Modifier], config: &PipelineConfig) -> String {
    let rules: Vec<String> = modifiers.iter().map(|m| m.fingerprint()).collect();
    format!("max_passes={};{}", config.max_passes, rules.join(";"))
}

/// One full pass. Returns whether another pass is needed.
fn run_pass(
    cart: &mut Cart,
    modifiers: &[&dyn Modifier],
    pass: u32,
    max_passes: u32,
) -> Result<bool, PricingError> {
    let span = debug_span!("pricing_pass", pass);
    let _enter = span.enter();

    cart.begin_pass();
    let mut state = PassState::new(pass, max_passes);

    let snapshot = cart.items.len();
    for item in cart.items.iter_mut().take(snapshot) {
        item.reset_pricing()?;
        for modifier in modifiers {
            modifier
                .pre_process_item(item)
                .map_err(|e| rule_failure(*modifier, pass, e))?;
            modifier
                .process_item(item, &mut state)
                .map_err(|e| rule_failure(*modifier, pass, e))?;
        }
    }

    let total = cart.recompute_total()?;
    debug!(items = snapshot, total = %total, "items priced");

    for modifier in modifiers {
        modifier
            .post_process_cart(cart, &mut state)
            .map_err(|e| rule_failure(*modifier, pass, e))?;
    }

    if state.rerun_requested() {
        cart.request_another_pass();
    }
    Ok(cart.is_dirty())
}

fn finish(cart: &Cart, passes: u32) -> Result<PricingRun, PricingError> {
    Ok(PricingRun {
        passes,
        total: cart.total_price(),
        grand_total: cart.grand_total()?,
    })
}

fn rule_failure(modifier: &dyn Modifier, pass: u32, source: CommerceError) -> PricingError {
    error!(modifier = modifier.name(), pass, error = %source, "modifier failed");
    PricingError::RuleExecution {
        modifier: modifier.name().to_string(),
        pass,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{LineItem, PriceAdjustment};
    use crate::catalog::ProductRef;
    use crate::money::Currency;
    use crate::modifiers::ItemDiscount;
    use std::sync::{Arc, Mutex};

    struct Surcharge;

    impl Modifier for Surcharge {
        fn name(&self) -> &str {
            "surcharge"
        }

        fn process_item(
            &self,
            item: &mut LineItem,
            _state: &mut PassState,
        ) -> Result<(), CommerceError> {
            let fee = Money::new(100, Currency::USD);
            item.append_adjustment(PriceAdjustment::new("handling", fee))
        }
    }

    struct Failing;

    impl Modifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn post_process_cart(
            &self,
            _cart: &mut Cart,
            _state: &mut PassState,
        ) -> Result<(), CommerceError> {
            Err(CommerceError::ProductNotFound("sku:GONE".to_string()))
        }
    }

    /// Asks for another pass from the item hook on the first pass only.
    struct RerunOnce;

    impl Modifier for RerunOnce {
        fn name(&self) -> &str {
            "rerun-once"
        }

        fn process_item(
            &self,
            _item: &mut LineItem,
            state: &mut PassState,
        ) -> Result<(), CommerceError> {
            if state.pass() == 1 {
                state.request_another_pass();
            }
            Ok(())
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;

    /// Logs every hook call as `hook:modifier:product`.
    struct Recorder {
        name: &'static str,
        log: Log,
    }

    impl Recorder {
        fn record(&self, hook: &str, target: &str) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}:{}", hook, self.name, target));
        }
    }

    impl Modifier for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn pre_process_item(&self, item: &mut LineItem) -> Result<(), CommerceError> {
            self.record("pre", item.product.id.as_str());
            Ok(())
        }

        fn process_item(
            &self,
            item: &mut LineItem,
            _state: &mut PassState,
        ) -> Result<(), CommerceError> {
            self.record("proc", item.product.id.as_str());
            let fee = Money::new(1, Currency::USD);
            item.append_adjustment(PriceAdjustment::new(self.name, fee))
        }

        fn post_process_cart(
            &self,
            _cart: &mut Cart,
            _state: &mut PassState,
        ) -> Result<(), CommerceError> {
            self.record("post", "cart");
            Ok(())
        }
    }

    fn cart_with(cents: i64) -> Cart {
        let mut cart = Cart::new(Currency::USD);
        let product = ProductRef::new("p1", "P1", "Product", Money::new(cents, Currency::USD));
        cart.add_item(LineItem::new(product, 1).unwrap(), true).unwrap();
        cart
    }

    #[test]
    fn test_empty_pipeline_sums_lines() {
        let mut cart = cart_with(2500);
        let run = ModifierPipeline::default().run(&mut cart).unwrap();
        assert_eq!(run.passes, 1);
        assert_eq!(run.total.amount_cents, 2500);
        assert!(!cart.is_dirty());
    }

    #[test]
    fn test_adjustments_do_not_accumulate_across_passes() {
        let mut cart = cart_with(1000);
        let pipeline = ModifierPipeline::default()
            .with_modifier(Surcharge)
            .with_modifier(RerunOnce);

        let run = pipeline.run(&mut cart).unwrap();
        assert_eq!(run.passes, 2);
        assert_eq!(run.total.amount_cents, 1100);
        assert_eq!(cart.items()[0].adjustments().len(), 1);
    }

    #[test]
    fn test_modifier_failure_is_rule_execution_error() {
        let mut cart = cart_with(1000);
        let pipeline = ModifierPipeline::default().with_modifier(Failing);

        let err = pipeline.run(&mut cart).unwrap_err();
        assert!(matches!(
            err,
            PricingError::RuleExecution { ref modifier, pass: 1, .. } if modifier == "failing"
        ));
        assert!(cart.is_dirty());
    }

    #[test]
    fn test_zero_ceiling_is_configuration_error() {
        let mut cart = cart_with(1000);
        let pipeline =
            ModifierPipeline::default().with_config(PipelineConfig::default().with_max_passes(0));

        let err = pipeline.run(&mut cart).unwrap_err();
        assert!(err.is_configuration());
        assert!(cart.is_dirty());
    }

    #[test]
    fn test_hooks_interleave_per_item_in_modifier_order() {
        let log = Log::default();
        let pipeline = ModifierPipeline::default()
            .with_modifier(Recorder {
                name: "a",
                log: Arc::clone(&log),
            })
            .with_modifier(Recorder {
                name: "b",
                log: Arc::clone(&log),
            });
        let mut cart = cart_with(1000);
        let second = ProductRef::new("p2", "P2", "Other", Money::new(500, Currency::USD));
        cart.add_item(LineItem::new(second, 1).unwrap(), true).unwrap();

        let run = pipeline.run(&mut cart).unwrap();

        assert_eq!(run.passes, 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "pre:a:p1",
                "proc:a:p1",
                "pre:b:p1",
                "proc:b:p1",
                "pre:a:p2",
                "proc:a:p2",
                "pre:b:p2",
                "proc:b:p2",
                "post:a:cart",
                "post:b:cart",
            ]
        );
        assert_eq!(run.total.amount_cents, 1504);
    }

    #[test]
    fn test_repeated_passes_start_from_reset_lines() {
        let log = Log::default();
        let pipeline = ModifierPipeline::default()
            .with_modifier(Recorder {
                name: "a",
                log: Arc::clone(&log),
            })
            .with_modifier(RerunOnce);
        let mut cart = cart_with(1000);

        let run = pipeline.run(&mut cart).unwrap();

        assert_eq!(run.passes, 2);
        assert_eq!(log.lock().unwrap().len(), 6);
        assert_eq!(cart.items()[0].adjustments().len(), 1);
        assert_eq!(run.total.amount_cents, 1001);
    }

    #[test]
    fn test_stable_cart_repriced_by_different_pipeline() {
        let mut cart = cart_with(10000);
        let first = ModifierPipeline::default().run(&mut cart).unwrap();
        assert_eq!(first.total.amount_cents, 10000);

        let same = ModifierPipeline::default().run(&mut cart).unwrap();
        assert_eq!(same.passes, 0);

        let discounted = ModifierPipeline::default()
            .with_modifier(ItemDiscount::percentage("ten", "10% off", 1000));
        let run = discounted.run(&mut cart).unwrap();
        assert_eq!(run.passes, 1);
        assert_eq!(run.total.amount_cents, 9000);
        assert_eq!(discounted.run(&mut cart).unwrap().passes, 0);

        // Same rule name, different rate.
        let deeper = ModifierPipeline::default()
            .with_modifier(ItemDiscount::percentage("ten", "10% off", 2000));
        assert_eq!(deeper.run(&mut cart).unwrap().total.amount_cents, 8000);

        // Same rules, different ceiling.
        let relaxed = ModifierPipeline::default()
            .with_config(PipelineConfig::default().with_max_passes(3))
            .with_modifier(ItemDiscount::percentage("ten", "10% off", 2000));
        assert_eq!(relaxed.run(&mut cart).unwrap().passes, 1);
        assert_eq!(cart.priced_by().map(|s| s.starts_with("max_passes=3;")), Some(true));
    }

    #[test]
    fn test_run_modifiers_free_function() {
        let mut cart = cart_with(1000);
        let run = run_modifiers(&mut cart, &[&Surcharge]).unwrap();
        assert_eq!(run.total.amount_cents, 1100);
        assert_eq!(run.grand_total.amount_cents, 1100);
    }
}
