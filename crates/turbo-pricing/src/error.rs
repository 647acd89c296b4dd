//! Pricing error types.

use thiserror::Error;

/// Errors raised by cart data operations and money arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotInCart(String),

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(i64, i64),

    /// Gift lines always hold exactly one unit.
    #[error("Quantity of gift line {0} is fixed at 1")]
    GiftQuantityFixed(String),

    /// Unit prices can't be negative.
    #[error("Negative unit price for {0}")]
    NegativePrice(String),

    /// Currency mismatch.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,
}

/// Errors that abort a pipeline run.
///
/// Every variant means the cart could not be priced. Callers must block the
/// purchase and discard whatever totals the cart currently holds.
#[derive(Error, Debug)]
pub enum PricingError {
    /// A modifier or the pipeline is misconfigured.
    #[error("Configuration error in {modifier}: {reason}")]
    Configuration { modifier: String, reason: String },

    /// A modifier hook failed.
    #[error("Modifier {modifier} failed during pass {pass}: {source}")]
    RuleExecution {
        modifier: String,
        pass: u32,
        #[source]
        source: CommerceError,
    },

    /// The pass ceiling was reached with another pass still requested.
    #[error("Pricing did not converge after {passes} passes")]
    Convergence { passes: u32 },

    /// Arithmetic owned by the pipeline itself (total summation) failed.
    #[error(transparent)]
    Commerce(#[from] CommerceError),
}

impl PricingError {
    /// Build a configuration error for the named component.
    pub fn configuration(modifier: impl Into<String>, reason: impl Into<String>) -> Self {
        PricingError::Configuration {
            modifier: modifier.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error signals a rule-interaction bug (non-convergence).
    pub fn is_convergence(&self) -> bool {
        matches!(self, PricingError::Convergence { .. })
    }

    /// Whether this error is a configuration problem.
    pub fn is_configuration(&self) -> bool {
        matches!(self, PricingError::Configuration { .. })
    }
}
