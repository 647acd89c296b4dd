//! Price the cart described by a pricing file.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use turbo_pricing::cart::{Cart, LineItem, LineItemKind, PriceAdjustment};
use turbo_pricing::pipeline::PricingRun;

use super::PriceArgs;
use crate::context::Context;
use crate::output::line_badge;

/// Priced cart as reported to the user.
#[derive(Debug, Serialize)]
pub struct PriceReport {
    pub cart_id: String,
    pub currency: String,
    pub passes: u32,
    pub lines: Vec<LineReport>,
    pub cart_adjustments: Vec<AdjustmentReport>,
    pub total_cents: i64,
    pub grand_total_cents: i64,
    pub priced_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LineReport {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub adjustments: Vec<AdjustmentReport>,
    pub total_cents: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granted_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdjustmentReport {
    pub label: String,
    pub amount_cents: i64,
}

impl From<&PriceAdjustment> for AdjustmentReport {
    fn from(adjustment: &PriceAdjustment) -> Self {
        Self {
            label: adjustment.label().to_string(),
            amount_cents: adjustment.amount().amount_cents,
        }
    }
}

impl From<&LineItem> for LineReport {
    fn from(item: &LineItem) -> Self {
        let granted_by = match item.kind() {
            LineItemKind::GiftProxy { granted_by, .. } => Some(granted_by.clone()),
            LineItemKind::Ordinary => None,
        };
        Self {
            product_id: item.product_id().to_string(),
            sku: item.product.sku.clone(),
            name: item.product.name.clone(),
            quantity: item.quantity(),
            unit_price_cents: item.unit_price().amount_cents,
            adjustments: item.adjustments().iter().map(AdjustmentReport::from).collect(),
            total_cents: item.current_total().amount_cents,
            granted_by,
        }
    }
}

impl PriceReport {
    /// Snapshot a priced cart.
    pub fn new(cart: &Cart, run: &PricingRun, priced_at: DateTime<Utc>) -> Self {
        Self {
            cart_id: cart.id.to_string(),
            currency: cart.currency().code().to_string(),
            passes: run.passes,
            lines: cart.items().iter().map(LineReport::from).collect(),
            cart_adjustments: cart.adjustments().iter().map(AdjustmentReport::from).collect(),
            total_cents: run.total.amount_cents,
            grand_total_cents: run.grand_total.amount_cents,
            priced_at,
        }
    }
}

/// Run the price command.
pub fn run(args: PriceArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load(args.file.as_deref(), args.max_passes, ctx)?;
    let mut cart = loaded.file.build_cart(&loaded.catalog)?;
    if cart.is_empty() {
        ctx.output.info("Cart is empty; only order level rules will apply.");
    }

    ctx.output.debug(&format!(
        "Running {} modifier(s): {}",
        loaded.pipeline.len(),
        loaded.pipeline.modifier_names().join(", ")
    ));

    let run = loaded.pipeline.run(&mut cart)?;
    info!(cart = %cart.id, passes = run.passes, total = %run.total, "cart priced");

    let report = PriceReport::new(&cart, &run, Utc::now());
    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    print_report(&cart, &run, ctx);
    Ok(())
}

fn print_report(cart: &Cart, run: &PricingRun, ctx: &Context) {
    ctx.output.header(&format!("Cart {}", cart.id));
    ctx.output.line_header();
    for item in cart.items() {
        let badge = line_badge(item.is_gift(), !item.adjustments().is_empty());
        ctx.output.line(
            &item.product.name,
            item.quantity(),
            item.unit_price(),
            item.current_total(),
            &badge,
            item.adjustments(),
        );
    }

    if !cart.adjustments().is_empty() {
        ctx.output.header("Order adjustments");
        for adjustment in cart.adjustments() {
            ctx.output.adjustment(adjustment, 0);
        }
    }

    ctx.output.header("Totals");
    ctx.output.kv("Line total", &run.total.display());
    ctx.output.kv("Grand total", &run.grand_total.display());
    ctx.output.kv("Passes", &run.passes.to_string());
    ctx.output.success("Cart priced");
}
