//! Validate a pricing file without pricing anything.

use anyhow::Result;
use serde::Serialize;

use super::CheckArgs;
use crate::context::Context;

#[derive(Serialize)]
struct CheckReport<'a> {
    valid: bool,
    currency: &'a str,
    max_passes: u32,
    products: usize,
    cart_lines: usize,
    modifiers: Vec<&'a str>,
}

/// Run the check command.
pub fn run(args: CheckArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load(args.file.as_deref(), None, ctx)?;

    // Building the cart resolves every SKU.
    loaded.file.build_cart(&loaded.catalog)?;

    let report = CheckReport {
        valid: true,
        currency: loaded.file.currency.code(),
        max_passes: loaded.pipeline.config().max_passes,
        products: loaded.file.catalog.len(),
        cart_lines: loaded.file.cart.len(),
        modifiers: loaded.pipeline.modifier_names(),
    };

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header("Pricing file");
    ctx.output.kv("Currency", report.currency);
    ctx.output.kv("Max passes", &report.max_passes.to_string());
    ctx.output.kv("Products", &report.products.to_string());
    ctx.output.kv("Cart lines", &report.cart_lines.to_string());

    if report.modifiers.is_empty() {
        ctx.output.warn("No modifiers configured; carts are priced at list price.");
    } else {
        ctx.output.header("Modifiers (in order)");
        for name in &report.modifiers {
            ctx.output.list_item(name);
        }
    }

    ctx.output.success("Pricing file is valid");
    Ok(())
}
