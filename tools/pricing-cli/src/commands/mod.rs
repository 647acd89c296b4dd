//! CLI command implementations.

pub mod check;
pub mod price;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use turbo_pricing::catalog::ProductCatalog;
use turbo_pricing::pipeline::ModifierPipeline;

use crate::config::PricingFile;
use crate::context::Context;

/// Arguments for the price command.
#[derive(Args)]
pub struct PriceArgs {
    /// Pricing file (default: pricing.toml or pricing.json, searched upwards).
    pub file: Option<String>,

    /// Override the pass ceiling from the file.
    #[arg(long)]
    pub max_passes: Option<u32>,
}

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Pricing file (default: pricing.toml or pricing.json, searched upwards).
    pub file: Option<String>,
}

/// A loaded pricing file with its catalog and built pipeline.
pub(crate) struct Loaded {
    pub file: PricingFile,
    pub catalog: Arc<dyn ProductCatalog>,
    pub pipeline: ModifierPipeline,
}

/// Load the pricing file and build its pipeline, applying CLI overrides.
pub(crate) fn load(
    explicit: Option<&str>,
    max_passes: Option<u32>,
    ctx: &Context,
) -> Result<Loaded> {
    let path = ctx.pricing_file(explicit)?;
    ctx.output.debug(&format!("Using pricing file {}", path.display()));

    let mut file = PricingFile::load(&path.to_string_lossy())?;
    if let Some(max_passes) = max_passes {
        file.pipeline = file.pipeline.with_max_passes(max_passes);
    }

    let catalog: Arc<dyn ProductCatalog> = Arc::new(file.catalog());
    let pipeline = file
        .pricing_config()
        .build_pipeline(file.currency, &catalog)
        .context("Invalid pricing rules")?;

    Ok(Loaded {
        file,
        catalog,
        pipeline,
    })
}
