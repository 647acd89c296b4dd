//! turbo-price - price carts with the TurboCommerce modifier pipeline.
//!
//! Commands:
//! - `turbo-price price [FILE]` - Run the pipeline over the cart in a pricing file
//! - `turbo-price check [FILE]` - Validate catalog, cart and rules

mod commands;
mod config;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use turbo_pricing::PricingError;

use commands::{CheckArgs, PriceArgs};

/// Price carts from a catalog, a cart and an ordered list of rules
#[derive(Parser)]
#[command(name = "turbo-price")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price the cart in a pricing file
    Price(PriceArgs),

    /// Validate a pricing file
    Check(CheckArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_cli_logger(cli.verbose);
    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::new(output)?;

    let result = match cli.command {
        Commands::Price(args) => commands::price::run(args, &ctx),
        Commands::Check(args) => commands::check::run(args, &ctx),
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

/// 2 for bad rules, 3 when the cart never settled, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<PricingError>() {
        Some(e) if e.is_configuration() => 2,
        Some(e) if e.is_convergence() => 3,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_exit_codes() {
        let convergence = anyhow::Error::new(PricingError::Convergence { passes: 10 });
        assert_eq!(exit_code(&convergence), 3);

        let configuration: anyhow::Error =
            Err::<(), _>(PricingError::configuration("gift", "missing resolver"))
                .context("Invalid pricing rules")
                .unwrap_err();
        assert_eq!(exit_code(&configuration), 2);

        assert_eq!(exit_code(&anyhow::anyhow!("io")), 1);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "turbo-price",
            "--json",
            "price",
            "cart.toml",
            "--max-passes",
            "3",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Price(args) => {
                assert_eq!(args.file.as_deref(), Some("cart.toml"));
                assert_eq!(args.max_passes, Some(3));
            }
            Commands::Check(_) => panic!("expected price"),
        }
    }
}
