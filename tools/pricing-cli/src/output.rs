//! Terminal output for priced carts.
//!
//! Human output goes to stdout; status and diagnostics go to stderr. In JSON
//! mode only [`Output::json`] and [`Output::error`] print anything.

use console::style;
use turbo_pricing::cart::PriceAdjustment;
use turbo_pricing::Money;

/// Column widths of the line table: product, qty, unit, total, badge.
const LINE_COLUMNS: [usize; 5] = [24, 5, 12, 12, 10];

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }

    fn human(&self) -> bool {
        !self.json
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.human() {
            eprintln!("{} {}", style("ℹ").blue(), msg);
        }
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.human() {
            eprintln!("{} {}", style("✓").green(), msg);
        }
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.human() {
            eprintln!("{} {}", style("⚠").yellow(), msg);
        }
    }

    /// Print an error message. JSON mode emits `{"error": ...}`.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            eprintln!("{} {}", style("✗").red(), style(msg).red());
        }
    }

    /// Print a debug message (only with `--verbose`).
    pub fn debug(&self, msg: &str) {
        if self.verbose && self.human() {
            eprintln!("{} {}", style("→").dim(), style(msg).dim());
        }
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.human() {
            println!("\n{}", style(msg).bold().underlined());
        }
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.human() {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.human() {
            println!("  {} {}", style("•").dim(), item);
        }
    }

    /// Header row of the line table.
    pub fn line_header(&self) {
        if self.human() {
            let row = format_row(&["Product", "Qty", "Unit", "Total", ""], &LINE_COLUMNS);
            println!("  {}", style(row).bold());
        }
    }

    /// One cart line followed by its adjustments.
    pub fn line(
        &self,
        name: &str,
        quantity: i64,
        unit: Money,
        total: Money,
        badge: &str,
        adjustments: &[PriceAdjustment],
    ) {
        if !self.human() {
            return;
        }
        let quantity = quantity.to_string();
        let unit = unit.display();
        let total = total.display();
        println!(
            "  {}",
            format_row(&[name, &quantity, &unit, &total, badge], &LINE_COLUMNS)
        );
        for adjustment in adjustments {
            self.adjustment(adjustment, 4);
        }
    }

    /// An adjustment, rebates in green.
    pub fn adjustment(&self, adjustment: &PriceAdjustment, indent: usize) {
        if !self.human() {
            return;
        }
        let amount = adjustment.amount().display();
        let amount = if adjustment.is_rebate() {
            style(amount).green().to_string()
        } else {
            style(amount).yellow().to_string()
        };
        println!(
            "  {:indent$}{} {}",
            "",
            style(adjustment.label()).dim(),
            amount,
            indent = indent
        );
    }
}

fn format_row(cols: &[&str], widths: &[usize]) -> String {
    cols.iter()
        .zip(widths.iter())
        .map(|(col, width)| format!("{:width$}", col, width = width))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Badge for the last column of the line table.
pub fn line_badge(is_gift: bool, discounted: bool) -> String {
    if is_gift {
        style("gift").green().to_string()
    } else if discounted {
        style("discounted").yellow().to_string()
    } else {
        String::new()
    }
}
