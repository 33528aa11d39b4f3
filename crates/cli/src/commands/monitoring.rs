//! Monitoring Commands

use anyhow::Result;
use apiprobe_common::services::{price_history, PriceRecord};
use apiprobe_common::Service;
use clap::Subcommand;

use crate::context::Context;
use crate::output::{print_list, print_warning, with_spinner, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum MonitoringCommands {
    /// Show the price history of a product
    Prices {
        /// Product ID
        product_id: String,
    },
}

impl TableDisplay for PriceRecord {
    fn headers() -> Vec<&'static str> {
        vec!["Time", "Price", "Product ID"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.time.clone(),
            format!("{:.2}", self.price),
            self.product_id.clone(),
        ]
    }
}

/// Execute monitoring command
pub async fn execute(cmd: MonitoringCommands, ctx: &Context) -> Result<()> {
    ctx.signed_in()?;
    match cmd {
        MonitoringCommands::Prices { product_id } => {
            let client = ctx.client(Service::Monitoring)?;
            let records =
                with_spinner("Fetching price history...", price_history(&client, &product_id)).await?;
            if records.is_empty() && ctx.format != OutputFormat::Json {
                print_warning(&format!("No price history for product {}", product_id.trim()));
                return Ok(());
            }
            print_list(&records, ctx.format);
        }
    }
    Ok(())
}
