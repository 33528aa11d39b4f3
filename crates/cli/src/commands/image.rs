//! Image Analysis Commands

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use apiprobe_common::services::{analyze_image, ImageAnalysis};
use clap::Subcommand;
use colored::Colorize;
use tracing::debug;

use crate::context::Context;
use crate::output::{print_item, print_success, with_spinner, TableDisplay};

#[derive(Subcommand)]
pub enum ImageCommands {
    /// Upload an image for product identification
    Analyze {
        /// Image file
        path: PathBuf,
    },
}

impl TableDisplay for ImageAnalysis {
    fn headers() -> Vec<&'static str> {
        vec!["Task ID", "Identified Product"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.task_id.clone(), self.identified_product.clone()]
    }
}

/// Execute image command
pub async fn execute(cmd: ImageCommands, ctx: &Context) -> Result<()> {
    ctx.signed_in()?;
    match cmd {
        ImageCommands::Analyze { path } => {
            let image = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            debug!(bytes = image.len(), path = %path.display(), "Image loaded");

            let analysis =
                with_spinner("Analyzing image...", analyze_image(&ctx.config.services, &image)).await?;
            print_success(&format!(
                "Identified product: {}",
                analysis.identified_product.as_str().bold()
            ));
            print_item(&analysis, ctx.format);
        }
    }
    Ok(())
}
