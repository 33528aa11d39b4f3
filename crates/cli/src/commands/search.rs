//! Search Command

use anyhow::Result;
use apiprobe_common::services::{search, SearchResult};
use apiprobe_common::Service;
use clap::Args;

use crate::context::Context;
use crate::output::{cell, print_list, with_spinner, TableDisplay};

#[derive(Args)]
pub struct SearchArgs {
    /// Search text
    pub query: String,
}

impl TableDisplay for SearchResult {
    fn headers() -> Vec<&'static str> {
        vec!["Type", "ID", "Name", "Email", "Address"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.kind.clone(),
            self.id.clone(),
            self.label().to_string(),
            cell(self.email.as_deref()),
            cell(self.address.as_deref()),
        ]
    }
}

/// Execute search command
pub async fn execute(args: SearchArgs, ctx: &Context) -> Result<()> {
    let snapshot = ctx.signed_in()?;
    let credential = snapshot.require_credential()?;
    let client = ctx.client(Service::Search)?;
    let results = with_spinner("Searching...", search(&client, credential, &args.query)).await?;
    print_list(&results, ctx.format);
    Ok(())
}
