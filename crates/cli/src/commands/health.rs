//! Health Command

use anyhow::Result;
use apiprobe_common::services::check_health;
use apiprobe_common::Service;

use crate::context::Context;
use crate::output::{print_success, print_value, with_spinner};

/// Check the health endpoint and print its body
pub async fn execute(ctx: &Context) -> Result<()> {
    let client = ctx.client(Service::Health)?;
    let body = with_spinner("Checking health...", check_health(&client)).await?;
    print_success(&format!("Service is healthy ({})", client.base_url()));
    print_value(&body, ctx.format);
    Ok(())
}
