//! Remove command implementation.

use anyhow::Result;
use colored::Colorize;
use facedesk_core::FaceService;
use tracing::info;

use super::AppContext;

/// Execute the remove command.
pub async fn execute(ctx: &AppContext, name: &str) -> Result<()> {
    let message = ctx.service()?.remove_person(name).await?;
    info!(name, "Person removed");

    if !ctx.quiet {
        println!("{} {}", "✔".green(), message);
    }
    Ok(())
}
