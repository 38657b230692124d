//! Register command implementation.

use anyhow::Result;
use colored::Colorize;
use tracing::info;

use super::{prepared_session, AppContext, SourceArgs};

/// Execute the register command.
pub async fn execute(ctx: &AppContext, name: &str, source: SourceArgs) -> Result<()> {
    let session = prepared_session(ctx, &source).await?;
    let enrolled = session.submit_registration(name).await?;

    info!(name = %enrolled.name, "Registered");

    let phrases = session.phrases();
    if ctx.quiet {
        println!("{}", enrolled.name);
    } else {
        println!();
        println!("{}", phrases.registered_title().green().bold());
        println!();
        println!("   {}", phrases.welcome(&enrolled.name));
        if let Some(message) = &enrolled.message {
            println!("   {}", message.dimmed());
        }
    }

    Ok(())
}
