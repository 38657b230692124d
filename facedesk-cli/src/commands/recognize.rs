//! Recognize command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use facedesk_core::RecognitionOutcome;

use super::{prepared_session, AppContext, SourceArgs};

/// Execute the recognize command.
///
/// An unknown face is a normal outcome and exits successfully.
pub async fn execute(ctx: &AppContext, source: SourceArgs, json: bool) -> Result<()> {
    let session = prepared_session(ctx, &source).await?;
    let outcome = session.submit_recognition().await?;

    if json {
        let out = serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?;
        println!("{out}");
        return Ok(());
    }

    let phrases = session.phrases();
    match &outcome {
        RecognitionOutcome::Recognized {
            name,
            confidence_percent,
        } => {
            if ctx.quiet {
                println!("{name}");
            } else {
                println!();
                println!("{} {}", "✔".green(), name.green().bold());
                println!("   {}", phrases.confidence(*confidence_percent));
            }
        }
        RecognitionOutcome::Unknown { confidence_percent } => {
            if !ctx.quiet {
                println!();
                println!("{} {}", "?".yellow(), phrases.not_recognized_title().yellow().bold());
                println!("   {}", phrases.confidence(*confidence_percent));
                println!("   {}", phrases.please_register().dimmed());
            }
        }
    }

    Ok(())
}
