//! Persons command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use facedesk_core::FaceService;

use super::AppContext;
use crate::utils::format_timestamp;

/// Execute the persons command.
pub async fn execute(ctx: &AppContext, json: bool) -> Result<()> {
    let persons = ctx.service()?.persons().await?;

    if json {
        let out = serde_json::to_string_pretty(&persons).context("Failed to serialize roster")?;
        println!("{out}");
        return Ok(());
    }

    if persons.is_empty() {
        if !ctx.quiet {
            println!("{}", "No one is enrolled yet".dimmed());
        }
        return Ok(());
    }

    let width = persons.iter().map(|p| p.name.chars().count()).max().unwrap_or(0);
    for person in &persons {
        println!(
            "{}  {}  {}",
            format!("{:<width$}", person.name).bold(),
            format_timestamp(&person.created_at).dimmed(),
            format!("{} recognitions", person.recognition_count).dimmed(),
        );
    }
    Ok(())
}
