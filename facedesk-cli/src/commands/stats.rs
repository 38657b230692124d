//! Stats command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use facedesk_core::{FaceService, Stats};

use super::AppContext;
use crate::utils::format_timestamp;

/// Execute the stats command.
pub async fn execute(ctx: &AppContext, json: bool) -> Result<()> {
    let stats = ctx.service()?.stats().await?;

    if json {
        let out = serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?;
        println!("{out}");
    } else {
        render(&stats);
    }
    Ok(())
}

fn render(stats: &Stats) {
    println!();
    println!("{}", "Recognition statistics".bold());
    println!();
    println!("   {} {}", "Enrolled:".dimmed(), stats.person_count);
    println!("   {} {}", "Attempts:".dimmed(), stats.total_attempts);
    println!("   {} {}", "Recognized:".dimmed(), stats.recognitions);
    println!("   {} {}", "Unknown:".dimmed(), stats.unknown_faces);
    println!("   {} {:.1}%", "Success:".dimmed(), stats.success_rate);
    match &stats.last_activity {
        Some(ts) => println!("   {} {}", "Last seen:".dimmed(), format_timestamp(ts)),
        None => println!("   {} {}", "Last seen:".dimmed(), "never".dimmed()),
    }
}
