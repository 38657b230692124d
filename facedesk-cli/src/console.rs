//! Terminal rendering of session events.

use colored::Colorize;
use facedesk_core::{NotificationSink, StatusLevel, UiEvent};

/// How much of the event stream reaches the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Progress lines only; the command prints the final result itself.
    OneShot,
    /// Everything, including speech and background refreshes.
    Kiosk,
}

pub struct ConsoleSink {
    mode: SinkMode,
    quiet: bool,
}

impl ConsoleSink {
    pub fn new(mode: SinkMode, quiet: bool) -> Self {
        Self { mode, quiet }
    }
}

impl NotificationSink for ConsoleSink {
    fn publish(&self, event: UiEvent) {
        if self.quiet {
            return;
        }

        match (self.mode, event) {
            (
                _,
                UiEvent::Status {
                    level: StatusLevel::Info,
                    message,
                },
            ) => eprintln!("{} {}", "›".dimmed(), message.dimmed()),
            (SinkMode::OneShot, _) => {}
            (SinkMode::Kiosk, UiEvent::Status { level, message }) => {
                eprintln!("{} {}", marker(level), paint(level, &message))
            }
            (SinkMode::Kiosk, UiEvent::Result { level, title, body }) => {
                println!();
                println!("   {}", paint(level, &title).bold());
                for line in body.lines() {
                    println!("   {line}");
                }
                println!();
            }
            (SinkMode::Kiosk, UiEvent::Speak { text, .. }) => {
                println!("   {} {}", "♪".cyan(), text.italic())
            }
            (SinkMode::Kiosk, UiEvent::ModeChanged(mode)) => {
                eprintln!("{} {} mode", "›".dimmed(), mode.to_string().bold())
            }
            (SinkMode::Kiosk, UiEvent::Preview(preview)) => eprintln!(
                "{} {} ({}x{})",
                "›".dimmed(),
                preview.filename,
                preview.image.width(),
                preview.image.height()
            ),
            (SinkMode::Kiosk, UiEvent::PreviewFailed { filename, reason }) => eprintln!(
                "{} {} cannot be previewed: {}",
                "!".yellow(),
                filename,
                reason.dimmed()
            ),
            (SinkMode::Kiosk, UiEvent::Busy(true)) => eprintln!("{}", "…".dimmed()),
            (SinkMode::Kiosk, UiEvent::FocusNameInput) => eprintln!(
                "{} {}",
                "›".dimmed(),
                "register <name> to enroll this face".yellow()
            ),
            (SinkMode::Kiosk, UiEvent::StatsUpdated(stats)) => eprintln!(
                "{} {} persons, {} attempts, {:.1}% success",
                "›".dimmed(),
                stats.person_count,
                stats.total_attempts,
                stats.success_rate
            ),
            (SinkMode::Kiosk, _) => {}
        }
    }
}

fn marker(level: StatusLevel) -> colored::ColoredString {
    match level {
        StatusLevel::Info => "›".dimmed(),
        StatusLevel::Success => "✔".green(),
        StatusLevel::Error => "✘".red(),
    }
}

fn paint(level: StatusLevel, text: &str) -> colored::ColoredString {
    match level {
        StatusLevel::Info => text.normal(),
        StatusLevel::Success => text.green(),
        StatusLevel::Error => text.red(),
    }
}
