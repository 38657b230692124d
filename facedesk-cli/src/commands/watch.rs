//! Watch command: a long-running kiosk session driven from stdin.
//!
//! Typed commands play the role of the kiosk's buttons. Submits run as
//! background tasks so a second one typed while the first is pending is
//! refused by the session, exactly like a double click.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use facedesk_core::{CaptureSession, FacedeskError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

use super::AppContext;
use crate::console::SinkMode;
use crate::utils::read_image;

const KIOSK_HELP: &str = "\
  recognize | r        identify the current face
  register <name>      enroll the current face
  file <path>          use a photo instead of the camera
  camera               go back to the camera
  refresh              reload statistics and roster
  quit | q             leave";

#[derive(Debug, PartialEq, Eq)]
enum KioskCommand {
    Recognize,
    Register(String),
    File(PathBuf),
    Camera,
    Refresh,
    Help,
    Quit,
}

impl FromStr for KioskCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));

        match (verb.to_ascii_lowercase().as_str(), rest) {
            ("r" | "recognize", _) => Ok(Self::Recognize),
            // Blank names go through so the session reports them.
            ("register" | "reg", name) => Ok(Self::Register(name.to_string())),
            ("file" | "f", "") => Err("file needs a path".into()),
            ("file" | "f", path) => Ok(Self::File(PathBuf::from(path))),
            ("camera" | "c", _) => Ok(Self::Camera),
            ("refresh", _) => Ok(Self::Refresh),
            ("help" | "h" | "?", _) => Ok(Self::Help),
            ("quit" | "q" | "exit", _) => Ok(Self::Quit),
            (other, _) => Err(format!("unknown command: {other}")),
        }
    }
}

/// Execute the watch command.
pub async fn execute(
    ctx: &AppContext,
    camera: Option<PathBuf>,
    recognize_every: Option<u64>,
) -> Result<()> {
    let session = ctx.session(camera.as_deref(), SinkMode::Kiosk)?;
    session.start().await;

    if !ctx.quiet {
        eprintln!("{}", "Kiosk ready. Type `help` for commands, Ctrl-C to stop.".bold());
    }

    let mut ticker = recognize_every.filter(|secs| *secs > 0).map(|secs| {
        let mut ticker = interval(Duration::from_secs(secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => match line.parse::<KioskCommand>() {
                    Ok(KioskCommand::Quit) => break,
                    Ok(command) => dispatch(&session, command).await,
                    Err(reason) => eprintln!("{} {}", "!".yellow(), reason),
                },
                None => {
                    debug!("stdin closed; running until interrupted");
                    stdin_open = false;
                }
            },
            _ = next_tick(&mut ticker) => {
                recognize_on_tick(&session);
            }
        }
    }

    session.shutdown();
    Ok(())
}

async fn dispatch(session: &CaptureSession, command: KioskCommand) {
    match command {
        KioskCommand::Recognize => spawn_submit(session, None),
        KioskCommand::Register(name) => spawn_submit(session, Some(name)),
        KioskCommand::File(path) => match read_image(&path) {
            Ok((bytes, filename)) => {
                let _ = session.select_file(bytes, filename).await;
            }
            Err(err) => eprintln!("{} {err:#}", "✘".red()),
        },
        KioskCommand::Camera => {
            let _ = session.reset_to_camera().await;
        }
        KioskCommand::Refresh => session.refresh_data().await,
        KioskCommand::Help => eprintln!("{KIOSK_HELP}"),
        KioskCommand::Quit => {}
    }
}

/// Start a periodic recognition unless a request is still pending.
///
/// Returns whether a submit was started.
fn recognize_on_tick(session: &CaptureSession) -> bool {
    if session.is_busy() {
        debug!("Request still pending; skipping recognition tick");
        return false;
    }
    spawn_submit(session, None);
    true
}

/// Run a registration (`Some(name)`) or recognition in the background.
///
/// Outcomes and failures reach the terminal through the session's sink.
fn spawn_submit(session: &CaptureSession, name: Option<String>) {
    let session = session.clone();
    tokio::spawn(async move {
        let result = match name {
            Some(name) => session.submit_registration(&name).await.map(|_| ()),
            None => session.submit_recognition().await.map(|_| ()),
        };
        match result {
            Ok(()) | Err(FacedeskError::RequestInFlight) => {}
            Err(err) => debug!(error = %err, "Kiosk submit failed"),
        }
    });
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
