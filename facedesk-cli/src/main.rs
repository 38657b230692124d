//! facedesk CLI - face registration and recognition from the terminal.

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use facedesk_core::config::DEFAULT_API_URL;
use facedesk_core::{Locale, Phrases, SessionConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod console;
mod exit_codes;
mod utils;

use commands::{AppContext, SourceArgs};
use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Invalid input (empty name, empty file, bad service URL)
  65  Rejected by the recognition service
  66  Input file or camera unavailable
  69  Recognition service unreachable
  75  Another request is already in progress";

#[derive(Parser)]
#[command(name = "facedesk")]
#[command(author, version, about = "Face registration and recognition desk", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Base URL of the recognition service
    #[arg(long, global = true, env = "FACEDESK_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Interface language (en, fr)
    #[arg(long, global = true, env = "FACEDESK_LOCALE", default_value = "en")]
    locale: Locale,

    /// Only print results, no progress messages
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enroll a person from a photo or the camera
    Register {
        /// Name to register the face under
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Identify the face in a photo or the camera frame
    Recognize {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show usage statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List enrolled persons
    Persons {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove an enrolled person
    Remove {
        /// Name of the person to remove
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Run an interactive kiosk session until Ctrl-C
    Watch {
        /// Snapshot file kept current by a capture daemon
        #[arg(long, value_name = "SNAPSHOT")]
        camera: Option<PathBuf>,

        /// Run a recognition every SECS seconds
        #[arg(long, value_name = "SECS")]
        recognize_every: Option<u64>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let mut config = SessionConfig::from_env();
    config.api_url = cli.api_url;
    config.locale = cli.locale;
    let phrases = Phrases::new(config.locale);
    let ctx = AppContext {
        config,
        quiet: cli.quiet,
    };

    if let Err(err) = run(&ctx, cli.command).await {
        let exit = ExitCode::from_anyhow(&err, &phrases);
        eprintln!("{} {}", "error:".red().bold(), exit.message);
        process::exit(exit.code);
    }
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Register { name, source } => commands::register::execute(ctx, &name, source).await,
        Commands::Recognize { source, json } => {
            commands::recognize::execute(ctx, source, json).await
        }
        Commands::Stats { json } => commands::stats::execute(ctx, json).await,
        Commands::Persons { json } => commands::persons::execute(ctx, json).await,
        Commands::Remove { name } => commands::remove::execute(ctx, &name).await,
        Commands::Watch {
            camera,
            recognize_every,
        } => commands::watch::execute(ctx, camera, recognize_every).await,
    }
}
