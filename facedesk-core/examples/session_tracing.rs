//! Example demonstrating capture session tracing against a live service.
//!
//! Run with: cargo run -p facedesk-core --example session_tracing -- photo.jpg

use std::sync::Arc;
use std::time::Duration;

use facedesk_core::{
    CaptureSession, HttpFaceService, HttpServiceConfig, NoCamera, SessionConfig, TracingSink,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("facedesk_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Capture Session Tracing Demo ===\n");

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: session_tracing <photo>");
        return;
    };

    let mut config = SessionConfig::from_env();
    config.http_timeout = Some(Duration::from_secs(15));
    println!("Config: {:?}\n", config);

    let service = match HttpFaceService::new(HttpServiceConfig::from(&config)) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    let session = CaptureSession::new(
        config,
        Arc::new(service),
        Arc::new(NoCamera),
        Arc::new(TracingSink),
    );
    session.start().await;

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            return;
        }
    };
    if let Err(e) = session.select_file(bytes, path.as_str()).await {
        eprintln!("Failed to select file: {}", e);
        return;
    }

    println!("\nRecognizing...\n");

    match session.submit_recognition().await {
        Ok(outcome) => {
            println!("\n✅ Done!");
            println!("   Recognized: {}", outcome.is_recognized());
            println!("   Confidence: {}%", outcome.confidence_percent());
        }
        Err(e) => {
            println!("\n❌ Failed: {}", e);
        }
    }

    session.shutdown();
}
