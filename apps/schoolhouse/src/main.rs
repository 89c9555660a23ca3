//! # Schoolhouse - School Management Server
//!
//! The main binary for Schoolhouse.
//!
//! This application provides:
//! - HTTP JSON API server (axum-based)
//! - CLI interface for setup and administration
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              apps/schoolhouse (THE BINARY)           │
//! │                                                      │
//! │   ┌─────────────┐          ┌─────────────────────┐   │
//! │   │    CLI      │          │      HTTP API       │   │
//! │   │   (clap)    │          │  (axum + sessions)  │   │
//! │   └──────┬──────┘          └──────────┬──────────┘   │
//! │          └──────────────┬─────────────┘              │
//! │                         ▼                            │
//! │               ┌───────────────────┐                  │
//! │               │ schoolhouse-core  │                  │
//! │               │   (THE LOGIC)     │                  │
//! │               └───────────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Create the database and seed experience levels and goals
//! schoolhouse init
//!
//! # Create the first program manager
//! schoolhouse create-user --email pm@school.test --first-name Pat --last-name Lee \
//!     --phone "(050) 123-45-67" --password changeme123 --role program
//!
//! # Start the HTTP server
//! schoolhouse server --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use schoolhouse::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SCHOOLHOUSE_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("SCHOOLHOUSE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "schoolhouse=info,schoolhouse_core=info,tower_http=debug".into()
    });

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Schoolhouse startup banner.
fn print_banner() {
    println!(
        r#"
   ____       _                 _ _
  / ___|  ___| |__   ___   ___ | | |__   ___  _   _ ___  ___
  \___ \ / __| '_ \ / _ \ / _ \| | '_ \ / _ \| | | / __|/ _ \
   ___) | (__| | | | (_) | (_) | | | | | (_) | |_| \__ \  __/
  |____/ \___|_| |_|\___/ \___/|_|_| |_|\___/ \__,_|___/\___|

  School Management Server v{}

  Courses • Groups • Enrollment
"#,
        env!("CARGO_PKG_VERSION")
    );
}
