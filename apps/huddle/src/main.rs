//! # Huddle - Client State Core
//!
//! Command-line driver for the Huddle state core. Runs the client flows
//! against the in-memory fixture backend and prints the resulting state.
//!
//! ## Usage
//!
//! ```bash
//! # Sign in against a fixture and print the state tree
//! huddle --fixture community.toml sign-in --email ada@example.com --password hunter22
//!
//! # Read a profile the way another member sees it
//! huddle --fixture community.toml profile --subject u7 --viewer u8
//!
//! # Reduce a recorded action log
//! huddle replay --actions session.json
//! ```

mod cli;

use clap::Parser;
use huddle::config::{HuddleConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let mut config = match HuddleConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };
    if let Some(fixture) = &cli.fixture {
        config.backend.fixture = Some(fixture.clone());
    }

    // RUST_LOG wins over the configured filter.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter().into());

    match config.log.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet {
        eprintln!("huddle v{}", env!("CARGO_PKG_VERSION"));
    }

    if let Err(e) = cli::execute(cli, &config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
