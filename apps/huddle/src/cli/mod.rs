//! # Huddle CLI Module
//!
//! ## Available Commands
//!
//! - `sign-up` - Create an account and print the state tree
//! - `sign-in` - Sign in and print the state tree
//! - `profile` - Print a public-profile envelope
//! - `replay` - Reduce a JSON action log and print the final state tree

mod commands;

use clap::{Parser, Subcommand};
use huddle::HuddleError;
use huddle::config::HuddleConfig;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Huddle - client state core
///
/// Drives the sign-in, profile, and subscription flows against a fixture
/// backend and prints what the UI would observe.
#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (defaults to $HUDDLE_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to a TOML fixture for the in-memory backend
    #[arg(short, long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Suppress the version banner
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account
    SignUp {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Sign in to an existing account
    SignIn {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Read a member's profile as another member (or anonymously)
    Profile {
        /// Member whose profile is read
        #[arg(short, long)]
        subject: String,

        /// Member doing the reading; omit for an anonymous read
        #[arg(short, long)]
        viewer: Option<String>,
    },

    /// Reduce a JSON array of action records from the initial state
    Replay {
        /// Path to the action log
        #[arg(short, long)]
        actions: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli, config: &HuddleConfig) -> Result<(), HuddleError> {
    match cli.command {
        Commands::SignUp { email, password } => cmd_sign_up(config, &email, &password).await,
        Commands::SignIn { email, password } => cmd_sign_in(config, &email, &password).await,
        Commands::Profile { subject, viewer } => {
            cmd_profile(config, &subject, viewer.as_deref()).await
        }
        Commands::Replay { actions } => cmd_replay(&actions),
    }
}
