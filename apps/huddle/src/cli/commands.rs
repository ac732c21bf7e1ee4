//! # CLI Command Implementations

use huddle::config::HuddleConfig;
use huddle::service::{Fixture, MemoryService};
use huddle::{AppClient, HuddleError, SignUpOutcome};
use huddle_core::{Action, AppState, UserId, reduce};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Maximum size of an action log accepted by `replay` (16 MB).
const MAX_REPLAY_FILE_SIZE: u64 = 16 * 1024 * 1024;

fn client(config: &HuddleConfig) -> Result<AppClient, HuddleError> {
    let fixture = match &config.backend.fixture {
        Some(path) => Fixture::load(path)?,
        None => Fixture::default(),
    };
    tracing::debug!(
        users = fixture.users.len(),
        profiles = fixture.profiles.len(),
        "fixture loaded"
    );
    Ok(AppClient::connect(Arc::new(MemoryService::new(fixture))))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), HuddleError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// AUTH COMMANDS
// =============================================================================

pub async fn cmd_sign_up(
    config: &HuddleConfig,
    email: &str,
    password: &str,
) -> Result<(), HuddleError> {
    let client = client(config)?;
    match client.sign_up(email, password).await? {
        SignUpOutcome::SignedIn(user) => {
            client.load_subscription(&user.id).await?;
        }
        SignUpOutcome::ConfirmationPending(user) => {
            tracing::info!(user_id = %user.id, "confirm the email address to sign in");
        }
    }
    print_json(&*client.store().get_state())
}

pub async fn cmd_sign_in(
    config: &HuddleConfig,
    email: &str,
    password: &str,
) -> Result<(), HuddleError> {
    let client = client(config)?;
    let user = client.sign_in(email, password).await?;
    client.load_subscription(&user.id).await?;
    client.load_products().await?;
    print_json(&*client.store().get_state())
}

// =============================================================================
// PROFILE COMMAND
// =============================================================================

pub async fn cmd_profile(
    config: &HuddleConfig,
    subject: &str,
    viewer: Option<&str>,
) -> Result<(), HuddleError> {
    let client = client(config)?;
    let viewer = viewer.map(UserId::from);
    let envelope = client
        .get_public_profile(&UserId::from(subject), viewer.as_ref())
        .await;
    print_json(&envelope)
}

// =============================================================================
// REPLAY COMMAND
// =============================================================================

pub fn cmd_replay(path: &Path) -> Result<(), HuddleError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HuddleError::Io(format!("cannot read {}: {e}", path.display())))?;
    if metadata.len() > MAX_REPLAY_FILE_SIZE {
        return Err(HuddleError::Io(format!(
            "{} is {} bytes, limit is {} bytes",
            path.display(),
            metadata.len(),
            MAX_REPLAY_FILE_SIZE
        )));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| HuddleError::Io(format!("cannot read {}: {e}", path.display())))?;
    let actions: Vec<Action> = serde_json::from_str(&contents)?;

    let state = actions
        .iter()
        .fold(AppState::initial(), |state, action| reduce(&state, action));
    tracing::info!(actions = actions.len(), "action log replayed");
    print_json(&state)
}
