//! # Profile Resolver
//!
//! Reads another member's profile through the disclosure table.
//!
//! 1. Fetch the subject record (`profiles.get`). No row → `NOT_FOUND`.
//! 2. Classify the viewer: no viewer → anonymous, same id → self,
//!    otherwise ask the [`RelationshipLookup`].
//! 3. Apply [`huddle_core::resolve`] with the subject's own policy.
//!
//! A failed lookup withholds the whole profile. The resolver never guesses
//! `stranger` (or anything else) when it cannot tell.

use crate::service::{BackendError, CallFailure, RemoteService, Reply, ops};
use async_trait::async_trait;
use huddle_core::{
    ApiError, Profile, ProfileRecord, PublicProfile, Relationship, UserId, codes, resolve,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Log context of resolver events.
pub const LOG_CONTEXT: &str = "resolver";

/// Friendship status that counts as `friend`.
pub const ACCEPTED: &str = "accepted";

// =============================================================================
// RELATIONSHIP LOOKUP
// =============================================================================

/// The relationship could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("friendship lookup refused: {0}")]
    Refused(String),

    #[error("friendship lookup failed: {0}")]
    Failed(String),
}

/// Computes how a viewer stands with respect to a subject.
#[async_trait]
pub trait RelationshipLookup: Send + Sync {
    async fn relationship(
        &self,
        viewer: Option<&UserId>,
        subject: &UserId,
    ) -> Result<Relationship, LookupError>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FriendshipRow {
    status: Option<String>,
}

/// [`RelationshipLookup`] over the `friendships.status` operation.
///
/// Only an `accepted` friendship makes a friend; pending or blocked rows and
/// missing rows make a stranger.
#[derive(Clone)]
pub struct FriendshipLookup {
    service: Arc<dyn RemoteService>,
}

impl FriendshipLookup {
    pub fn new(service: Arc<dyn RemoteService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RelationshipLookup for FriendshipLookup {
    async fn relationship(
        &self,
        viewer: Option<&UserId>,
        subject: &UserId,
    ) -> Result<Relationship, LookupError> {
        if let Some(known) = Relationship::without_lookup(viewer, subject) {
            return Ok(known);
        }
        let viewer = viewer.ok_or_else(|| LookupError::Failed("no viewer".to_string()))?;

        let reply = self
            .service
            .perform_query(
                ops::FRIENDSHIPS_STATUS,
                json!({ "user_id": viewer, "friend_id": subject }),
            )
            .await
            .and_then(|raw| raw.decode::<Option<FriendshipRow>>())
            .map_err(|e| LookupError::Failed(e.to_string()))?;

        match reply {
            Err(refusal) => Err(LookupError::Refused(refusal.message)),
            Ok(Some(row)) if row.status.as_deref() == Some(ACCEPTED) => Ok(Relationship::Friend),
            Ok(_) => Ok(Relationship::Stranger),
        }
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Privacy-gated profile reads.
#[derive(Clone)]
pub struct ProfileResolver {
    service: Arc<dyn RemoteService>,
    lookup: Arc<dyn RelationshipLookup>,
}

impl ProfileResolver {
    pub fn new(service: Arc<dyn RemoteService>, lookup: Arc<dyn RelationshipLookup>) -> Self {
        Self { service, lookup }
    }

    /// Resolver with the friendship-backed lookup over the same service.
    pub fn with_friendships(service: Arc<dyn RemoteService>) -> Self {
        let lookup = Arc::new(FriendshipLookup::new(Arc::clone(&service)));
        Self::new(service, lookup)
    }

    /// Resolve `subject` as seen by `viewer`. Shaped as a call thunk so the
    /// call wrapper can run it.
    pub async fn resolve(
        &self,
        subject: &UserId,
        viewer: Option<&UserId>,
    ) -> Result<Reply<PublicProfile>, CallFailure> {
        let record = match self
            .service
            .perform_query(ops::PROFILES_GET, json!({ "id": subject }))
            .await?
            .decode::<Option<ProfileRecord>>()?
        {
            Ok(Some(record)) => record,
            Ok(None) => {
                return Ok(Err(ApiError::not_found(format!("profile {subject}")).into()));
            }
            Err(refusal) => return Ok(Err(refusal)),
        };
        let profile = Profile::try_from(record).map_err(|e| CallFailure::Decode(e.to_string()))?;

        let relationship = match self.lookup.relationship(viewer, subject).await {
            Ok(relationship) => relationship,
            Err(e) => {
                tracing::warn!(
                    context = LOG_CONTEXT,
                    subject = %subject,
                    error = %e,
                    "relationship unknown, withholding profile"
                );
                return Ok(Err(BackendError::new(
                    codes::RELATIONSHIP_LOOKUP_FAILED,
                    e.to_string(),
                )));
            }
        };

        let resolved = resolve(&profile, profile.visibility, relationship);
        tracing::debug!(
            context = LOG_CONTEXT,
            subject = %subject,
            relationship = ?relationship,
            disclosure = ?resolved.disclosure(),
            "profile resolved"
        );
        Ok(Ok(resolved))
    }
}

// =============================================================================
// TESTS
// =============================================================================
