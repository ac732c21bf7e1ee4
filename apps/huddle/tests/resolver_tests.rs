//! Integration tests for public-profile resolution.
//!
//! Drives the resolver through `AppClient::get_public_profile` so every
//! read goes through the call wrapper, the friendship lookup, and the
//! disclosure table together.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use async_trait::async_trait;
use huddle::service::ops;
use huddle::{
    AppClient, CallWrapper, Fixture, LookupError, MemoryService, ProfileResolver,
    RelationshipLookup, Store,
};
use huddle_core::{
    Disclosure, ErrorKind, Relationship, UserId, Visibility, codes, disclosure,
};
use std::path::Path;
use std::sync::Arc;

const FIXTURE: &str = r#"
[[profiles]]
id = "u1"
display_name = "Fran"
membership_tier = "gold"
avatar_url = "https://cdn.example.com/u1.png"
points_balance = 1200
lifetime_points = 5400
city = "Lisbon"
bio = "Early runs only"
profile_visibility = "friends"

[[profiles]]
id = "u2"
display_name = "Andy"
membership_tier = "silver"
points_balance = 300
lifetime_points = 300
profile_visibility = "anyone"

[[profiles]]
id = "u3"
display_name = "Nell"
points_balance = 80
lifetime_points = 90
social_handle = "@nell"
profile_visibility = "nobody"

[[friendships]]
user_id = "u10"
friend_id = "u1"
status = "accepted"

[[friendships]]
user_id = "u2"
friend_id = "u10"
status = "accepted"

[[friendships]]
user_id = "u10"
friend_id = "u3"
status = "accepted"

[[friendships]]
user_id = "u11"
friend_id = "u1"
status = "pending"
"#;

const FRIEND: &str = "u10";
const STRANGER: &str = "u11";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn community() -> (Arc<MemoryService>, AppClient) {
    let fixture = Fixture::from_toml_str(FIXTURE, Path::new("community.toml")).unwrap();
    let memory = Arc::new(MemoryService::new(fixture));
    let client = AppClient::connect(memory.clone());
    (memory, client)
}

fn subject_with(policy: Visibility) -> UserId {
    match policy {
        Visibility::Friends => UserId::new("u1"),
        Visibility::Anyone => UserId::new("u2"),
        Visibility::Nobody => UserId::new("u3"),
    }
}

fn viewer_for(relationship: Relationship, subject: &UserId) -> Option<UserId> {
    match relationship {
        Relationship::Owner => Some(subject.clone()),
        Relationship::Friend => Some(UserId::new(FRIEND)),
        Relationship::Stranger => Some(UserId::new(STRANGER)),
        Relationship::Anonymous => None,
    }
}

/// Lookup that always refuses, standing in for a locked-down backend.
struct RefusingLookup;

#[async_trait]
impl RelationshipLookup for RefusingLookup {
    async fn relationship(
        &self,
        _viewer: Option<&UserId>,
        _subject: &UserId,
    ) -> Result<Relationship, LookupError> {
        Err(LookupError::Refused("permission denied for friendships".to_string()))
    }
}

// =============================================================================
// DISCLOSURE TABLE
// =============================================================================

#[tokio::test]
async fn every_policy_and_relationship_matches_the_table() {
    let (_memory, client) = community();

    for policy in Visibility::ALL {
        for relationship in Relationship::ALL {
            let subject = subject_with(policy);
            let viewer = viewer_for(relationship, &subject);

            let envelope = client.get_public_profile(&subject, viewer.as_ref()).await;
            let resolved = envelope
                .data()
                .unwrap_or_else(|| panic!("{policy:?}/{relationship:?}: {:?}", envelope.error()));

            assert_eq!(
                resolved.disclosure(),
                disclosure(policy, relationship),
                "{policy:?} viewed by {relationship:?}"
            );
            assert_eq!(resolved.card.id, subject);
        }
    }
}

#[tokio::test]
async fn minimal_result_carries_only_card_keys() {
    let (_memory, client) = community();

    let envelope = client
        .get_public_profile(&UserId::new("u1"), Some(&UserId::new(STRANGER)))
        .await;
    let json = serde_json::to_value(envelope.data().unwrap()).unwrap();

    let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["avatar_url", "display_name", "id", "membership_tier"]);
}

#[tokio::test]
async fn full_result_carries_extended_fields() {
    let (_memory, client) = community();

    let envelope = client
        .get_public_profile(&UserId::new("u1"), Some(&UserId::new(FRIEND)))
        .await;
    let resolved = envelope.data().unwrap();

    assert_eq!(resolved.disclosure(), Disclosure::Full);
    let extended = resolved.extended.as_ref().unwrap();
    assert_eq!(extended.points_balance, 1200);
    assert_eq!(extended.city.as_deref(), Some("Lisbon"));
}

#[tokio::test]
async fn nobody_policy_hides_extended_fields_from_the_owner() {
    let (_memory, client) = community();
    let nell = UserId::new("u3");

    let envelope = client.get_public_profile(&nell, Some(&nell)).await;
    let resolved = envelope.data().unwrap();
    assert!(resolved.extended.is_none());
    assert_eq!(resolved.card.display_name, "Nell");
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn missing_subject_is_not_found() {
    let (_memory, client) = community();

    let envelope = client.get_public_profile(&UserId::new("u99"), None).await;
    let error = envelope.error().unwrap();
    assert_eq!(error.code, codes::NOT_FOUND);
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn failed_lookup_withholds_the_profile() {
    let (memory, client) = community();
    memory
        .fail_transport(ops::FRIENDSHIPS_STATUS, "connection reset")
        .await;

    let envelope = client
        .get_public_profile(&UserId::new("u1"), Some(&UserId::new(FRIEND)))
        .await;

    assert!(envelope.data().is_none());
    assert_eq!(
        envelope.error().unwrap().code,
        codes::RELATIONSHIP_LOOKUP_FAILED
    );
}

#[tokio::test]
async fn refused_lookup_withholds_the_profile() {
    let fixture = Fixture::from_toml_str(FIXTURE, Path::new("community.toml")).unwrap();
    let memory = Arc::new(MemoryService::new(fixture));
    let client = AppClient::new(
        Arc::new(Store::new()),
        CallWrapper::new(memory.clone()),
        ProfileResolver::new(memory.clone(), Arc::new(RefusingLookup)),
    );

    let envelope = client
        .get_public_profile(&UserId::new("u2"), Some(&UserId::new(STRANGER)))
        .await;

    let error = envelope.error().unwrap();
    assert_eq!(error.code, codes::RELATIONSHIP_LOOKUP_FAILED);
    assert!(error.message.contains("permission denied"));
}

#[tokio::test]
async fn unreadable_profile_row_is_a_query_exception() {
    let (memory, client) = community();
    memory.fail_transport(ops::PROFILES_GET, "timed out").await;

    let envelope = client.get_public_profile(&UserId::new("u2"), None).await;
    let error = envelope.error().unwrap();
    assert_eq!(error.code, codes::QUERY_EXCEPTION);
    assert_eq!(error.message, "timed out");
}

#[tokio::test]
async fn relationship_is_looked_up_per_read() {
    let (memory, client) = community();
    let subject = UserId::new("u1");
    let friend = UserId::new(FRIEND);

    client.get_public_profile(&subject, Some(&friend)).await;
    client.get_public_profile(&subject, Some(&friend)).await;

    let lookups = memory
        .operations()
        .await
        .into_iter()
        .filter(|op| op == ops::FRIENDSHIPS_STATUS)
        .count();
    assert_eq!(lookups, 2);
}
