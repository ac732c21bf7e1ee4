//! Integration tests for the call wrapper.
//!
//! Every outcome a backend can produce must come back as an envelope with
//! exactly one of `data` / `error` set.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use huddle::service::ops;
use huddle::{BackendError, CallFailure, CallWrapper, Fixture, MemoryService, OperationKind, Reply};
use huddle_core::{Envelope, EnvelopeStatus, ErrorKind, codes};
use serde_json::{Value, json};
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn backend() -> (Arc<MemoryService>, CallWrapper) {
    let memory = Arc::new(MemoryService::new(Fixture::default()));
    let wrapper = CallWrapper::new(memory.clone());
    (memory, wrapper)
}

fn assert_exclusive<T>(envelope: &Envelope<T>) {
    match envelope.status() {
        EnvelopeStatus::Success | EnvelopeStatus::Error => {
            assert_ne!(envelope.data().is_some(), envelope.error().is_some());
        }
        EnvelopeStatus::Idle | EnvelopeStatus::Loading => {
            assert!(envelope.data().is_none() && envelope.error().is_none());
        }
    }
}

fn explode() -> u32 {
    panic!("kaboom")
}

// =============================================================================
// OUTCOMES
// =============================================================================

#[tokio::test]
async fn refusal_without_code_defaults_to_query_error() {
    let (memory, wrapper) = backend();
    memory
        .refuse(
            ops::PROFILES_GET,
            BackendError {
                message: "not found".to_string(),
                ..BackendError::default()
            },
        )
        .await;

    let envelope: Envelope<Value> = wrapper.query(ops::PROFILES_GET, json!({"id": "u1"})).await;

    assert_exclusive(&envelope);
    assert_eq!(envelope.status(), EnvelopeStatus::Error);
    let error = envelope.error().unwrap();
    assert_eq!(error.code, codes::QUERY_ERROR);
    assert_eq!(error.message, "not found");
    assert_eq!(error.kind(), ErrorKind::Remote);
}

#[tokio::test]
async fn refusal_code_is_kept() {
    let (memory, wrapper) = backend();
    memory
        .refuse(
            "rewards-redeem",
            BackendError::new("COUPON_EXPIRED", "coupon expired").with_status_code(410),
        )
        .await;

    let envelope: Envelope<Value> = wrapper.remote_call("rewards-redeem", json!({})).await;

    let error = envelope.error().unwrap();
    assert_eq!(error.code, "COUPON_EXPIRED");
    assert_eq!(error.status_code, Some(410));
}

#[tokio::test]
async fn remote_function_refusal_defaults_to_edge_function_error() {
    let (memory, wrapper) = backend();
    memory
        .refuse(
            "rewards-redeem",
            BackendError {
                message: "insufficient points".to_string(),
                ..BackendError::default()
            },
        )
        .await;

    let envelope: Envelope<Value> = wrapper.remote_call("rewards-redeem", json!({})).await;
    assert_eq!(envelope.error().unwrap().code, codes::EDGE_FUNCTION_ERROR);
}

#[tokio::test]
async fn thrown_failure_becomes_query_exception() {
    let (memory, wrapper) = backend();
    memory.fail_transport(ops::PRODUCTS_LIST, "boom").await;

    let envelope: Envelope<Value> = wrapper.query(ops::PRODUCTS_LIST, json!({})).await;

    assert_exclusive(&envelope);
    let error = envelope.error().unwrap();
    assert_eq!(error.code, codes::QUERY_EXCEPTION);
    assert_eq!(error.message, "boom");
    assert_eq!(error.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn thrown_failure_in_remote_function_is_edge_function_exception() {
    let (memory, wrapper) = backend();
    memory.fail_transport("rewards-redeem", "socket closed").await;

    let envelope: Envelope<Value> = wrapper.remote_call("rewards-redeem", json!({})).await;
    assert_eq!(envelope.error().unwrap().code, codes::EDGE_FUNCTION_EXCEPTION);
}

#[tokio::test]
async fn panic_in_thunk_does_not_escape() {
    let (_memory, wrapper) = backend();

    let envelope: Envelope<u32> = wrapper
        .invoke(OperationKind::Query, "explodes", async {
            Ok::<Reply<u32>, CallFailure>(Ok(explode()))
        })
        .await;

    assert_exclusive(&envelope);
    let error = envelope.error().unwrap();
    assert_eq!(error.code, codes::QUERY_EXCEPTION);
    assert_eq!(error.message, "kaboom");
}

#[tokio::test]
async fn undecodable_payload_is_an_exception() {
    let (_memory, wrapper) = backend();

    // products.list returns an array, not a number
    let envelope: Envelope<u64> = wrapper.query(ops::PRODUCTS_LIST, json!({})).await;
    assert_eq!(envelope.error().unwrap().code, codes::QUERY_EXCEPTION);
}

// =============================================================================
// SUCCESS
// =============================================================================

#[tokio::test]
async fn void_operation_succeeds_with_unit() {
    let (_memory, wrapper) = backend();

    let envelope: Envelope<()> = wrapper.query(ops::AUTH_SIGN_OUT, json!({})).await;

    assert_exclusive(&envelope);
    assert!(envelope.is_success());
    assert_eq!(envelope.data(), Some(&()));
}

#[tokio::test]
async fn success_serializes_with_null_error() {
    let (_memory, wrapper) = backend();

    let envelope: Envelope<Vec<Value>> = wrapper.query(ops::PRODUCTS_LIST, json!({})).await;
    let json = serde_json::to_value(&envelope).unwrap();

    assert_eq!(json["status"], "success");
    assert_eq!(json["data"], json!([]));
    assert!(json["error"].is_null());
}
