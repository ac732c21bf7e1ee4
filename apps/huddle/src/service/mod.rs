//! # Remote Service Seam
//!
//! Everything the client knows about the backend goes through
//! [`RemoteService`]. A backend answers each call in one of three ways:
//!
//! - `Ok(RawReply { error: None, .. })` → the operation succeeded, `data` holds the payload
//! - `Ok(RawReply { error: Some(..), .. })` → the backend refused the operation in-band
//! - `Err(CallFailure)` → the call never produced a reply (transport, decoding)
//!
//! The call wrapper folds all three into an [`huddle_core::Envelope`].

pub mod memory;

use async_trait::async_trait;
use huddle_core::{ApiError, RecordError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory::{Fixture, FixtureFriendship, FixtureUser, MemoryService};

/// Operation names understood by every backend.
pub mod ops {
    pub const AUTH_SIGN_UP: &str = "auth.sign_up";
    pub const AUTH_SIGN_IN: &str = "auth.sign_in";
    pub const AUTH_SIGN_OUT: &str = "auth.sign_out";
    pub const AUTH_SESSION: &str = "auth.session";
    pub const PROFILES_GET: &str = "profiles.get";
    pub const PROFILES_UPDATE: &str = "profiles.update";
    pub const FRIENDSHIPS_STATUS: &str = "friendships.status";
    pub const SUBSCRIPTIONS_CURRENT: &str = "subscriptions.current";
    pub const PRODUCTS_LIST: &str = "products.list";
    pub const TRANSACTIONS_LIST: &str = "transactions.list";
}

// =============================================================================
// REPLIES
// =============================================================================

/// An in-band refusal reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendError {
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
    pub status_code: Option<u16>,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            details: None,
            status_code: None,
        }
    }

    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Convert into an [`ApiError`], using `fallback_code` when the backend sent none.
    pub fn into_api_error(self, fallback_code: &str) -> ApiError {
        let code = self
            .code
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fallback_code.to_string());
        let message = if self.message.is_empty() {
            "unknown backend error".to_string()
        } else {
            self.message
        };

        let mut error = ApiError::new(code, message);
        error.details = self.details;
        error.status_code = self.status_code;
        error
    }
}

impl From<ApiError> for BackendError {
    fn from(e: ApiError) -> Self {
        Self {
            code: Some(e.code),
            message: e.message,
            details: e.details,
            status_code: e.status_code,
        }
    }
}

/// A decoded reply: the payload, or the backend's refusal.
pub type Reply<T> = Result<T, BackendError>;

/// The raw `{ data, error }` shape every backend returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReply {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub error: Option<BackendError>,
}

impl RawReply {
    pub fn ok(data: Value) -> Self {
        Self { data, error: None }
    }

    pub fn refused(error: BackendError) -> Self {
        Self {
            data: Value::Null,
            error: Some(error),
        }
    }

    /// Decode the payload as `T`. A refusal wins over any data sent alongside it.
    ///
    /// `()` decodes from `null`, so operations with no payload decode as unit.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Reply<T>, CallFailure> {
        self.decode_with(|value: T| Ok(value))
    }

    /// Decode the payload as a wire record `R`, then map it into `T`.
    pub fn decode_with<R, T>(
        self,
        map: impl FnOnce(R) -> Result<T, RecordError>,
    ) -> Result<Reply<T>, CallFailure>
    where
        R: DeserializeOwned,
    {
        if let Some(error) = self.error {
            return Ok(Err(error));
        }
        let record: R =
            serde_json::from_value(self.data).map_err(|e| CallFailure::Decode(e.to_string()))?;
        map(record)
            .map(Ok)
            .map_err(|e| CallFailure::Decode(e.to_string()))
    }
}

// =============================================================================
// FAILURES
// =============================================================================

/// A call that produced no usable reply.
///
/// The display form is the bare message, which is what ends up in
/// `ApiError::message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFailure {
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Panicked(String),
}

// =============================================================================
// SERVICE TRAIT
// =============================================================================

/// The backend as seen from the client.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Run a named data query.
    async fn perform_query(&self, name: &str, params: Value) -> Result<RawReply, CallFailure>;

    /// Invoke a named remote function.
    async fn perform_remote_call(&self, name: &str, body: Value) -> Result<RawReply, CallFailure>;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use huddle_core::{Profile, ProfileRecord};
    use serde_json::json;

    #[test]
    fn unit_decodes_from_null() {
        let reply = RawReply::ok(Value::Null).decode::<()>();
        assert_eq!(reply, Ok(Ok(())));
    }

    #[test]
    fn refusal_wins_over_data() {
        let reply = RawReply {
            data: json!({"id": "u1"}),
            error: Some(BackendError::new("E", "nope")),
        };
        let decoded = reply.decode::<Value>();
        assert!(matches!(decoded, Ok(Err(e)) if e.message == "nope"));
    }

    #[test]
    fn bad_payload_is_a_decode_failure() {
        let decoded = RawReply::ok(json!("not a list")).decode::<Vec<String>>();
        assert!(matches!(decoded, Err(CallFailure::Decode(_))));
    }

    #[test]
    fn mapping_errors_are_decode_failures() {
        let decoded = RawReply::ok(json!({"display_name": "Ada"}))
            .decode_with(|r: ProfileRecord| Profile::try_from(r));
        assert!(matches!(decoded, Err(CallFailure::Decode(m)) if m.contains("id")));
    }

    #[test]
    fn backend_error_falls_back_to_kind_code() {
        let error = BackendError {
            message: "row level security".to_string(),
            ..BackendError::default()
        }
        .into_api_error("QUERY_ERROR");
        assert_eq!(error.code, "QUERY_ERROR");
        assert_eq!(error.message, "row level security");
    }

    #[test]
    fn backend_error_keeps_its_own_code() {
        let error = BackendError::new("23505", "duplicate key")
            .with_status_code(409)
            .into_api_error("QUERY_ERROR");
        assert_eq!(error.code, "23505");
        assert_eq!(error.status_code, Some(409));
    }
}
