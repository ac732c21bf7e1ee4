//! # Response Envelope
//!
//! The uniform result of every remote operation.
//!
//! An [`Envelope`] is built through one of four constructors, one per
//! [`EnvelopeStatus`]. There is no way to build an envelope that carries
//! both data and an error, or a success without data.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Machine codes produced by the client itself.
///
/// Backend-supplied codes pass through unchanged; these fill in when the
/// backend supplied none, or when the failure never reached the backend.
pub mod codes {
    /// A query reported an error without a code.
    pub const QUERY_ERROR: &str = "QUERY_ERROR";
    /// A remote function reported an error without a code.
    pub const EDGE_FUNCTION_ERROR: &str = "EDGE_FUNCTION_ERROR";
    /// A query failed before producing a reply.
    pub const QUERY_EXCEPTION: &str = "QUERY_EXCEPTION";
    /// A remote function failed before producing a reply.
    pub const EDGE_FUNCTION_EXCEPTION: &str = "EDGE_FUNCTION_EXCEPTION";
    /// The requested subject or record does not exist.
    pub const NOT_FOUND: &str = "NOT_FOUND";
    /// The viewer/subject relationship could not be determined.
    pub const RELATIONSHIP_LOOKUP_FAILED: &str = "RELATIONSHIP_LOOKUP_FAILED";
    /// The operation needs an authenticated member.
    pub const NOT_AUTHENTICATED: &str = "NOT_AUTHENTICATED";
    /// A sign-in succeeded without returning a session.
    pub const SESSION_MISSING: &str = "SESSION_MISSING";
    /// An auth reply arrived after the session had already changed.
    pub const CANCELLED: &str = "CANCELLED";
}

// =============================================================================
// ERROR
// =============================================================================

/// Category of an [`ApiError`].
///
/// Privacy-based withholding is not a kind: it is a successful, reduced result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend explicitly reported a failure.
    Remote,
    /// The call never produced a reply (network, decode, panic).
    Transport,
    /// The subject or record does not exist.
    NotFound,
    /// The relationship lookup failed; extended fields were withheld.
    LookupFailure,
}

/// Error carried by envelopes and stored in slice state.
///
/// `code` is for branching (localised messages); `message` is the fallback
/// text and log detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl ApiError {
    /// Create an error with a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            status_code: None,
        }
    }

    /// Attach an HTTP-like status code.
    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// A `NOT_FOUND` error for the named entity.
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(codes::NOT_FOUND, format!("{what} not found")).with_status_code(404)
    }

    /// A `NOT_AUTHENTICATED` error.
    pub fn not_authenticated() -> Self {
        Self::new(codes::NOT_AUTHENTICATED, "no authenticated member").with_status_code(401)
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self.code.as_str() {
            codes::QUERY_EXCEPTION | codes::EDGE_FUNCTION_EXCEPTION => ErrorKind::Transport,
            codes::NOT_FOUND => ErrorKind::NotFound,
            codes::RELATIONSHIP_LOOKUP_FAILED => ErrorKind::LookupFailure,
            _ => ErrorKind::Remote,
        }
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Lifecycle position of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Uniform `{ data, error, status }` result of a remote operation.
///
/// Exactly one of `data`/`error` is present for `Success`/`Error`;
/// neither is present for `Idle`/`Loading`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    data: Option<T>,
    error: Option<ApiError>,
    status: EnvelopeStatus,
}

impl<T> Envelope<T> {
    /// An envelope for an operation that has not started.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            status: EnvelopeStatus::Idle,
        }
    }

    /// An envelope for an operation in flight.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            data: None,
            error: None,
            status: EnvelopeStatus::Loading,
        }
    }

    /// A successful result.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: EnvelopeStatus::Success,
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failure(error: ApiError) -> Self {
        Self {
            data: None,
            error: Some(error),
            status: EnvelopeStatus::Error,
        }
    }

    #[must_use]
    pub fn status(&self) -> EnvelopeStatus {
        self.status
    }

    #[must_use]
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }

    /// Convert into a `Result`.
    ///
    /// `Idle` and `Loading` envelopes are not results yet and have no
    /// meaningful conversion; they map to an error with code `"PENDING"`.
    pub fn into_result(self) -> Result<T, ApiError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok(data),
            (_, Some(error)) => Err(error),
            (None, None) => Err(ApiError::new(
                "PENDING",
                format!("envelope is {:?}", self.status),
            )),
        }
    }
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> From<Result<T, ApiError>> for Envelope<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(error),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
