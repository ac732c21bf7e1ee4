//! # Call Wrapper
//!
//! Runs a remote call and turns whatever happens into an [`Envelope`]:
//!
//! | Thunk outcome | Envelope |
//! |---------------|----------|
//! | `Ok(Ok(data))` | `success(data)` |
//! | `Ok(Err(backend))` | `failure`, code from the backend or `QUERY_ERROR` / `EDGE_FUNCTION_ERROR` |
//! | `Err(failure)` | `failure`, code `QUERY_EXCEPTION` / `EDGE_FUNCTION_EXCEPTION` |
//! | panic | same as `Err(failure)` |
//!
//! No remote-call failure escapes as a Rust error or unwinds past the wrapper.
//! Every call emits a start event and an end event under the `api` context.

use crate::service::{CallFailure, RemoteService, Reply};
use futures::FutureExt;
use huddle_core::{ApiError, Envelope, RecordError, codes};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Log context of call events.
pub const LOG_CONTEXT: &str = "api";

/// Which kind of remote operation a call is. Selects the default error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    RemoteFunction,
}

impl OperationKind {
    /// Code of an in-band refusal that carried no code of its own.
    pub fn error_code(self) -> &'static str {
        match self {
            Self::Query => codes::QUERY_ERROR,
            Self::RemoteFunction => codes::EDGE_FUNCTION_ERROR,
        }
    }

    /// Code of a call that failed to produce a reply.
    pub fn exception_code(self) -> &'static str {
        match self {
            Self::Query => codes::QUERY_EXCEPTION,
            Self::RemoteFunction => codes::EDGE_FUNCTION_EXCEPTION,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::RemoteFunction => "remote_function",
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "remote call panicked".to_string()
    }
}

// =============================================================================
// SERVICE-BOUND WRAPPER
// =============================================================================

/// Runs calls against a [`RemoteService`] and wraps their outcomes.
#[derive(Clone)]
pub struct CallWrapper {
    service: Arc<dyn RemoteService>,
}

impl CallWrapper {
    pub fn new(service: Arc<dyn RemoteService>) -> Self {
        Self { service }
    }

    /// Run `thunk` and convert its outcome into an envelope.
    pub async fn invoke<T, F>(&self, kind: OperationKind, operation: &str, thunk: F) -> Envelope<T>
    where
        F: Future<Output = Result<Reply<T>, CallFailure>>,
    {
        let started = Instant::now();
        tracing::debug!(
            context = LOG_CONTEXT,
            operation,
            kind = kind.label(),
            "call started"
        );

        let outcome = match AssertUnwindSafe(thunk).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => Err(CallFailure::Panicked(panic_message(payload.as_ref()))),
        };

        let envelope = match outcome {
            Ok(Ok(data)) => Envelope::success(data),
            Ok(Err(refusal)) => Envelope::failure(refusal.into_api_error(kind.error_code())),
            Err(failure) => Envelope::failure(ApiError::new(
                kind.exception_code(),
                failure.to_string(),
            )),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match envelope.error() {
            None => tracing::debug!(
                context = LOG_CONTEXT,
                operation,
                duration_ms,
                "call completed"
            ),
            Some(error) => tracing::warn!(
                context = LOG_CONTEXT,
                operation,
                duration_ms,
                error_code = %error.code,
                error = %error.message,
                "call failed"
            ),
        }

        envelope
    }

    /// Run a query and decode its payload as `T`.
    pub async fn query<T: DeserializeOwned>(&self, operation: &str, params: Value) -> Envelope<T> {
        self.query_mapped(operation, params, |value: T| Ok(value))
            .await
    }

    /// Run a query, decode its payload as the wire record `R`, and map it into `T`.
    pub async fn query_mapped<R, T>(
        &self,
        operation: &str,
        params: Value,
        map: impl FnOnce(R) -> Result<T, RecordError>,
    ) -> Envelope<T>
    where
        R: DeserializeOwned,
    {
        self.invoke(OperationKind::Query, operation, async {
            self.service
                .perform_query(operation, params)
                .await?
                .decode_with(map)
        })
        .await
    }

    /// Invoke a remote function and decode its payload as `T`.
    pub async fn remote_call<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: Value,
    ) -> Envelope<T> {
        self.invoke(OperationKind::RemoteFunction, operation, async {
            self.service
                .perform_remote_call(operation, body)
                .await?
                .decode::<T>()
        })
        .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
