//! # huddle
//!
//! The async half of the Huddle client state core.
//!
//! ```text
//! AppClient ──► CallWrapper ──► RemoteService
//!     │              │
//!     │              └─► ProfileResolver ──► RelationshipLookup
//!     ▼
//!   Store (watch) ──► reduce (huddle-core) ──► subscribers
//! ```
//!
//! ## Contents
//!
//! - `service` → the backend seam and the in-memory fixture backend
//! - `wrapper` → every remote call becomes an `Envelope`
//! - `resolver` → privacy-gated profile reads
//! - `store` → the single holder of `AppState`
//! - `client` → orchestration flows with stale-response guards
//! - `config` / `error` → binary configuration and errors

pub mod client;
pub mod config;
pub mod error;
pub mod resolver;
pub mod service;
pub mod store;
pub mod wrapper;

pub use client::{AppClient, LoadOutcome, SignUpOutcome};
pub use config::{HuddleConfig, LogFormat};
pub use error::{ConfigError, HuddleError};
pub use resolver::{FriendshipLookup, LookupError, ProfileResolver, RelationshipLookup};
pub use service::{
    BackendError, CallFailure, Fixture, MemoryService, RawReply, RemoteService, Reply,
};
pub use store::Store;
pub use wrapper::{CallWrapper, OperationKind};
