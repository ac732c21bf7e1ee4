//! # huddle-core
//!
//! The pure client-side state core for Huddle - THE STATE CORE.
//!
//! Huddle members join events, earn points, redeem coupons, and view each
//! other's profiles. Everything the UI observes flows through this crate:
//!
//! ```text
//! UI event → orchestration → remote call → Envelope → Action → reduce → AppState → selectors
//! ```
//!
//! ## Contents
//!
//! - `types` → domain records and the total mapping from remote rows
//! - `envelope` → uniform `{ data, error, status }` results and the error taxonomy
//! - `privacy` → the privacy-gated disclosure table
//! - `state` → slices, actions, reducers, selectors
//!
//! ## Architectural Constraints
//!
//! - No async, no I/O, no logging: orchestration lives in the `huddle` app crate
//! - Reducers and the disclosure table are pure and total
//! - State changes only through declared [`Action`]s

// =============================================================================
// MODULES
// =============================================================================

pub mod envelope;
pub mod privacy;
pub mod state;
pub mod types;

// =============================================================================
// RE-EXPORTS: Types
// =============================================================================

pub use types::records::{
    AuthReplyRecord, AuthUserRecord, ProductRecord, ProfileRecord, RecordError, SessionRecord,
    SubscriptionRecord, TransactionRecord,
};
pub use types::{
    AuthReply, AuthSession, AuthUser, BillingInterval, MembershipTier, Product, Profile, ProfilePatch,
    Subscription, SubscriptionStatus, Transaction, TransactionKind, UserId,
};

// =============================================================================
// RE-EXPORTS: Envelope & Privacy
// =============================================================================

pub use envelope::{ApiError, Envelope, EnvelopeStatus, ErrorKind, codes};
pub use privacy::{
    Disclosure, ExtendedProfile, ProfileCard, PublicProfile, Relationship, Visibility,
    disclosure, resolve,
};

// =============================================================================
// RE-EXPORTS: State
// =============================================================================

pub use state::{
    Action, AppState, AuthAction, AuthState, ProfileAction, ProfileState, SliceStatus,
    SubscriptionAction, SubscriptionState, UiAction, UiState, reduce,
};
