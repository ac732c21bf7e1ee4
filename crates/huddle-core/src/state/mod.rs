//! # Application State Tree
//!
//! The single UI-observable state snapshot, partitioned into independent
//! slices. A tree is never mutated in place: [`reduce`] computes a fresh
//! tree for every action.
//!
//! Every slice starts `Idle`. `Loading` is transient; `Success` and
//! `Error` end a cycle until the next `Loading`.

mod action;
mod reducer;
pub mod selectors;

pub use action::{Action, AuthAction, ProfileAction, SubscriptionAction, UiAction};
pub use reducer::{reduce, reduce_auth, reduce_profile, reduce_subscription, reduce_ui};

use crate::envelope::ApiError;
use crate::types::{AuthSession, AuthUser, Product, Profile, Subscription, Transaction};
use serde::{Deserialize, Serialize};

// =============================================================================
// SLICE STATUS
// =============================================================================

/// Per-slice status machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SliceStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl SliceStatus {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

// =============================================================================
// SLICES
// =============================================================================

/// Authentication slice.
///
/// `is_authenticated` is derived: it equals `user.is_some() && session.is_some()`
/// after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
    pub status: SliceStatus,
    pub error: Option<ApiError>,
    pub is_authenticated: bool,
}

impl AuthState {
    /// Recompute the derived `is_authenticated` flag.
    #[must_use]
    pub(crate) fn settled(mut self) -> Self {
        self.is_authenticated = self.user.is_some() && self.session.is_some();
        self
    }
}

/// The signed-in member's own profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileState {
    pub profile: Option<Profile>,
    pub status: SliceStatus,
    pub error: Option<ApiError>,
}

/// Subscription, catalogue, and ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubscriptionState {
    pub current: Option<Subscription>,
    pub products: Vec<Product>,
    pub transactions: Vec<Transaction>,
    pub status: SliceStatus,
    pub error: Option<ApiError>,
}

/// Cross-cutting UI flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UiState {
    pub is_loading: bool,
    pub global_error: Option<ApiError>,
}

/// The whole state tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppState {
    pub auth: AuthState,
    pub profile: ProfileState,
    pub subscription: SubscriptionState,
    pub ui: UiState,
}

impl AppState {
    /// The initial tree: every slice `Idle` and empty.
    #[must_use]
    pub fn initial() -> Self {
        Self::default()
    }
}
