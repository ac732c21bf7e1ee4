//! Read projections over the state tree.
//!
//! Selectors borrow from the tree and never allocate beyond what they
//! return, so they are cheap enough to run on every render.

use super::{AppState, SliceStatus};
use crate::envelope::ApiError;
use crate::types::{AuthUser, MembershipTier, Product, Profile, Transaction};

#[must_use]
pub fn select_is_authenticated(state: &AppState) -> bool {
    state.auth.is_authenticated
}

#[must_use]
pub fn select_current_user(state: &AppState) -> Option<&AuthUser> {
    state.auth.user.as_ref()
}

#[must_use]
pub fn select_auth_status(state: &AppState) -> SliceStatus {
    state.auth.status
}

#[must_use]
pub fn select_auth_error(state: &AppState) -> Option<&ApiError> {
    state.auth.error.as_ref()
}

#[must_use]
pub fn select_profile(state: &AppState) -> Option<&Profile> {
    state.profile.profile.as_ref()
}

#[must_use]
pub fn select_profile_status(state: &AppState) -> SliceStatus {
    state.profile.status
}

/// Spendable points of the signed-in member, `0` before a profile loads.
#[must_use]
pub fn select_points_balance(state: &AppState) -> i64 {
    state.profile.profile.as_ref().map_or(0, |p| p.points_balance)
}

#[must_use]
pub fn select_membership_tier(state: &AppState) -> Option<MembershipTier> {
    state.profile.profile.as_ref().map(|p| p.membership_tier)
}

/// A current subscription that is `active` or `trialing`.
#[must_use]
pub fn select_has_active_subscription(state: &AppState) -> bool {
    state
        .subscription
        .current
        .as_ref()
        .is_some_and(|s| s.status.grants_access())
}

#[must_use]
pub fn select_products(state: &AppState) -> &[Product] {
    &state.subscription.products
}

#[must_use]
pub fn select_transactions(state: &AppState) -> &[Transaction] {
    &state.subscription.transactions
}

/// The UI flag is set, or any slice is mid-cycle.
#[must_use]
pub fn select_is_loading(state: &AppState) -> bool {
    state.ui.is_loading
        || [
            state.auth.status,
            state.profile.status,
            state.subscription.status,
        ]
        .iter()
        .any(SliceStatus::is_loading)
}

#[must_use]
pub fn select_global_error(state: &AppState) -> Option<&ApiError> {
    state.ui.global_error.as_ref()
}

/// The most relevant error to show: global first, then auth, profile, subscription.
#[must_use]
pub fn select_current_error(state: &AppState) -> Option<&ApiError> {
    state
        .ui
        .global_error
        .as_ref()
        .or(state.auth.error.as_ref())
        .or(state.profile.error.as_ref())
        .or(state.subscription.error.as_ref())
}
