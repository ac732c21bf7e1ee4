//! # Reducers
//!
//! `reduce(state, action) -> state`, pure and total.
//!
//! The root reducer hands every action to every slice reducer. A slice
//! reducer returns its input unchanged for actions addressed to another
//! slice and for its own `Unknown` variant.

use super::{
    Action, AppState, AuthAction, AuthState, ProfileAction, ProfileState, SliceStatus,
    SubscriptionAction, SubscriptionState, UiAction, UiState,
};

/// Compute the next state tree.
#[must_use]
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    AppState {
        auth: reduce_auth(&state.auth, action),
        profile: reduce_profile(&state.profile, action),
        subscription: reduce_subscription(&state.subscription, action),
        ui: reduce_ui(&state.ui, action),
    }
}

#[must_use]
pub fn reduce_auth(state: &AuthState, action: &Action) -> AuthState {
    let Action::Auth(action) = action else {
        return state.clone();
    };

    let next = match action {
        AuthAction::SetSession(session) => AuthState {
            user: session.as_ref().map(|s| s.user.clone()),
            session: session.clone(),
            status: SliceStatus::Success,
            error: None,
            is_authenticated: false,
        },
        AuthAction::ClearSession => AuthState {
            status: SliceStatus::Success,
            ..AuthState::default()
        },
        AuthAction::SetStatus(status) => AuthState {
            status: *status,
            error: cleared_on_loading(*status, &state.error),
            ..state.clone()
        },
        AuthAction::SetError(error) => AuthState {
            user: None,
            session: None,
            status: SliceStatus::Error,
            error: Some(error.clone()),
            is_authenticated: false,
        },
        AuthAction::Unknown => state.clone(),
    };

    next.settled()
}

#[must_use]
pub fn reduce_profile(state: &ProfileState, action: &Action) -> ProfileState {
    let Action::Profile(action) = action else {
        return state.clone();
    };

    match action {
        ProfileAction::Set(profile) => ProfileState {
            profile: Some(profile.clone()),
            status: SliceStatus::Success,
            error: None,
        },
        ProfileAction::Clear => ProfileState {
            status: SliceStatus::Success,
            ..ProfileState::default()
        },
        ProfileAction::SetStatus(status) => ProfileState {
            status: *status,
            error: cleared_on_loading(*status, &state.error),
            ..state.clone()
        },
        ProfileAction::SetError(error) => ProfileState {
            status: SliceStatus::Error,
            error: Some(error.clone()),
            ..state.clone()
        },
        ProfileAction::UpdateField(patch) => ProfileState {
            profile: state.profile.as_ref().map(|p| p.patched(patch)),
            ..state.clone()
        },
        ProfileAction::Unknown => state.clone(),
    }
}

#[must_use]
pub fn reduce_subscription(state: &SubscriptionState, action: &Action) -> SubscriptionState {
    let Action::Subscription(action) = action else {
        return state.clone();
    };

    match action {
        SubscriptionAction::SetCurrent(current) => SubscriptionState {
            current: current.clone(),
            status: SliceStatus::Success,
            error: None,
            ..state.clone()
        },
        SubscriptionAction::SetProducts(products) => SubscriptionState {
            products: products.clone(),
            status: SliceStatus::Success,
            error: None,
            ..state.clone()
        },
        SubscriptionAction::SetTransactions(transactions) => SubscriptionState {
            transactions: transactions.clone(),
            status: SliceStatus::Success,
            error: None,
            ..state.clone()
        },
        SubscriptionAction::SetStatus(status) => SubscriptionState {
            status: *status,
            error: cleared_on_loading(*status, &state.error),
            ..state.clone()
        },
        SubscriptionAction::SetError(error) => SubscriptionState {
            status: SliceStatus::Error,
            error: Some(error.clone()),
            ..state.clone()
        },
        SubscriptionAction::Unknown => state.clone(),
    }
}

#[must_use]
pub fn reduce_ui(state: &UiState, action: &Action) -> UiState {
    let Action::Ui(action) = action else {
        return state.clone();
    };

    match action {
        UiAction::SetLoading(is_loading) => UiState {
            is_loading: *is_loading,
            ..state.clone()
        },
        UiAction::SetGlobalError(error) => UiState {
            global_error: error.clone(),
            ..state.clone()
        },
        UiAction::Unknown => state.clone(),
    }
}

/// A new `Loading` cycle starts without the previous cycle's error.
fn cleared_on_loading<E: Clone>(status: SliceStatus, error: &Option<E>) -> Option<E> {
    if status == SliceStatus::Loading {
        None
    } else {
        error.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ApiError;
    use crate::privacy::Visibility;
    use crate::types::{
        AuthSession, AuthUser, MembershipTier, Profile, ProfilePatch, Subscription,
        SubscriptionStatus, UserId,
    };

    fn session(id: &str) -> AuthSession {
        AuthSession {
            access_token: format!("token-{id}"),
            refresh_token: None,
            expires_at: None,
            user: AuthUser {
                id: UserId::new(id),
                email: Some(format!("{id}@x.com")),
                created_at: None,
            },
        }
    }

    fn profile(id: &str) -> Profile {
        Profile {
            id: UserId::new(id),
            display_name: id.to_uppercase(),
            membership_tier: MembershipTier::Bronze,
            avatar_url: None,
            points_balance: 10,
            lifetime_points: 10,
            neighborhood: None,
            city: None,
            bio: None,
            social_handle: None,
            created_at: None,
            visibility: Visibility::Friends,
        }
    }

    fn run(actions: Vec<Action>) -> AppState {
        actions
            .into_iter()
            .fold(AppState::initial(), |state, action| reduce(&state, &action))
    }

    #[test]
    fn initial_state_is_idle_everywhere() {
        let state = AppState::initial();
        assert_eq!(state.auth.status, SliceStatus::Idle);
        assert_eq!(state.profile.status, SliceStatus::Idle);
        assert_eq!(state.subscription.status, SliceStatus::Idle);
        assert!(!state.auth.is_authenticated);
        assert!(!state.ui.is_loading);
    }

    #[test]
    fn sign_in_cycle_reaches_success() {
        let state = run(vec![
            AuthAction::SetStatus(SliceStatus::Loading).into(),
            AuthAction::SetSession(Some(session("u1"))).into(),
        ]);
        assert_eq!(state.auth.status, SliceStatus::Success);
        assert!(state.auth.is_authenticated);
        assert_eq!(
            state.auth.user.as_ref().map(|u| u.id.as_str()),
            Some("u1")
        );
    }

    #[test]
    fn auth_error_drops_session() {
        let state = run(vec![
            AuthAction::SetSession(Some(session("u1"))).into(),
            AuthAction::SetStatus(SliceStatus::Loading).into(),
            AuthAction::SetError(ApiError::new("invalid_credentials", "bad password")).into(),
        ]);
        assert_eq!(state.auth.status, SliceStatus::Error);
        assert!(state.auth.session.is_none());
        assert!(!state.auth.is_authenticated);
        assert!(state.auth.error.is_some());
    }

    #[test]
    fn loading_clears_previous_error() {
        let state = run(vec![
            AuthAction::SetError(ApiError::new("x", "y")).into(),
            AuthAction::SetStatus(SliceStatus::Loading).into(),
        ]);
        assert_eq!(state.auth.status, SliceStatus::Loading);
        assert!(state.auth.error.is_none());
    }

    #[test]
    fn clear_session_is_a_completed_operation() {
        let state = run(vec![
            AuthAction::SetSession(Some(session("u1"))).into(),
            AuthAction::ClearSession.into(),
        ]);
        assert_eq!(state.auth.status, SliceStatus::Success);
        assert!(state.auth.user.is_none());
        assert!(!state.auth.is_authenticated);
    }

    #[test]
    fn clear_session_twice_equals_once() {
        let once = run(vec![
            AuthAction::SetSession(Some(session("u1"))).into(),
            AuthAction::ClearSession.into(),
        ]);
        let twice = reduce(&once, &AuthAction::ClearSession.into());
        assert_eq!(once, twice);
    }

    #[test]
    fn slice_actions_do_not_touch_other_slices() {
        let signed_in = run(vec![AuthAction::SetSession(Some(session("u1"))).into()]);
        let next = reduce(&signed_in, &ProfileAction::Set(profile("u1")).into());
        assert_eq!(next.auth, signed_in.auth);
        assert_eq!(next.subscription, signed_in.subscription);
        assert_eq!(next.ui, signed_in.ui);
    }

    #[test]
    fn unknown_actions_are_no_ops() {
        let state = run(vec![AuthAction::SetSession(Some(session("u1"))).into()]);
        for action in [
            Action::Auth(AuthAction::Unknown),
            Action::Profile(ProfileAction::Unknown),
            Action::Subscription(SubscriptionAction::Unknown),
            Action::Ui(UiAction::Unknown),
        ] {
            assert_eq!(reduce(&state, &action), state, "{}", action.label());
        }
    }

    #[test]
    fn update_field_without_profile_is_no_op() {
        let state = AppState::initial();
        let next = reduce(
            &state,
            &ProfileAction::UpdateField(ProfilePatch::Bio(Some("hi".to_string()))).into(),
        );
        assert_eq!(next, state);
    }

    #[test]
    fn update_field_patches_loaded_profile() {
        let state = run(vec![
            ProfileAction::Set(profile("u1")).into(),
            ProfileAction::UpdateField(ProfilePatch::Visibility(Visibility::Nobody)).into(),
        ]);
        assert_eq!(
            state.profile.profile.map(|p| p.visibility),
            Some(Visibility::Nobody)
        );
    }

    #[test]
    fn profile_error_keeps_last_profile() {
        let state = run(vec![
            ProfileAction::Set(profile("u1")).into(),
            ProfileAction::SetStatus(SliceStatus::Loading).into(),
            ProfileAction::SetError(ApiError::new("QUERY_EXCEPTION", "offline")).into(),
        ]);
        assert_eq!(state.profile.status, SliceStatus::Error);
        assert!(state.profile.profile.is_some());
    }

    #[test]
    fn set_current_none_completes_subscription_cycle() {
        let sub = Subscription {
            id: "s1".to_string(),
            user_id: UserId::new("u1"),
            product_id: "monthly".to_string(),
            status: SubscriptionStatus::Active,
            current_period_end: None,
            cancel_at_period_end: false,
        };
        let state = run(vec![
            SubscriptionAction::SetCurrent(Some(sub)).into(),
            SubscriptionAction::SetCurrent(None).into(),
        ]);
        assert!(state.subscription.current.is_none());
        assert_eq!(state.subscription.status, SliceStatus::Success);
    }

    #[test]
    fn ui_flags() {
        let state = run(vec![
            UiAction::SetLoading(true).into(),
            UiAction::SetGlobalError(Some(ApiError::new("X", "offline"))).into(),
        ]);
        assert!(state.ui.is_loading);
        assert_eq!(
            state.ui.global_error.map(|e| e.message),
            Some("offline".to_string())
        );
    }
}
