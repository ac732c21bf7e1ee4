//! Declared actions, one closed set per slice.
//!
//! Actions are plain data. Their JSON form is
//! `{"slice": "auth", "action": {"type": "SET_STATUS", "payload": "loading"}}`;
//! a record whose `type` is not in the slice's set decodes to that slice's
//! `Unknown` variant and reduces to a no-op.

use super::SliceStatus;
use crate::envelope::ApiError;
use crate::types::{AuthSession, Product, Profile, ProfilePatch, Subscription, Transaction};
use serde::{Deserialize, Serialize};

/// Any action the store accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slice", content = "action", rename_all = "lowercase")]
pub enum Action {
    Auth(AuthAction),
    Profile(ProfileAction),
    Subscription(SubscriptionAction),
    Ui(UiAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthAction {
    /// Install a session (or none). Completes the cycle.
    SetSession(Option<AuthSession>),
    /// Reset to the initial shape, marked `Success`.
    ClearSession,
    SetStatus(SliceStatus),
    /// Fail the cycle; the session is dropped.
    SetError(ApiError),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileAction {
    Set(Profile),
    Clear,
    SetStatus(SliceStatus),
    SetError(ApiError),
    UpdateField(ProfilePatch),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionAction {
    SetCurrent(Option<Subscription>),
    SetProducts(Vec<Product>),
    SetTransactions(Vec<Transaction>),
    SetStatus(SliceStatus),
    SetError(ApiError),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiAction {
    SetLoading(bool),
    SetGlobalError(Option<ApiError>),
    #[serde(other)]
    Unknown,
}

impl From<AuthAction> for Action {
    fn from(a: AuthAction) -> Self {
        Self::Auth(a)
    }
}

impl From<ProfileAction> for Action {
    fn from(a: ProfileAction) -> Self {
        Self::Profile(a)
    }
}

impl From<SubscriptionAction> for Action {
    fn from(a: SubscriptionAction) -> Self {
        Self::Subscription(a)
    }
}

impl From<UiAction> for Action {
    fn from(a: UiAction) -> Self {
        Self::Ui(a)
    }
}

impl Action {
    /// Short `slice/TYPE` label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth(a) => match a {
                AuthAction::SetSession(_) => "auth/SET_SESSION",
                AuthAction::ClearSession => "auth/CLEAR_SESSION",
                AuthAction::SetStatus(_) => "auth/SET_STATUS",
                AuthAction::SetError(_) => "auth/SET_ERROR",
                AuthAction::Unknown => "auth/UNKNOWN",
            },
            Self::Profile(a) => match a {
                ProfileAction::Set(_) => "profile/SET",
                ProfileAction::Clear => "profile/CLEAR",
                ProfileAction::SetStatus(_) => "profile/SET_STATUS",
                ProfileAction::SetError(_) => "profile/SET_ERROR",
                ProfileAction::UpdateField(_) => "profile/UPDATE_FIELD",
                ProfileAction::Unknown => "profile/UNKNOWN",
            },
            Self::Subscription(a) => match a {
                SubscriptionAction::SetCurrent(_) => "subscription/SET_CURRENT",
                SubscriptionAction::SetProducts(_) => "subscription/SET_PRODUCTS",
                SubscriptionAction::SetTransactions(_) => "subscription/SET_TRANSACTIONS",
                SubscriptionAction::SetStatus(_) => "subscription/SET_STATUS",
                SubscriptionAction::SetError(_) => "subscription/SET_ERROR",
                SubscriptionAction::Unknown => "subscription/UNKNOWN",
            },
            Self::Ui(a) => match a {
                UiAction::SetLoading(_) => "ui/SET_LOADING",
                UiAction::SetGlobalError(_) => "ui/SET_GLOBAL_ERROR",
                UiAction::Unknown => "ui/UNKNOWN",
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn json_form_round_trips_status() {
        let action = Action::Auth(AuthAction::SetStatus(SliceStatus::Loading));
        let json = serde_json::to_value(&action).expect("serialize");
        assert_eq!(json["slice"], "auth");
        assert_eq!(json["action"]["type"], "SET_STATUS");
        assert_eq!(json["action"]["payload"], "loading");
    }

    #[test]
    fn unrecognised_type_decodes_to_unknown() {
        let json = r#"{"slice":"profile","action":{"type":"SET_AVATAR_FRAME"}}"#;
        let action: Action = serde_json::from_str(json).expect("decode");
        assert_eq!(action, Action::Profile(ProfileAction::Unknown));
    }

    #[test]
    fn unit_variant_decodes_without_payload() {
        let json = r#"{"slice":"auth","action":{"type":"CLEAR_SESSION"}}"#;
        let action: Action = serde_json::from_str(json).expect("decode");
        assert_eq!(action.label(), "auth/CLEAR_SESSION");
    }
}
