//! # Core Type Definitions
//!
//! Client-side domain types for the Huddle state core:
//! - Identity (`UserId`, `AuthUser`, `AuthSession`)
//! - Member profile (`Profile`, `MembershipTier`, `ProfilePatch`)
//! - Subscription catalogue (`Subscription`, `Product`, `Transaction`)
//!
//! These are the camelCase-free, fully typed client shapes. Remote rows are
//! mapped into them by the `records` submodule; nothing else constructs them
//! from untyped data.

pub mod records;

use crate::privacy::Visibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a community member, as issued by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a new user id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// The authenticated account, as reported by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A live auth session. Always carries the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

/// Outcome of a sign-up or sign-in.
///
/// `session` is `None` when the backend still awaits email confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthReply {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
}

// =============================================================================
// PROFILE
// =============================================================================

/// Loyalty tier of a member.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl MembershipTier {
    /// Parse a backend tier name. Case-insensitive.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "platinum" => Some(Self::Platinum),
            _ => None,
        }
    }

    /// Backend name of the tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

/// A member's full profile record.
///
/// The first four fields form the public card and are never gated.
/// Everything after `avatar_url` is an extended field and is subject to
/// the owner's [`Visibility`] policy when someone else views it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub display_name: String,
    pub membership_tier: MembershipTier,
    pub avatar_url: Option<String>,

    pub points_balance: i64,
    pub lifetime_points: i64,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub social_handle: Option<String>,
    pub created_at: Option<DateTime<Utc>>,

    pub visibility: Visibility,
}

impl Profile {
    /// Return a copy of this profile with `patch` applied.
    #[must_use]
    pub fn patched(&self, patch: &ProfilePatch) -> Self {
        let mut next = self.clone();
        match patch {
            ProfilePatch::DisplayName(v) => next.display_name = v.clone(),
            ProfilePatch::AvatarUrl(v) => next.avatar_url = v.clone(),
            ProfilePatch::Neighborhood(v) => next.neighborhood = v.clone(),
            ProfilePatch::City(v) => next.city = v.clone(),
            ProfilePatch::Bio(v) => next.bio = v.clone(),
            ProfilePatch::SocialHandle(v) => next.social_handle = v.clone(),
            ProfilePatch::Visibility(v) => next.visibility = *v,
        }
        next
    }
}

/// A single member-editable profile field and its new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ProfilePatch {
    DisplayName(String),
    AvatarUrl(Option<String>),
    Neighborhood(Option<String>),
    City(Option<String>),
    Bio(Option<String>),
    SocialHandle(Option<String>),
    Visibility(Visibility),
}

impl ProfilePatch {
    /// Backend column the patch writes to.
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            Self::DisplayName(_) => "display_name",
            Self::AvatarUrl(_) => "avatar_url",
            Self::Neighborhood(_) => "neighborhood",
            Self::City(_) => "city",
            Self::Bio(_) => "bio",
            Self::SocialHandle(_) => "social_handle",
            Self::Visibility(_) => "profile_visibility",
        }
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Billing state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Expired,
    Incomplete,
}

impl SubscriptionStatus {
    /// Parse a backend status name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "trialing" => Some(Self::Trialing),
            "past_due" => Some(Self::PastDue),
            "canceled" | "cancelled" => Some(Self::Canceled),
            "expired" => Some(Self::Expired),
            "incomplete" => Some(Self::Incomplete),
            _ => None,
        }
    }

    /// Whether a subscription in this state grants member benefits.
    #[must_use]
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

/// The member's current subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: UserId,
    pub product_id: String,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

/// Billing period of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    #[default]
    Month,
    Year,
}

/// A purchasable membership product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Price in minor currency units.
    pub price_cents: i64,
    pub currency: String,
    pub interval: BillingInterval,
}

/// Kind of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Renewal,
    Refund,
    PointsEarned,
    PointsRedeemed,
}

impl TransactionKind {
    /// Parse a backend transaction kind.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "purchase" => Some(Self::Purchase),
            "renewal" => Some(Self::Renewal),
            "refund" => Some(Self::Refund),
            "points_earned" => Some(Self::PointsEarned),
            "points_redeemed" => Some(Self::PointsRedeemed),
            _ => None,
        }
    }
}

/// A billing or points ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount_cents: i64,
    pub points: i64,
    pub currency: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> Profile {
        Profile {
            id: UserId::new("u1"),
            display_name: "Ada".to_string(),
            membership_tier: MembershipTier::Gold,
            avatar_url: None,
            points_balance: 120,
            lifetime_points: 900,
            neighborhood: Some("Riverside".to_string()),
            city: Some("Lisbon".to_string()),
            bio: None,
            social_handle: None,
            created_at: None,
            visibility: Visibility::Friends,
        }
    }

    #[test]
    fn tier_parse_is_case_insensitive() {
        assert_eq!(MembershipTier::parse("GOLD"), Some(MembershipTier::Gold));
        assert_eq!(MembershipTier::parse(" silver "), Some(MembershipTier::Silver));
        assert_eq!(MembershipTier::parse("diamond"), None);
    }

    #[test]
    fn patched_changes_only_the_named_field() {
        let profile = sample_profile();
        let next = profile.patched(&ProfilePatch::City(Some("Porto".to_string())));

        assert_eq!(next.city.as_deref(), Some("Porto"));
        assert_eq!(next.neighborhood, profile.neighborhood);
        assert_eq!(next.points_balance, profile.points_balance);
        // original untouched
        assert_eq!(profile.city.as_deref(), Some("Lisbon"));
    }

    #[test]
    fn subscription_access_states() {
        assert!(SubscriptionStatus::Active.grants_access());
        assert!(SubscriptionStatus::Trialing.grants_access());
        assert!(!SubscriptionStatus::PastDue.grants_access());
        assert!(!SubscriptionStatus::Canceled.grants_access());
    }

    #[test]
    fn status_accepts_british_spelling() {
        assert_eq!(
            SubscriptionStatus::parse("cancelled"),
            Some(SubscriptionStatus::Canceled)
        );
    }
}
