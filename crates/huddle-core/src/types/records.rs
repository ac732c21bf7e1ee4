//! # Remote Records
//!
//! Wire shapes of the rows the hosted backend returns, and the total
//! mapping from each of them into a client type.
//!
//! Every wire field is optional so that a sparse or partially migrated row
//! still decodes. The `TryFrom` conversions then decide, field by field,
//! what a missing or null value becomes:
//!
//! | Field | Missing / null | Unrecognised |
//! |-------|----------------|--------------|
//! | any `id` | `MissingField` | - |
//! | `display_name` | `""` | - |
//! | `membership_tier` | `bronze` | `bronze` |
//! | `profile_visibility` | `friends` | `nobody` |
//! | points / cents | `0` | - |
//! | optional text | `None` | - |
//! | timestamps | `None` | `InvalidTimestamp` |
//! | subscription `status` | `incomplete` | `incomplete` |
//! | transaction `kind` | `MissingField` | `InvalidValue` |
//! | `currency` | `"usd"` | - |

use super::{
    AuthReply, AuthSession, AuthUser, BillingInterval, MembershipTier, Product, Profile, Subscription,
    SubscriptionStatus, Transaction, TransactionKind, UserId,
};
use crate::privacy::Visibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CURRENCY: &str = "usd";

/// A remote row could not be mapped into its client type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// A field without a documented default was absent.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A timestamp field was present but not RFC 3339.
    #[error("invalid timestamp in `{field}`: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    /// An enumerated field held a value with no client counterpart.
    #[error("invalid value in `{field}`: {value}")]
    InvalidValue { field: &'static str, value: String },
}

fn require(value: Option<String>, field: &'static str) -> Result<String, RecordError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(RecordError::MissingField(field))
}

fn timestamp(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>, RecordError> {
    match value {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|_| RecordError::InvalidTimestamp { field, value: raw }),
    }
}

// =============================================================================
// AUTH
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthUserRecord {
    pub id: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
}

impl TryFrom<AuthUserRecord> for AuthUser {
    type Error = RecordError;

    fn try_from(r: AuthUserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId(require(r.id, "id")?),
            email: r.email,
            created_at: timestamp(r.created_at, "created_at")?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: Option<i64>,
    pub user: Option<AuthUserRecord>,
}

impl TryFrom<SessionRecord> for AuthSession {
    type Error = RecordError;

    fn try_from(r: SessionRecord) -> Result<Self, Self::Error> {
        let user = r.user.ok_or(RecordError::MissingField("user"))?;
        let expires_at = match r.expires_at {
            None => None,
            Some(secs) => Some(DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
                RecordError::InvalidTimestamp {
                    field: "expires_at",
                    value: secs.to_string(),
                }
            })?),
        };
        Ok(Self {
            access_token: require(r.access_token, "access_token")?,
            refresh_token: r.refresh_token,
            expires_at,
            user: AuthUser::try_from(user)?,
        })
    }
}

/// Reply of the sign-up and sign-in operations.
///
/// A sign-up that still awaits email confirmation has a user but no session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthReplyRecord {
    pub user: Option<AuthUserRecord>,
    pub session: Option<SessionRecord>,
}

impl TryFrom<AuthReplyRecord> for AuthReply {
    type Error = RecordError;

    /// The session's user stands in when the reply has no top-level user.
    fn try_from(r: AuthReplyRecord) -> Result<Self, Self::Error> {
        let session = r.session.map(AuthSession::try_from).transpose()?;
        let user = match r.user {
            Some(user) => Some(AuthUser::try_from(user)?),
            None => session.as_ref().map(|s| s.user.clone()),
        };
        Ok(Self { user, session })
    }
}

// =============================================================================
// PROFILE
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRecord {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub membership_tier: Option<String>,
    pub avatar_url: Option<String>,
    pub points_balance: Option<i64>,
    pub lifetime_points: Option<i64>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub social_handle: Option<String>,
    pub created_at: Option<String>,
    pub profile_visibility: Option<String>,
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = RecordError;

    fn try_from(r: ProfileRecord) -> Result<Self, Self::Error> {
        let visibility = match r.profile_visibility.as_deref() {
            None => Visibility::Friends,
            Some(raw) => Visibility::parse(raw).unwrap_or(Visibility::Nobody),
        };
        Ok(Self {
            id: UserId(require(r.id, "id")?),
            display_name: r.display_name.unwrap_or_default(),
            membership_tier: r
                .membership_tier
                .as_deref()
                .and_then(MembershipTier::parse)
                .unwrap_or_default(),
            avatar_url: r.avatar_url,
            points_balance: r.points_balance.unwrap_or(0),
            lifetime_points: r.lifetime_points.unwrap_or(0),
            neighborhood: r.neighborhood,
            city: r.city,
            bio: r.bio,
            social_handle: r.social_handle,
            created_at: timestamp(r.created_at, "created_at")?,
            visibility,
        })
    }
}

// =============================================================================
// SUBSCRIPTION CATALOGUE
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionRecord {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub product_id: Option<String>,
    pub status: Option<String>,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: Option<bool>,
}

impl TryFrom<SubscriptionRecord> for Subscription {
    type Error = RecordError;

    fn try_from(r: SubscriptionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: require(r.id, "id")?,
            user_id: UserId(require(r.user_id, "user_id")?),
            product_id: require(r.product_id, "product_id")?,
            status: r
                .status
                .as_deref()
                .and_then(SubscriptionStatus::parse)
                .unwrap_or(SubscriptionStatus::Incomplete),
            current_period_end: timestamp(r.current_period_end, "current_period_end")?,
            cancel_at_period_end: r.cancel_at_period_end.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
    pub interval: Option<String>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = RecordError;

    fn try_from(r: ProductRecord) -> Result<Self, Self::Error> {
        let interval = match r.interval.as_deref() {
            None | Some("month") => BillingInterval::Month,
            Some("year") => BillingInterval::Year,
            Some(other) => {
                return Err(RecordError::InvalidValue {
                    field: "interval",
                    value: other.to_string(),
                });
            }
        };
        Ok(Self {
            id: require(r.id, "id")?,
            name: r.name.unwrap_or_default(),
            description: r.description,
            price_cents: r.price_cents.unwrap_or(0),
            currency: r.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            interval,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionRecord {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub kind: Option<String>,
    pub amount_cents: Option<i64>,
    pub points: Option<i64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = RecordError;

    fn try_from(r: TransactionRecord) -> Result<Self, Self::Error> {
        let raw_kind = r.kind.ok_or(RecordError::MissingField("kind"))?;
        let kind = TransactionKind::parse(&raw_kind).ok_or(RecordError::InvalidValue {
            field: "kind",
            value: raw_kind,
        })?;
        Ok(Self {
            id: require(r.id, "id")?,
            user_id: UserId(require(r.user_id, "user_id")?),
            kind,
            amount_cents: r.amount_cents.unwrap_or(0),
            points: r.points.unwrap_or(0),
            currency: r.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            description: r.description,
            created_at: timestamp(r.created_at, "created_at")?,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn sparse_profile_takes_documented_defaults() {
        let record = ProfileRecord {
            id: Some("u7".to_string()),
            ..ProfileRecord::default()
        };
        let profile = Profile::try_from(record).expect("map");

        assert_eq!(profile.display_name, "");
        assert_eq!(profile.membership_tier, MembershipTier::Bronze);
        assert_eq!(profile.visibility, Visibility::Friends);
        assert_eq!(profile.points_balance, 0);
        assert!(profile.created_at.is_none());
    }

    #[test]
    fn unrecognised_visibility_fails_closed() {
        let record = ProfileRecord {
            id: Some("u7".to_string()),
            profile_visibility: Some("followers".to_string()),
            ..ProfileRecord::default()
        };
        let profile = Profile::try_from(record).expect("map");
        assert_eq!(profile.visibility, Visibility::Nobody);
    }

    #[test]
    fn profile_without_id_is_rejected() {
        let err = Profile::try_from(ProfileRecord::default()).expect_err("no id");
        assert_eq!(err, RecordError::MissingField("id"));
    }

    #[test]
    fn bad_timestamp_is_reported_with_field() {
        let record = ProfileRecord {
            id: Some("u7".to_string()),
            created_at: Some("yesterday".to_string()),
            ..ProfileRecord::default()
        };
        match Profile::try_from(record) {
            Err(RecordError::InvalidTimestamp { field, .. }) => assert_eq!(field, "created_at"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn session_requires_user() {
        let record = SessionRecord {
            access_token: Some("tok".to_string()),
            ..SessionRecord::default()
        };
        assert_eq!(
            AuthSession::try_from(record).expect_err("no user"),
            RecordError::MissingField("user")
        );
    }

    #[test]
    fn unknown_subscription_status_never_grants_access() {
        let record = SubscriptionRecord {
            id: Some("s1".to_string()),
            user_id: Some("u1".to_string()),
            product_id: Some("p1".to_string()),
            status: Some("paused".to_string()),
            ..SubscriptionRecord::default()
        };
        let sub = Subscription::try_from(record).expect("map");
        assert_eq!(sub.status, SubscriptionStatus::Incomplete);
        assert!(!sub.status.grants_access());
    }

    #[test]
    fn snake_case_wire_shape_decodes() {
        let json = r#"{"id":"u2","display_name":"Bo","points_balance":40,"extra_column":true}"#;
        let record: ProfileRecord = serde_json::from_str(json).expect("decode");
        let profile = Profile::try_from(record).expect("map");
        assert_eq!(profile.display_name, "Bo");
        assert_eq!(profile.points_balance, 40);
    }
}
