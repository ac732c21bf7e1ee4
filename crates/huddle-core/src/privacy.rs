//! # Privacy-Gated Profile Disclosure
//!
//! Decides how much of a member's profile another viewer may see.
//!
//! The decision depends on exactly two inputs besides the record itself:
//! the subject's [`Visibility`] policy and the viewer's [`Relationship`] to
//! the subject. The full table:
//!
//! | Policy \ Relationship | self | friend | stranger | anonymous |
//! |-----------------------|------|--------|----------|-----------|
//! | `anyone`              | full | full   | full     | full      |
//! | `friends`             | full | full   | minimal  | minimal   |
//! | `nobody`              | min  | min    | min      | min       |
//!
//! `nobody` is checked before the relationship, so a member reading their
//! own `nobody` profile through this path gets the minimal card too. Own
//! profile reads go through the authenticated profile load instead.
//!
//! The minimal card (id, display name, tier, avatar) is never gated.

use crate::types::{MembershipTier, Profile, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// POLICY & RELATIONSHIP
// =============================================================================

/// Who may see a member's extended profile fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Friends,
    Anyone,
    Nobody,
}

impl Visibility {
    /// All policies, in declaration order.
    pub const ALL: [Self; 3] = [Self::Friends, Self::Anyone, Self::Nobody];

    /// Parse a backend policy name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "friends" => Some(Self::Friends),
            "anyone" | "public" => Some(Self::Anyone),
            "nobody" | "private" => Some(Self::Nobody),
            _ => None,
        }
    }

    /// Backend name of the policy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friends => "friends",
            Self::Anyone => "anyone",
            Self::Nobody => "nobody",
        }
    }
}

/// How a viewer stands with respect to a subject.
///
/// Computed per resolution; never cached, since friendships change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// Viewer and subject are the same member.
    #[serde(rename = "self")]
    Owner,
    Friend,
    Stranger,
    /// No viewer identity was supplied.
    Anonymous,
}

impl Relationship {
    /// All relationships, in declaration order.
    pub const ALL: [Self; 4] = [Self::Owner, Self::Friend, Self::Stranger, Self::Anonymous];

    /// Classify a viewer without consulting friendship data.
    ///
    /// Returns `None` when the answer depends on a friendship lookup.
    #[must_use]
    pub fn without_lookup(viewer: Option<&UserId>, subject: &UserId) -> Option<Self> {
        match viewer {
            None => Some(Self::Anonymous),
            Some(v) if v == subject => Some(Self::Owner),
            Some(_) => None,
        }
    }
}

/// Amount of a profile that is disclosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disclosure {
    /// Public card only.
    Minimal,
    /// Public card plus every extended field.
    Full,
}

/// The disclosure table. Total over policy × relationship.
#[must_use]
pub const fn disclosure(policy: Visibility, relationship: Relationship) -> Disclosure {
    match (policy, relationship) {
        (Visibility::Nobody, _) => Disclosure::Minimal,
        (Visibility::Anyone, _) => Disclosure::Full,
        (Visibility::Friends, Relationship::Owner | Relationship::Friend) => Disclosure::Full,
        (Visibility::Friends, Relationship::Stranger | Relationship::Anonymous) => {
            Disclosure::Minimal
        }
    }
}

// =============================================================================
// RESOLVED PROFILE
// =============================================================================

/// The always-disclosed public card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCard {
    pub id: UserId,
    pub display_name: String,
    pub membership_tier: MembershipTier,
    pub avatar_url: Option<String>,
}

/// Fields disclosed only under a `Full` disclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProfile {
    pub points_balance: i64,
    pub lifetime_points: i64,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub social_handle: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// What a viewer receives for a subject's profile.
///
/// Withheld fields are absent, not blanked: serialising a minimal result
/// yields only the card keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    #[serde(flatten)]
    pub card: ProfileCard,
    #[serde(flatten)]
    pub extended: Option<ExtendedProfile>,
}

impl PublicProfile {
    /// Which disclosure produced this result.
    #[must_use]
    pub fn disclosure(&self) -> Disclosure {
        if self.extended.is_some() {
            Disclosure::Full
        } else {
            Disclosure::Minimal
        }
    }
}

/// Apply the disclosure table to a subject record.
#[must_use]
pub fn resolve(subject: &Profile, policy: Visibility, relationship: Relationship) -> PublicProfile {
    let card = ProfileCard {
        id: subject.id.clone(),
        display_name: subject.display_name.clone(),
        membership_tier: subject.membership_tier,
        avatar_url: subject.avatar_url.clone(),
    };

    let extended = match disclosure(policy, relationship) {
        Disclosure::Minimal => None,
        Disclosure::Full => Some(ExtendedProfile {
            points_balance: subject.points_balance,
            lifetime_points: subject.lifetime_points,
            neighborhood: subject.neighborhood.clone(),
            city: subject.city.clone(),
            bio: subject.bio.clone(),
            social_handle: subject.social_handle.clone(),
            created_at: subject.created_at,
        }),
    };

    PublicProfile { card, extended }
}

// =============================================================================
// TESTS
// =============================================================================
