//! The application-level user profile.
//!
//! A profile is distinct from the provider-issued identity: it is the row
//! the application keeps about a user: contact details, subscription
//! tier, reward points. It is owned by the remote profile store; the core
//! only ever holds a cached copy keyed by the identity it was fetched for.

use chrono::{DateTime, Utc};
use reclaim_core::{Email, ProviderUserId};
use serde::{Deserialize, Serialize};

/// Subscription tier gating feature access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// The default tier: one active document, no premium capabilities.
    Free,
    /// Paid individual subscription.
    Premium,
    /// Organization subscription; same capabilities as premium.
    Enterprise,
}

impl Tier {
    /// Returns true if this tier carries premium capabilities.
    #[must_use]
    pub fn is_premium(&self) -> bool {
        !matches!(self, Self::Free)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::Free
    }
}

/// A user's profile record.
///
/// Mutable, keyed by the owning identity's provider user id. The point
/// balance only ever increases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The identity this profile belongs to.
    owner: ProviderUserId,
    /// Display name shown to other users.
    display_name: Option<String>,
    /// Contact e-mail, if different from the sign-in address.
    contact_email: Option<Email>,
    /// Contact phone number.
    phone: Option<String>,
    /// Subscription tier. Absent upstream means free.
    subscription_tier: Option<Tier>,
    /// Reward point balance. Monotonically increasing.
    points: u64,
    /// When the profile row was created.
    created_at: DateTime<Utc>,
    /// When the profile row was last updated.
    updated_at: DateTime<Utc>,
}

impl Profile {
    /// Creates a fresh profile for the given identity.
    #[must_use]
    pub fn new(owner: ProviderUserId) -> Self {
        let now = Utc::now();
        Self {
            owner,
            display_name: None,
            contact_email: None,
            phone: None,
            subscription_tier: None,
            points: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a profile with all fields specified.
    ///
    /// Use this when reconstituting a profile from storage.
    #[must_use]
    #[expect(clippy::too_many_arguments)]
    pub fn with_all_fields(
        owner: ProviderUserId,
        display_name: Option<String>,
        contact_email: Option<Email>,
        phone: Option<String>,
        subscription_tier: Option<Tier>,
        points: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner,
            display_name,
            contact_email,
            phone,
            subscription_tier,
            points,
            created_at,
            updated_at,
        }
    }

    /// Returns the owning identity's provider user id.
    #[must_use]
    pub fn owner(&self) -> &ProviderUserId {
        &self.owner
    }

    /// Returns the display name, if set.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the contact e-mail, if set.
    #[must_use]
    pub fn contact_email(&self) -> Option<&Email> {
        self.contact_email.as_ref()
    }

    /// Returns the contact phone number, if set.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Returns the subscription tier as stored, which may be absent.
    #[must_use]
    pub fn subscription_tier(&self) -> Option<Tier> {
        self.subscription_tier
    }

    /// Returns the tier to evaluate entitlements against: the stored tier,
    /// or free when absent upstream.
    #[must_use]
    pub fn effective_tier(&self) -> Tier {
        self.subscription_tier.unwrap_or_default()
    }

    /// Returns the reward point balance.
    #[must_use]
    pub fn points(&self) -> u64 {
        self.points
    }

    /// Returns when the profile row was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the profile row was last updated.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets the display name.
    pub fn set_display_name(&mut self, display_name: Option<String>) {
        self.display_name = display_name;
        self.updated_at = Utc::now();
    }

    /// Sets the contact e-mail.
    pub fn set_contact_email(&mut self, contact_email: Option<Email>) {
        self.contact_email = contact_email;
        self.updated_at = Utc::now();
    }

    /// Sets the contact phone number.
    pub fn set_phone(&mut self, phone: Option<String>) {
        self.phone = phone;
        self.updated_at = Utc::now();
    }

    /// Sets the subscription tier.
    pub fn set_subscription_tier(&mut self, tier: Option<Tier>) {
        self.subscription_tier = tier;
        self.updated_at = Utc::now();
    }

    /// Credits reward points. The balance never decreases.
    pub fn credit_points(&mut self, amount: u64) {
        self.points = self.points.saturating_add(amount);
        self.updated_at = Utc::now();
    }
}
