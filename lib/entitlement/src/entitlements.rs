//! The entitlement set and its derivation.

use reclaim_profile::Tier;
use serde::{Deserialize, Serialize};

/// How many active documents a free-tier user may hold.
pub const FREE_TIER_DOCUMENT_LIMIT: u32 = 1;

/// Cap on active documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "limit", rename_all = "snake_case")]
pub enum DocumentLimit {
    /// At most `max` active documents.
    Limited {
        /// The cap.
        max: u32,
    },
    /// No cap.
    Unlimited,
}

impl DocumentLimit {
    /// Returns true if a user at `usage` active documents may add another.
    #[must_use]
    pub fn allows(&self, usage: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Limited { max } => usage < *max,
        }
    }
}

/// Feature-access flags derived from tier and usage.
///
/// Derived, never stored; every value is recomputed from scratch on each
/// evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlements {
    /// Whether another document may be registered right now.
    pub can_add_documents: bool,
    /// The document cap in force.
    pub max_documents: DocumentLimit,
    /// Whether every document type is available (passport, deed, …), or
    /// only the basic set.
    pub can_access_all_document_types: bool,
    /// Whether chat messages get priority handling.
    pub has_priority_chat: bool,
    /// Whether push notifications are delivered for matches.
    pub has_push_notifications: bool,
}

impl Entitlements {
    /// Derives the entitlement set for a tier at a usage count.
    #[must_use]
    pub fn evaluate(tier: Tier, usage_count: u32) -> Self {
        let premium = tier.is_premium();
        let max_documents = if premium {
            DocumentLimit::Unlimited
        } else {
            DocumentLimit::Limited {
                max: FREE_TIER_DOCUMENT_LIMIT,
            }
        };
        Self {
            can_add_documents: max_documents.allows(usage_count),
            max_documents,
            can_access_all_document_types: premium,
            has_priority_chat: premium,
            has_push_notifications: premium,
        }
    }

    /// The all-denied set shown while no evaluation is possible.
    #[must_use]
    pub fn none() -> Self {
        Self {
            can_add_documents: false,
            max_documents: DocumentLimit::Limited { max: 0 },
            can_access_all_document_types: false,
            has_priority_chat: false,
            has_push_notifications: false,
        }
    }
}
