//! The consumer-facing entitlement view.

use crate::entitlements::Entitlements;
use serde::{Deserialize, Serialize};

/// What gating consumers observe: the entitlement set plus whether it is
/// still being resolved.
///
/// Consumers must never act on the flags while `pending` is true: the
/// all-denied set underneath is a placeholder, not a verdict. A settled
/// all-denied view (`pending == false`) means unauthenticated or a
/// terminal profile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementView {
    /// True while the profile or usage count is unresolved.
    pub pending: bool,
    /// The entitlement set in force.
    pub entitlements: Entitlements,
}

impl EntitlementView {
    /// The view while resolution is in flight.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            pending: true,
            entitlements: Entitlements::none(),
        }
    }

    /// The settled all-denied view: no session, or the profile failed
    /// terminally.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            pending: false,
            entitlements: Entitlements::none(),
        }
    }

    /// A settled, evaluated view.
    #[must_use]
    pub fn ready(entitlements: Entitlements) -> Self {
        Self {
            pending: false,
            entitlements,
        }
    }
}
