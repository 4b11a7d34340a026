//! Feature-access derivation for reclaim.
//!
//! Entitlements are a pure function of the subscription tier and the live
//! usage count: no side effects, no caching, no independent lifecycle.
//! They are recomputed whenever the profile or the usage count changes and
//! are never persisted.
//!
//! # Example
//!
//! ```
//! use reclaim_entitlement::{DocumentLimit, Entitlements};
//! use reclaim_profile::Tier;
//!
//! let free = Entitlements::evaluate(Tier::Free, 1);
//! assert!(!free.can_add_documents);
//! assert_eq!(free.max_documents, DocumentLimit::Limited { max: 1 });
//!
//! let premium = Entitlements::evaluate(Tier::Premium, 500);
//! assert!(premium.can_add_documents);
//! assert_eq!(premium.max_documents, DocumentLimit::Unlimited);
//! ```

pub mod entitlements;
pub mod view;

pub use entitlements::{DocumentLimit, Entitlements, FREE_TIER_DOCUMENT_LIMIT};
pub use view::EntitlementView;
