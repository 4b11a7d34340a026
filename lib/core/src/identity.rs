//! External identity types.
//!
//! An [`Identity`] is issued by the remote identity provider, never by this
//! platform. The core only ever holds a reference to one: it is handed over
//! in session-transition events and used to key profile lookups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque provider-issued user identifier (e.g. the OIDC subject claim).
///
/// The platform makes no assumptions about the format; it is compared and
/// hashed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderUserId(String);

impl ProviderUserId {
    /// Creates a provider user id from a string.
    #[must_use]
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProviderUserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProviderUserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An e-mail address.
///
/// Stored as given by the identity provider; validation is the provider's
/// responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Creates an e-mail address from a string.
    #[must_use]
    pub fn new(address: String) -> Self {
        Self(address)
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Email {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Email {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A provider-issued identity: the authenticated user as the identity
/// provider knows them.
///
/// Immutable once issued. Distinct from the application-level profile
/// record, which is keyed by the [`ProviderUserId`] carried here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-issued user id.
    id: ProviderUserId,
    /// E-mail address the identity was issued for.
    email: Email,
}

impl Identity {
    /// Creates an identity from its provider-issued parts.
    #[must_use]
    pub fn new(id: ProviderUserId, email: Email) -> Self {
        Self { id, email }
    }

    /// Returns the provider-issued user id.
    #[must_use]
    pub fn id(&self) -> &ProviderUserId {
        &self.id
    }

    /// Returns the e-mail address.
    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }
}
