//! Account-core configuration.

use std::time::Duration;

/// Tuning knobs for the account context.
///
/// Plain data with sensible defaults; the hosting application decides
/// where values come from (environment, files, hardcoded).
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// How long the profile cache waits before its single retry when a
    /// fetch reports no profile row (the sign-up creation race).
    pub profile_retry_delay: Duration,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            profile_retry_delay: Duration::from_millis(500),
        }
    }
}
