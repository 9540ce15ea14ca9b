use chrono::{DateTime, Utc};
use std::time::Duration;

/// Computes expiration timestamps for records in a collection.
///
/// A policy without a TTL attaches no expiry at all; absence, not a sentinel
/// value, is what marks a record as never expiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiryPolicy {
    ttl: Option<Duration>,
}

impl ExpiryPolicy {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { ttl }
    }

    pub fn disabled() -> Self {
        Self { ttl: None }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl.is_some()
    }

    /// Pure `now + ttl`; `None` when the policy has no TTL (or the TTL is
    /// outside chrono's representable range, which validation rejects).
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| now + ttl)
    }
}
