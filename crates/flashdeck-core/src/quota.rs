//! Rolling-window quota for AI generations
//!
//! A user may record at most `limit` successful generations inside any
//! trailing `window`. Failed attempts never count.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// Default number of successful generations per window
pub const DEFAULT_LIMIT: u32 = 15;
/// Default window length in hours
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

/// Quota limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            window: Duration::hours(i64::from(DEFAULT_WINDOW_HOURS)),
        }
    }
}

impl QuotaPolicy {
    /// Create a policy, rejecting a zero limit or window
    pub fn new(limit: u32, window_hours: u32) -> Result<Self> {
        if limit == 0 {
            return Err(Error::InvalidConfig("quota limit must be positive".to_string()));
        }
        if window_hours == 0 {
            return Err(Error::InvalidConfig(
                "quota window must be at least one hour".to_string(),
            ));
        }
        Ok(Self {
            limit,
            window: Duration::hours(i64::from(window_hours)),
        })
    }

    /// Earliest attempt time still inside the window ending at `now`
    #[must_use]
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// Evaluate the quota from the creation times of successful attempts.
    ///
    /// Times outside the window are ignored, so callers may pass a superset.
    #[must_use]
    pub fn evaluate<I>(&self, succeeded_at: I, now: DateTime<Utc>) -> QuotaCheck
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let start = self.window_start(now);
        let (used, oldest) = succeeded_at
            .into_iter()
            .filter(|at| *at >= start)
            .fold((0u32, None::<DateTime<Utc>>), |(count, oldest), at| {
                let oldest = Some(oldest.map_or(at, |o| o.min(at)));
                (count.saturating_add(1), oldest)
            });

        // With no attempts the reset time is informative only.
        let reset_at = oldest.unwrap_or(now) + self.window;
        let retry_after_seconds = (reset_at - now).num_seconds().max(0);
        let allowed = used < self.limit;

        QuotaCheck {
            allowed,
            limit: self.limit,
            used,
            remaining: if allowed { self.limit - used } else { 0 },
            reset_at,
            reset_timestamp: reset_at.timestamp(),
            retry_after_seconds,
        }
    }
}

/// Result of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaCheck {
    pub allowed: bool,
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// `reset_at` as Unix seconds
    pub reset_timestamp: i64,
    pub retry_after_seconds: i64,
}

impl QuotaCheck {
    /// The check as seen right after one more successful generation
    #[must_use]
    pub fn after_success(&self) -> Self {
        let used = self.used.saturating_add(1);
        Self {
            allowed: used < self.limit,
            used,
            remaining: self.remaining.saturating_sub(1),
            ..*self
        }
    }
}

/// Numeric key derived from a user id, stored on attempt rows.
///
/// `h = h * 31 + c` over UTF-16 code units with 32-bit wrapping, then the
/// absolute value.
#[must_use]
pub fn advisory_lock_key(user_id: &str) -> i64 {
    let hash = user_id.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    });
    i64::from(hash).abs()
}
