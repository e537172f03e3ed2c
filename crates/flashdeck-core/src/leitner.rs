//! Three-box Leitner scheduling
//!
//! A correct answer moves a card one box up (capped at the last box) and
//! schedules it after that box's interval. A miss sends it back to box 1 and
//! makes it due again immediately.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::models::ReviewResult;

/// Number of Leitner boxes
pub const BOX_COUNT: usize = 3;

/// A Leitner box number, always in `1..=3`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct LeitnerBox(u8);

impl LeitnerBox {
    /// Box every new or reset card starts in
    pub const FIRST: Self = Self(1);
    /// Highest box
    pub const LAST: Self = Self(BOX_COUNT as u8);

    /// Validate a raw box number
    pub fn new(value: i64) -> Result<Self> {
        if (1..=BOX_COUNT as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidBox(value))
        }
    }

    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Next box up, saturating at [`LeitnerBox::LAST`]
    #[must_use]
    pub fn promoted(self) -> Self {
        Self((self.0 + 1).min(Self::LAST.0))
    }

    fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<i64> for LeitnerBox {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LeitnerBox> for i64 {
    fn from(value: LeitnerBox) -> Self {
        i64::from(value.0)
    }
}

impl fmt::Display for LeitnerBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Review intervals per box
///
/// A card is scheduled with the interval of the box it lands in. Promotion
/// always lands in box 2 or higher and a forgotten card is due at once, so the
/// box 1 interval never schedules a review; it only sets the floor the later
/// boxes must exceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeitnerSchedule {
    intervals: [Duration; BOX_COUNT],
}

impl Default for LeitnerSchedule {
    fn default() -> Self {
        Self {
            intervals: [Duration::days(1), Duration::days(3), Duration::days(7)],
        }
    }
}

impl LeitnerSchedule {
    /// Build a schedule from per-box intervals in days.
    ///
    /// Intervals must be positive and strictly increasing from box 1 to box 3.
    pub fn from_days(days: &[u32]) -> Result<Self> {
        if days.len() != BOX_COUNT {
            return Err(Error::InvalidConfig(format!(
                "expected {BOX_COUNT} box intervals, got {}",
                days.len()
            )));
        }
        if days[0] == 0 {
            return Err(Error::InvalidConfig(
                "box 1 interval must be at least one day".to_string(),
            ));
        }
        if days.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidConfig(format!(
                "box intervals must strictly increase: {days:?}"
            )));
        }

        Ok(Self {
            intervals: [
                Duration::days(i64::from(days[0])),
                Duration::days(i64::from(days[1])),
                Duration::days(i64::from(days[2])),
            ],
        })
    }

    /// Interval before a card in `leitner_box` is due again
    #[must_use]
    pub fn interval(&self, leitner_box: LeitnerBox) -> Duration {
        self.intervals[leitner_box.index()]
    }

    /// Compute the state after reviewing a card in `previous` at `now`
    #[must_use]
    pub fn transition(
        &self,
        previous: LeitnerBox,
        result: ReviewResult,
        now: DateTime<Utc>,
    ) -> Transition {
        let (new_box, due_at) = match result {
            ReviewResult::Know => {
                let next = previous.promoted();
                (next, now + self.interval(next))
            }
            ReviewResult::DontKnow => (LeitnerBox::FIRST, now),
        };

        Transition {
            previous,
            new_box,
            due_at,
        }
    }
}

/// Outcome of a single review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: LeitnerBox,
    pub new_box: LeitnerBox,
    pub due_at: DateTime<Utc>,
}
