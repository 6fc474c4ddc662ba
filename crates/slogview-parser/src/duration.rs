//! Elapsed time between two whole-second timestamps.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const SECS_PER_DAY: i64 = 86_400;

/// Signed elapsed time in whole seconds.
///
/// Negative values are kept as they are: an end before its start is a data
/// quality signal for the caller, not something to clamp away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Elapsed(i64);

impl Elapsed {
    pub fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// `end - start`.
    pub fn between(start: &NaiveDateTime, end: &NaiveDateTime) -> Self {
        Self(end.signed_duration_since(*start).num_seconds())
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

/// Formats as `H:MM:SS`, with a leading `N day(s), ` once a day is reached.
/// Negative values carry a negative day count and a positive remainder, so
/// minus one minute reads `-1 day, 23:59:00`.
impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0.div_euclid(SECS_PER_DAY);
        let rem = self.0.rem_euclid(SECS_PER_DAY);
        let (hours, mins, secs) = (rem / 3600, (rem % 3600) / 60, rem % 60);

        if days != 0 {
            let unit = if days.abs() == 1 { "day" } else { "days" };
            write!(f, "{} {}, ", days, unit)?;
        }
        write!(f, "{}:{:02}:{:02}", hours, mins, secs)
    }
}
