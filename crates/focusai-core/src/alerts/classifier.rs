//! Urgency classification for due tasks.
//!
//! ## Tiers
//!
//! ```text
//!  minutes until due:  <=0 | 1 ..= 5 | 6 ..= 10 | 11 ..= 15 | >15
//!  severity:           --- | critical |  urgent  |  warning  | ---
//! ```
//!
//! Boundaries belong to the more severe tier (5 is critical, 10 is urgent).
//! Deduplication works on 5-minute buckets, `minutes / 5`, which do not line
//! up with the tiers: 5 minutes is bucket 1 but critical.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alerts are only raised inside this many minutes before the due time.
pub const ALERT_WINDOW_MINUTES: i64 = 15;

/// Width of a deduplication bucket in minutes.
pub const BUCKET_MINUTES: i64 = 5;

const CRITICAL_MAX_MINUTES: i64 = 5;
const URGENT_MAX_MINUTES: i64 = 10;

/// Urgency tier of an alert, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Urgent,
    Critical,
}

/// Fixed presentation attributes of a severity. The monitor never reads these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityProfile {
    pub icon: &'static str,
    pub color: &'static str,
    pub headline: &'static str,
    pub urgency_text: &'static str,
    pub tips: &'static [&'static str],
}

const CRITICAL_PROFILE: SeverityProfile = SeverityProfile {
    icon: "🚨",
    color: "red",
    headline: "URGENT TASK DUE!",
    urgency_text: "CRITICAL - Due in",
    tips: &[
        "Drop everything and focus on this task",
        "Set a timer and work intensely",
        "Minimize all distractions",
    ],
};

const URGENT_PROFILE: SeverityProfile = SeverityProfile {
    icon: "⚠️",
    color: "orange",
    headline: "Task Due Soon!",
    urgency_text: "URGENT - Due in",
    tips: &[],
};

const WARNING_PROFILE: SeverityProfile = SeverityProfile {
    icon: "🔔",
    color: "yellow",
    headline: "Upcoming Task",
    urgency_text: "Due in",
    tips: &[],
};

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Urgent => "urgent",
            Severity::Critical => "critical",
        }
    }

    pub fn profile(self) -> &'static SeverityProfile {
        match self {
            Severity::Critical => &CRITICAL_PROFILE,
            Severity::Urgent => &URGENT_PROFILE,
            Severity::Warning => &WARNING_PROFILE,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole minutes from `now` until `due`, rounded toward negative infinity.
///
/// 30 seconds before the due time is 0 minutes; 30 seconds after is -1.
pub fn minutes_until_due(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (due - now).num_milliseconds().div_euclid(60_000)
}

/// Severity for a remaining-minutes value, or `None` when no alert applies.
pub fn classify(minutes_until_due: i64) -> Option<Severity> {
    match minutes_until_due {
        m if m <= 0 || m > ALERT_WINDOW_MINUTES => None,
        m if m <= CRITICAL_MAX_MINUTES => Some(Severity::Critical),
        m if m <= URGENT_MAX_MINUTES => Some(Severity::Urgent),
        _ => Some(Severity::Warning),
    }
}

/// Deduplication bucket for a remaining-minutes value.
pub fn bucket(minutes_until_due: i64) -> i64 {
    minutes_until_due.div_euclid(BUCKET_MINUTES)
}
